//! Engine Module
//!
//! One open database: a single append-only log file plus the in-memory key
//! index derived from it.
//!
//! ## Responsibilities
//! - Rebuild the index from a full log scan on open
//! - Keep log and index in step on set/delete
//! - Serve point lookups from indexed value locations
//! - Compact the log down to one record per live key

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{HashLogError, Result};
use crate::index::KeyIndex;
use crate::log::{read_value, LogScanner, LogWriter, ScanStats, MAX_KEY_SIZE};

/// Outcome of a compaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionStats {
    /// Keys written to the compacted log
    pub live_keys: u64,

    /// Log size before compaction
    pub bytes_before: u64,

    /// Log size after compaction
    pub bytes_after: u64,

    /// Statistics of the scan over the old log
    pub scan: ScanStats,
}

impl CompactionStats {
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// An open database
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (set/delete/compact): Serialized by `write_lock`
///   - Only ONE write operation at a time
///   - Acquire order: write_lock → writer → index (write)
///
/// - **Reads** (get): Hold the index read lock for the whole lookup, so a
///   compaction can never swap the file out from under an offset that was
///   just read from the index. Readers share one random-access handle.
///
/// - **Compact**: Scans and rewrites under `write_lock` only (gets keep
///   running against the old file), then takes the index write lock for the
///   swap itself.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Path of the log file
    path: PathBuf,

    /// Sequential append handle
    writer: Mutex<LogWriter>,

    /// Random-access read handle
    reader: Mutex<File>,

    /// Key → value location
    index: RwLock<KeyIndex>,

    /// Serializes set/delete/compact
    write_lock: Mutex<()>,
}

impl Engine {
    /// Suffix of the staging file written during compaction
    pub const COMPACT_SUFFIX: &'static str = "compact";

    /// Open or create the database stored in the log file at `path`
    ///
    /// On startup:
    /// 1. Create the log file if it does not exist (empty log is valid)
    /// 2. Remove a compaction staging file left by a crash
    /// 3. Scan the whole log, rebuilding the index
    /// 4. Ready to serve requests
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();

        // Step 1: Creating the append handle creates the file
        let writer = LogWriter::open(&path, config.sync_strategy)?;

        // Step 2: A staging file never replaced the log, so it is garbage
        let staging = Self::staging_path(&path);
        if staging.exists() {
            tracing::warn!(path = %staging.display(), "removing stale compaction file");
            fs::remove_file(&staging).map_err(HashLogError::Write)?;
        }

        // Step 3: Replay
        let (index, stats) = rebuild_index(LogScanner::open(&path, config.scan_block_size)?)?;

        let reader = File::open(&path).map_err(|source| HashLogError::OpenFile {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            keys = index.len(),
            records = stats.records,
            tombstones = stats.tombstones,
            corrupt = stats.corrupt_records,
            skipped_bytes = stats.bytes_skipped,
            "opened log"
        );

        Ok(Self {
            config,
            path,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            index: RwLock::new(index),
            write_lock: Mutex::new(()),
        })
    }

    /// Open with default config (convenience method)
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(path, Config::default())
    }

    /// Get the value stored for `key`
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let index = self.index.read();
        let location = index.get(key).ok_or(HashLogError::KeyNotFound)?;

        let mut reader = self.reader.lock();
        let value = read_value(&mut *reader, location)?;

        tracing::debug!(key_len = key.len(), offset = location.offset, len = location.length, "get");
        Ok(value)
    }

    /// Store `value` under `key`
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Append the record at end-of-log
    /// 3. Point the index at the new value
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        check_key(key)?;
        if value.is_empty() {
            return Err(HashLogError::EmptyValue);
        }

        let _write_guard = self.write_lock.lock();

        // Nothing is installed in the index unless the append succeeded
        let location = self.writer.lock().append(key, value)?;
        self.index.write().set(key.to_vec(), location);

        tracing::debug!(key_len = key.len(), offset = location.offset, len = location.length, "set");
        Ok(())
    }

    /// Delete `key`
    ///
    /// Appends a tombstone so replay reproduces the deletion, then removes the
    /// key from the index. Deleting an absent key still logs the tombstone.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        check_key(key)?;

        let _write_guard = self.write_lock.lock();

        self.writer.lock().append_tombstone(key)?;
        let existed = self.index.write().delete(key).is_some();

        tracing::debug!(key_len = key.len(), existed, "delete");
        Ok(())
    }

    /// Rewrite the log with one record per live key
    ///
    /// Steps:
    /// 1. Acquire write lock (no appends while the old log is read)
    /// 2. Full scan of the old log into a fresh index
    /// 3. Copy each live value, in key order, into the staging file
    /// 4. Open new handles on the staging file and rename it over the log
    /// 5. Install the new handles and index
    pub fn compact(&self) -> Result<CompactionStats> {
        let _write_guard = self.write_lock.lock();

        let bytes_before = self.writer.lock().len();
        // The log already exists here, so failing to reopen it is a read fault
        let old_log = File::open(&self.path).map_err(HashLogError::Read)?;
        let scanner = LogScanner::from_file(old_log, self.config.scan_block_size)?;
        let (live, scan) = rebuild_index(scanner)?;

        let staging = Self::staging_path(&self.path);
        let built = self.write_compacted(&live, &staging);
        let (mut new_writer, new_index) = match built {
            Ok(parts) => parts,
            Err(e) => {
                let _ = fs::remove_file(&staging);
                return Err(e);
            }
        };

        let new_reader = match File::open(&staging) {
            Ok(file) => file,
            Err(e) => {
                let _ = fs::remove_file(&staging);
                return Err(HashLogError::Read(e));
            }
        };
        if let Err(e) = new_writer.sync() {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        let stats = CompactionStats {
            live_keys: new_index.len() as u64,
            bytes_before,
            bytes_after: new_writer.len(),
            scan,
        };

        // Swap: readers are excluded from here on
        {
            let mut index = self.index.write();
            if let Err(e) = fs::rename(&staging, &self.path) {
                let _ = fs::remove_file(&staging);
                return Err(HashLogError::Write(e));
            }
            *self.writer.lock() = new_writer;
            *self.reader.lock() = new_reader;
            *index = new_index;
        }

        tracing::info!(
            path = %self.path.display(),
            live_keys = stats.live_keys,
            bytes_before = stats.bytes_before,
            bytes_after = stats.bytes_after,
            corrupt = stats.scan.corrupt_records,
            "compacted log"
        );
        Ok(stats)
    }

    /// Sync and release the log file; the index is discarded with `self`
    pub fn close(self) -> Result<()> {
        self.sync()?;
        tracing::info!(path = %self.path.display(), "closed log");
        Ok(())
    }

    /// Force appended records to disk
    pub fn sync(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.writer.lock().sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current log size in bytes
    pub fn log_len(&self) -> u64 {
        self.writer.lock().len()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.index.read().contains_key(key)
    }

    /// All live keys, sorted
    pub fn keys(&self) -> Vec<Vec<u8>> {
        let mut keys: Vec<Vec<u8>> = self.index.read().iter().map(|(k, _)| k.to_vec()).collect();
        keys.sort();
        keys
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Staging path used while compacting the log at `path`
    pub fn staging_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(Self::COMPACT_SUFFIX);
        PathBuf::from(name)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Write every live value of `live` into a fresh log at `staging`
    fn write_compacted(&self, live: &KeyIndex, staging: &Path) -> Result<(LogWriter, KeyIndex)> {
        let mut entries: Vec<_> = live.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut source = File::open(&self.path).map_err(HashLogError::Read)?;
        let mut writer = LogWriter::create(staging, self.config.sync_strategy)?;
        let mut index = KeyIndex::new();

        for (key, location) in entries {
            let value = read_value(&mut source, location)?;
            let new_location = writer.append(key, &value)?;
            index.set(key.to_vec(), new_location);
        }

        Ok((writer, index))
    }
}

/// Replay the whole log behind `scanner` into a fresh index
///
/// Last writer wins: a valid record sets its key, a tombstone removes it.
fn rebuild_index(mut scanner: LogScanner) -> Result<(KeyIndex, ScanStats)> {
    let mut index = KeyIndex::new();

    while let Some(record) = scanner.next_record()? {
        if record.is_tombstone() {
            index.delete(&record.key);
        } else {
            index.set(record.key, record.location);
        }
    }

    Ok((index, scanner.stats()))
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.len() > MAX_KEY_SIZE {
        return Err(HashLogError::KeyTooLarge {
            len: key.len(),
            max: MAX_KEY_SIZE,
        });
    }
    Ok(())
}
