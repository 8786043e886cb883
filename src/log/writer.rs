//! Log Writer
//!
//! Appends records at the end of the log file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::config::SyncStrategy;
use crate::error::{HashLogError, Result};
use crate::index::Location;

use super::record::{encode_record, HEADER_SIZE};

/// Append-only writer over a log file
///
/// The file is opened in append mode, so every write lands at the current
/// end-of-file whatever any reader of the same file has done to its own
/// cursor.
pub struct LogWriter {
    file: File,
    /// Offset where the next record will start
    end_offset: u64,
    sync_strategy: SyncStrategy,
    /// Records appended since the last fsync
    unsynced: usize,
}

impl LogWriter {
    /// Open or create a log file for appending
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| HashLogError::OpenFile {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_file(file, path, sync_strategy)
    }

    /// Create an empty log file, truncating any previous content
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|source| HashLogError::OpenFile {
                path: path.to_path_buf(),
                source,
            })?;
        drop(file);
        Self::open(path, sync_strategy)
    }

    fn from_file(file: File, path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let end_offset = file
            .metadata()
            .map_err(|source| HashLogError::OpenFile {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        Ok(Self {
            file,
            end_offset,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append a key/value record, returning the location of the value bytes
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<Location> {
        let record = encode_record(key, value)?;
        let record_offset = self.end_offset;

        if let Err(e) = self.file.write_all(&record) {
            // A torn write leaves garbage that the next scan skips; re-read
            // the real end so later locations stay correct.
            if let Ok(meta) = self.file.metadata() {
                self.end_offset = meta.len();
            }
            return Err(HashLogError::Write(e));
        }
        self.end_offset += record.len() as u64;

        self.unsynced += 1;
        self.maybe_sync()?;

        Ok(Location::new(
            record_offset + (HEADER_SIZE + key.len()) as u64,
            value.len() as u64,
        ))
    }

    /// Append a tombstone (zero-length value) for `key`
    pub fn append_tombstone(&mut self, key: &[u8]) -> Result<()> {
        self.append(key, &[]).map(|_| ())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush().map_err(HashLogError::Write)?;
        self.file.sync_data().map_err(HashLogError::Write)?;
        self.unsynced = 0;
        Ok(())
    }

    /// Current size of the log in bytes
    pub fn len(&self) -> u64 {
        self.end_offset
    }

    pub fn is_empty(&self) -> bool {
        self.end_offset == 0
    }

    fn maybe_sync(&mut self) -> Result<()> {
        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }
        Ok(())
    }
}
