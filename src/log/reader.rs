//! Log Reader
//!
//! Sequential scanning of the whole log, plus random-access value reads.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{HashLogError, Result};
use crate::index::Location;

use super::record::{decode_record, LogRecord, MARKER_SIZE};
use super::scanner::MarkerScanner;

/// Counters gathered during one full scan of the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Records that decoded with a valid checksum (tombstones included)
    pub records: u64,

    /// Valid records that were tombstones
    pub tombstones: u64,

    /// Records dropped because they failed to decode
    pub corrupt_records: u64,

    /// Bytes passed over while looking for a marker
    pub bytes_skipped: u64,
}

/// Sequential reader that yields every decodable record in log order
///
/// Corrupt records are skipped by resynchronizing on the next marker; the
/// scan ends at the first point where no further marker exists.
pub struct LogScanner {
    reader: TrackedReader,
    /// Offset the next marker search starts from
    position: u64,
    log_len: u64,
    markers: MarkerScanner,
    stats: ScanStats,
}

impl LogScanner {
    /// Open a log file for a full scan from offset 0
    pub fn open(path: &Path, block_size: usize) -> Result<Self> {
        let file = File::open(path).map_err(|source| HashLogError::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_file(file, block_size)
    }

    /// Scan an already opened log file from offset 0
    pub fn from_file(mut file: File, block_size: usize) -> Result<Self> {
        let log_len = file.metadata().map_err(HashLogError::Read)?.len();
        file.seek(SeekFrom::Start(0)).map_err(HashLogError::Read)?;

        let markers = MarkerScanner::new(block_size);
        Ok(Self {
            reader: TrackedReader::new(file, markers.block_size()),
            position: 0,
            log_len,
            markers,
            stats: ScanStats::default(),
        })
    }

    /// Read the next valid record, or `None` at the end of the log
    pub fn next_record(&mut self) -> Result<Option<LogRecord>> {
        loop {
            let body_offset = match self.markers.find_next(&mut self.reader, self.position) {
                Ok(offset) => offset,
                Err(HashLogError::IndicatorNotFound { .. }) => {
                    self.stats.bytes_skipped += self.log_len.saturating_sub(self.position);
                    self.position = self.log_len;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            let marker_offset = body_offset - MARKER_SIZE as u64;
            if marker_offset > self.position {
                self.stats.bytes_skipped += marker_offset - self.position;
            }

            // The marker search reads ahead; step back to the record body
            self.reader.seek_to(body_offset)?;

            match decode_record(&mut self.reader, body_offset, self.log_len) {
                Ok(record) => {
                    self.position = record.end_offset();
                    self.stats.records += 1;
                    if record.is_tombstone() {
                        self.stats.tombstones += 1;
                    }
                    return Ok(Some(record));
                }
                Err(HashLogError::CorruptRecord { offset, reason }) => {
                    tracing::warn!(offset, %reason, "skipping corrupt log record");
                    self.stats.corrupt_records += 1;
                    // The marker itself is skipped; the rest of the record is
                    // counted by the next search.
                    self.stats.bytes_skipped += MARKER_SIZE as u64;
                    // Resume just past this record's marker so the search
                    // always makes forward progress.
                    self.position = body_offset;
                    self.reader.seek_to(body_offset)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Statistics for the records read so far
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Size of the log when the scan started
    pub fn log_len(&self) -> u64 {
        self.log_len
    }
}

/// Buffered file reader that knows its own offset
///
/// Repositioning is relative, so a jump that lands inside the buffered
/// bytes (the usual case after a marker search) costs no syscall.
struct TrackedReader {
    inner: BufReader<File>,
    /// Absolute offset of the next byte `read` returns
    pos: u64,
}

impl TrackedReader {
    fn new(file: File, block_size: usize) -> Self {
        // Larger than one search block so block reads go through the buffer
        Self {
            inner: BufReader::with_capacity(block_size * 2, file),
            pos: 0,
        }
    }

    fn seek_to(&mut self, offset: u64) -> Result<()> {
        if offset != self.pos {
            let delta = offset as i64 - self.pos as i64;
            self.inner.seek_relative(delta).map_err(HashLogError::Read)?;
            self.pos = offset;
        }
        Ok(())
    }
}

impl Read for TrackedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Iterator for LogScanner {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Read exactly the value bytes at `location`
///
/// A short read means the index points past the end of the log, which is a
/// consistency fault, reported as `Read`.
pub fn read_value<R: Read + Seek>(reader: &mut R, location: Location) -> Result<Vec<u8>> {
    reader
        .seek(SeekFrom::Start(location.offset))
        .map_err(HashLogError::Read)?;

    let mut value = vec![0u8; location.length as usize];
    reader.read_exact(&mut value).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            HashLogError::Read(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "short read of {} bytes at offset {}: log truncated or index stale",
                    location.length, location.offset
                ),
            ))
        } else {
            HashLogError::Read(e)
        }
    })?;

    Ok(value)
}
