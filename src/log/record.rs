//! Log record codec
//!
//! Encodes one key/value pair into a marker-prefixed record and decodes a
//! record whose marker has already been consumed.

use std::io::{ErrorKind, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::{record_checksum, Checksum, CHECKSUM_SIZE};
use crate::error::{HashLogError, Result};
use crate::index::Location;

// =============================================================================
// Format Constants
// =============================================================================

/// Magic value written before every record
pub const MARKER: u64 = 0x1725_3945_5160_7083;

/// Marker as it appears on disk
pub const MARKER_BYTES: [u8; MARKER_SIZE] = MARKER.to_le_bytes();

/// Marker size in bytes
pub const MARKER_SIZE: usize = std::mem::size_of::<u64>();

/// Key length (1) + value length (8)
pub const LENGTHS_SIZE: usize = 1 + 8;

/// Marker (8) + key length (1) + value length (8) = 17 bytes
pub const HEADER_SIZE: usize = MARKER_SIZE + LENGTHS_SIZE;

/// Keys are length-prefixed with a single byte
pub const MAX_KEY_SIZE: usize = u8::MAX as usize;

// =============================================================================
// Decoded Record
// =============================================================================

/// A record decoded from the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Offset of the record's marker
    pub offset: u64,

    pub key: Vec<u8>,

    /// Value bytes (empty for a tombstone)
    pub value: Vec<u8>,

    /// Where the value bytes live in the log
    pub location: Location,

    /// Total encoded size including marker and checksum
    pub record_len: u64,
}

impl LogRecord {
    /// A zero-length value marks a deletion
    pub fn is_tombstone(&self) -> bool {
        self.value.is_empty()
    }

    /// Offset one past the record's checksum
    pub fn end_offset(&self) -> u64 {
        self.offset + self.record_len
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Size of the encoded record for the given key and value lengths
pub fn encoded_len(key_len: usize, value_len: usize) -> u64 {
    (HEADER_SIZE + key_len + CHECKSUM_SIZE) as u64 + value_len as u64
}

/// Encode a record; an empty `value` encodes a tombstone
///
/// Format: marker (8) + key_len (1) + value_len (8) + key + value + checksum (8)
pub fn encode_record(key: &[u8], value: &[u8]) -> Result<Bytes> {
    let key_len = u8::try_from(key.len()).map_err(|_| HashLogError::KeyTooLarge {
        len: key.len(),
        max: MAX_KEY_SIZE,
    })?;

    let mut buf = BytesMut::with_capacity(encoded_len(key.len(), value.len()) as usize);
    buf.put_slice(&MARKER_BYTES);
    buf.put_u8(key_len);
    buf.put_u64_le(value.len() as u64);
    buf.put_slice(key);
    buf.put_slice(value);
    buf.put_u64_le(record_checksum(key, value));

    Ok(buf.freeze())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode the record whose marker ends at `body_offset`
///
/// `reader` must be positioned at `body_offset` (immediately after the
/// marker). `log_len` bounds the lengths read from the header so a damaged
/// length field cannot trigger a huge allocation.
///
/// Returns `CorruptRecord` on a truncated record, an impossible length, or a
/// checksum mismatch; the caller resynchronizes from `body_offset`.
pub fn decode_record<R: Read>(reader: &mut R, body_offset: u64, log_len: u64) -> Result<LogRecord> {
    let offset = body_offset.saturating_sub(MARKER_SIZE as u64);
    let corrupt = |reason: String| HashLogError::CorruptRecord { offset, reason };

    let mut lengths = [0u8; LENGTHS_SIZE];
    read_exact_or_corrupt(reader, &mut lengths, offset, "truncated header")?;

    let key_len = lengths[0] as usize;
    let value_len = u64::from_le_bytes([
        lengths[1], lengths[2], lengths[3], lengths[4], lengths[5], lengths[6], lengths[7],
        lengths[8],
    ]);

    let record_len = (HEADER_SIZE + key_len + CHECKSUM_SIZE) as u64;
    let record_len = record_len
        .checked_add(value_len)
        .ok_or_else(|| corrupt(format!("value length {} overflows", value_len)))?;
    if offset.checked_add(record_len).map_or(true, |end| end > log_len) {
        return Err(corrupt(format!(
            "record of {} bytes runs past end of log ({} bytes)",
            record_len, log_len
        )));
    }

    let mut key = vec![0u8; key_len];
    read_exact_or_corrupt(reader, &mut key, offset, "truncated key")?;

    let mut value = vec![0u8; value_len as usize];
    read_exact_or_corrupt(reader, &mut value, offset, "truncated value")?;

    let mut stored = [0u8; CHECKSUM_SIZE];
    read_exact_or_corrupt(reader, &mut stored, offset, "truncated checksum")?;
    let stored = Checksum::from_le_bytes(stored);

    let computed = record_checksum(&key, &value);
    if stored != computed {
        return Err(corrupt(format!(
            "checksum mismatch (stored {:#018x}, computed {:#018x})",
            stored, computed
        )));
    }

    let value_offset = body_offset + (LENGTHS_SIZE + key_len) as u64;
    Ok(LogRecord {
        offset,
        key,
        value,
        location: Location::new(value_offset, value_len),
        record_len,
    })
}

fn read_exact_or_corrupt<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    offset: u64,
    what: &str,
) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => HashLogError::CorruptRecord {
            offset,
            reason: what.to_string(),
        },
        _ => HashLogError::Read(e),
    })
}
