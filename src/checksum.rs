//! Record checksum
//!
//! CRC32 over a record's key followed by its value, widened into the
//! 8-byte checksum field of the log format. Neither the marker nor the
//! length fields are covered; a damaged length field shows up as a
//! mismatch because it changes which bytes are read as key and value.

/// Checksum stored at the tail of every record
pub type Checksum = u64;

/// Size of the checksum field on disk
pub const CHECKSUM_SIZE: usize = std::mem::size_of::<Checksum>();

/// Checksum of an arbitrary byte sequence
pub fn checksum(bytes: &[u8]) -> Checksum {
    crc32fast::hash(bytes) as Checksum
}

/// Checksum of `key ++ value` without concatenating the two slices
pub fn record_checksum(key: &[u8], value: &[u8]) -> Checksum {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(key);
    hasher.update(value);
    hasher.finalize() as Checksum
}
