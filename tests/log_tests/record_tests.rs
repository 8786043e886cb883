//! Tests for log record encoding and decoding
//!
//! These tests verify:
//! - Exact on-disk layout of a record
//! - Checksum scope (key + value only) and sensitivity
//! - Corruption detection (checksum, truncation, impossible lengths)
//! - Key size boundary

use std::io::Cursor;

use hashlog::checksum::{checksum, record_checksum, CHECKSUM_SIZE};
use hashlog::log::{
    decode_record, encode_record, encoded_len, HEADER_SIZE, MARKER, MARKER_BYTES, MARKER_SIZE,
    MAX_KEY_SIZE,
};
use hashlog::{HashLogError, Location};

// =============================================================================
// Helper Functions
// =============================================================================

/// Decode a full encoded record (marker included) placed at `base`
fn decode_at(bytes: &[u8], base: u64) -> hashlog::Result<hashlog::log::LogRecord> {
    let mut cursor = Cursor::new(&bytes[MARKER_SIZE..]);
    decode_record(&mut cursor, base + MARKER_SIZE as u64, base + bytes.len() as u64)
}

// =============================================================================
// Checksum Tests
// =============================================================================

#[test]
fn test_checksum_split_point_does_not_matter() {
    assert_eq!(record_checksum(b"ab", b"cd"), checksum(b"abcd"));
    assert_eq!(record_checksum(b"", b"abcd"), record_checksum(b"abcd", b""));
}

#[test]
fn test_checksum_is_order_sensitive() {
    assert_ne!(checksum(b"ab"), checksum(b"ba"));
    // Same bytes eight positions apart
    assert_ne!(checksum(b"a0000000b"), checksum(b"b0000000a"));
}

#[test]
fn test_checksum_detects_single_bit_flip() {
    let original = b"the quick brown fox".to_vec();
    let mut flipped = original.clone();
    flipped[7] ^= 0x01;
    assert_ne!(checksum(&original), checksum(&flipped));
}

// =============================================================================
// Encoding Layout Tests
// =============================================================================

#[test]
fn test_encode_layout() {
    let bytes = encode_record(b"key", b"value").unwrap();

    assert_eq!(bytes.len() as u64, encoded_len(3, 5));
    assert_eq!(bytes.len(), MARKER_SIZE + 1 + 8 + 3 + 5 + CHECKSUM_SIZE);

    assert_eq!(&bytes[..MARKER_SIZE], &MARKER.to_le_bytes());
    assert_eq!(bytes[8], 3);
    assert_eq!(u64::from_le_bytes(bytes[9..17].try_into().unwrap()), 5);
    assert_eq!(&bytes[17..20], b"key");
    assert_eq!(&bytes[20..25], b"value");

    let stored = u64::from_le_bytes(bytes[25..33].try_into().unwrap());
    assert_eq!(stored, record_checksum(b"key", b"value"));
}

#[test]
fn test_encode_tombstone() {
    let bytes = encode_record(b"gone", b"").unwrap();

    assert_eq!(bytes.len() as u64, encoded_len(4, 0));
    assert_eq!(u64::from_le_bytes(bytes[9..17].try_into().unwrap()), 0);
}

#[test]
fn test_marker_bytes_match_constant() {
    assert_eq!(MARKER_BYTES, MARKER.to_le_bytes());
    assert_eq!(HEADER_SIZE, 17);
}

#[test]
fn test_encode_max_key_size() {
    let key = vec![b'k'; MAX_KEY_SIZE];
    let bytes = encode_record(&key, b"v").unwrap();
    assert_eq!(bytes[8], 255);
}

#[test]
fn test_encode_key_too_large() {
    let key = vec![b'k'; MAX_KEY_SIZE + 1];
    let result = encode_record(&key, b"v");

    assert!(matches!(
        result,
        Err(HashLogError::KeyTooLarge { len: 256, max: 255 })
    ));
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_record() {
    let bytes = encode_record(b"hello", b"world").unwrap();
    let record = decode_at(&bytes, 0).unwrap();

    assert_eq!(record.offset, 0);
    assert_eq!(record.key, b"hello");
    assert_eq!(record.value, b"world");
    assert_eq!(record.record_len, bytes.len() as u64);
    assert!(!record.is_tombstone());
    // value starts after marker, lengths and key
    assert_eq!(record.location, Location::new(HEADER_SIZE as u64 + 5, 5));
}

#[test]
fn test_decode_location_is_absolute() {
    let bytes = encode_record(b"k", b"vv").unwrap();
    let record = decode_at(&bytes, 1000).unwrap();

    assert_eq!(record.offset, 1000);
    assert_eq!(record.location, Location::new(1000 + HEADER_SIZE as u64 + 1, 2));
    assert_eq!(record.end_offset(), 1000 + bytes.len() as u64);
}

#[test]
fn test_decode_tombstone() {
    let bytes = encode_record(b"k", b"").unwrap();
    let record = decode_at(&bytes, 0).unwrap();

    assert!(record.is_tombstone());
    assert_eq!(record.location.length, 0);
}

#[test]
fn test_decode_empty_key() {
    let bytes = encode_record(b"", b"value").unwrap();
    let record = decode_at(&bytes, 0).unwrap();

    assert!(record.key.is_empty());
    assert_eq!(record.value, b"value");
}

#[test]
fn test_decode_value_corruption_detected() {
    let mut bytes = encode_record(b"key", b"value").unwrap().to_vec();
    bytes[HEADER_SIZE + 3] ^= 0xFF;

    let result = decode_at(&bytes, 0);
    assert!(matches!(result, Err(HashLogError::CorruptRecord { offset: 0, .. })));
}

#[test]
fn test_decode_key_corruption_detected() {
    let mut bytes = encode_record(b"key", b"value").unwrap().to_vec();
    bytes[HEADER_SIZE] ^= 0x01;

    assert!(matches!(
        decode_at(&bytes, 0),
        Err(HashLogError::CorruptRecord { .. })
    ));
}

#[test]
fn test_decode_checksum_corruption_detected() {
    let mut bytes = encode_record(b"key", b"value").unwrap().to_vec();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;

    assert!(matches!(
        decode_at(&bytes, 0),
        Err(HashLogError::CorruptRecord { .. })
    ));
}

#[test]
fn test_decode_truncated_record() {
    let bytes = encode_record(b"key", b"value").unwrap().to_vec();

    for cut in [MARKER_SIZE + 4, HEADER_SIZE + 2, bytes.len() - 1] {
        let truncated = &bytes[..cut];
        let result = decode_at(truncated, 0);
        assert!(
            matches!(result, Err(HashLogError::CorruptRecord { .. })),
            "cut at {} should be corrupt",
            cut
        );
    }
}

#[test]
fn test_decode_huge_value_length_rejected() {
    let mut bytes = encode_record(b"key", b"value").unwrap().to_vec();
    bytes[9..17].copy_from_slice(&u64::MAX.to_le_bytes());

    assert!(matches!(
        decode_at(&bytes, 0),
        Err(HashLogError::CorruptRecord { .. })
    ));
}

#[test]
fn test_decode_large_value() {
    let value: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    let bytes = encode_record(b"big", &value).unwrap();
    let record = decode_at(&bytes, 0).unwrap();

    assert_eq!(record.value, value);
}
