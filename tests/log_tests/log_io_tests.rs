//! Tests for log file I/O
//!
//! These tests verify:
//! - Writer appends at end-of-file and reports value locations
//! - Full scans return every valid record in log order
//! - Corrupt records and garbage are skipped with accurate statistics
//! - Random-access value reads, including short reads

use std::fs::{self, File, OpenOptions};
use std::io::{Cursor, Write};
use std::path::Path;

use hashlog::log::{encoded_len, read_value, LogScanner, LogWriter, ScanStats, HEADER_SIZE, MARKER_SIZE};
use hashlog::{HashLogError, Location, SyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const BLOCK: usize = 64;

fn write_log(path: &Path, records: &[(&str, &str)]) {
    let mut writer = LogWriter::open(path, SyncStrategy::EveryWrite).unwrap();
    for (key, value) in records {
        writer.append(key.as_bytes(), value.as_bytes()).unwrap();
    }
}

fn scan_all(path: &Path) -> (Vec<(Vec<u8>, Vec<u8>)>, ScanStats) {
    let mut scanner = LogScanner::open(path, BLOCK).unwrap();
    let mut out = Vec::new();
    while let Some(record) = scanner.next_record().unwrap() {
        out.push((record.key, record.value));
    }
    (out, scanner.stats())
}

fn pairs(records: &[(&str, &str)]) -> Vec<(Vec<u8>, Vec<u8>)> {
    records
        .iter()
        .map(|(k, v)| (k.as_bytes().to_vec(), v.as_bytes().to_vec()))
        .collect()
}

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_writer_creates_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");

    let writer = LogWriter::open(&path, SyncStrategy::EveryWrite).unwrap();
    assert!(path.exists());
    assert!(writer.is_empty());
    assert_eq!(writer.len(), 0);
}

#[test]
fn test_writer_open_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no_such_dir").join("db.log");

    let result = LogWriter::open(&path, SyncStrategy::EveryWrite);
    assert!(matches!(result, Err(HashLogError::OpenFile { .. })));
}

#[test]
fn test_append_returns_value_location() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    let mut writer = LogWriter::open(&path, SyncStrategy::EveryWrite).unwrap();

    let first = writer.append(b"key", b"value").unwrap();
    assert_eq!(first, Location::new((HEADER_SIZE + 3) as u64, 5));

    let second_start = encoded_len(3, 5);
    let second = writer.append(b"k2", b"v2").unwrap();
    assert_eq!(second, Location::new(second_start + (HEADER_SIZE + 2) as u64, 2));

    assert_eq!(writer.len(), encoded_len(3, 5) + encoded_len(2, 2));
    assert_eq!(fs::metadata(&path).unwrap().len(), writer.len());
}

#[test]
fn test_location_points_at_value_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    let mut writer = LogWriter::open(&path, SyncStrategy::EveryWrite).unwrap();

    writer.append(b"a", b"first").unwrap();
    let location = writer.append(b"b", b"second").unwrap();

    let bytes = fs::read(&path).unwrap();
    let start = location.offset as usize;
    assert_eq!(&bytes[start..location.end() as usize], b"second");
}

#[test]
fn test_append_tombstone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    let mut writer = LogWriter::open(&path, SyncStrategy::EveryWrite).unwrap();

    writer.append_tombstone(b"gone").unwrap();
    assert_eq!(writer.len(), encoded_len(4, 0));

    let (records, stats) = scan_all(&path);
    assert_eq!(records, vec![(b"gone".to_vec(), Vec::new())]);
    assert_eq!(stats.tombstones, 1);
}

#[test]
fn test_reopen_appends_after_existing_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    write_log(&path, &[("a", "1")]);

    let mut writer = LogWriter::open(&path, SyncStrategy::EveryNEntries { count: 10 }).unwrap();
    assert_eq!(writer.len(), encoded_len(1, 1));
    let location = writer.append(b"b", b"2").unwrap();
    writer.sync().unwrap();

    assert_eq!(location.offset, encoded_len(1, 1) + (HEADER_SIZE + 1) as u64);
    let (records, _) = scan_all(&path);
    assert_eq!(records, pairs(&[("a", "1"), ("", "2")]));
}

#[test]
fn test_create_truncates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    write_log(&path, &[("a", "1"), ("", "2")]);

    let writer = LogWriter::create(&path, SyncStrategy::EveryWrite).unwrap();
    assert!(writer.is_empty());
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
}

// =============================================================================
// Scanner Tests
// =============================================================================

#[test]
fn test_scan_empty_log() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    File::create(&path).unwrap();

    let (records, stats) = scan_all(&path);
    assert!(records.is_empty());
    assert_eq!(stats, ScanStats::default());
}

#[test]
fn test_scan_returns_records_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    let input = [("a", "1"), ("b", "22"), ("a", "333"), ("b", "")];
    write_log(&path, &input);

    let (records, stats) = scan_all(&path);
    assert_eq!(records, pairs(&input));
    assert_eq!(stats.records, 4);
    assert_eq!(stats.tombstones, 1);
    assert_eq!(stats.corrupt_records, 0);
    assert_eq!(stats.bytes_skipped, 0);
}

#[test]
fn test_scan_record_offsets_and_locations() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    let mut writer = LogWriter::open(&path, SyncStrategy::EveryWrite).unwrap();
    let loc_a = writer.append(b"a", b"alpha").unwrap();
    let loc_b = writer.append(b"bb", b"beta").unwrap();
    drop(writer);

    let mut scanner = LogScanner::open(&path, BLOCK).unwrap();
    let first = scanner.next_record().unwrap().unwrap();
    let second = scanner.next_record().unwrap().unwrap();

    assert_eq!(first.offset, 0);
    assert_eq!(first.location, loc_a);
    assert_eq!(second.offset, first.end_offset());
    assert_eq!(second.location, loc_b);
    assert!(scanner.next_record().unwrap().is_none());
}

#[test]
fn test_scanner_as_iterator() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    write_log(&path, &[("x", "1"), ("y", "2"), ("z", "3")]);

    let scanner = LogScanner::open(&path, BLOCK).unwrap();
    let keys: Vec<Vec<u8>> = scanner.map(|r| r.unwrap().key).collect();
    assert_eq!(keys, vec![b"x".to_vec(), b"y".to_vec(), b"z".to_vec()]);
}

#[test]
fn test_scan_skips_corrupt_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    let mut writer = LogWriter::open(&path, SyncStrategy::EveryWrite).unwrap();
    writer.append(b"k1", b"one").unwrap();
    let middle = writer.append(b"k2", b"two").unwrap();
    writer.append(b"k3", b"three").unwrap();
    drop(writer);

    // Flip one value byte of the middle record
    let mut bytes = fs::read(&path).unwrap();
    bytes[middle.offset as usize] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let (records, stats) = scan_all(&path);
    assert_eq!(records, pairs(&[("k1", "one"), ("k3", "three")]));
    assert_eq!(stats.records, 2);
    assert_eq!(stats.corrupt_records, 1);
    // The whole damaged record, marker included
    assert_eq!(stats.bytes_skipped, encoded_len(2, 3));
}

#[test]
fn test_scan_skips_leading_and_interleaved_garbage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    fs::write(&path, vec![0x11u8; 100]).unwrap();
    write_log(&path, &[("a", "1")]);
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0x22u8; 37]).unwrap();
    }
    write_log(&path, &[("", "2")]);

    let (records, stats) = scan_all(&path);
    assert_eq!(records, pairs(&[("a", "1"), ("", "2")]));
    assert_eq!(stats.bytes_skipped, 137);
    assert_eq!(stats.corrupt_records, 0);
}

#[test]
fn test_scan_drops_truncated_tail() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    write_log(&path, &[("a", "1"), ("", "a longer value")]);

    let full = fs::metadata(&path).unwrap().len();
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(full - 5).unwrap();
    drop(file);

    let (records, stats) = scan_all(&path);
    assert_eq!(records, pairs(&[("a", "1")]));
    assert_eq!(stats.corrupt_records, 1);
    assert_eq!(stats.bytes_skipped, encoded_len(0, 14) - 5);
}

#[test]
fn test_scan_trailing_garbage_counts_as_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    write_log(&path, &[("a", "1")]);
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0x33u8; 20]).unwrap();
    }

    let (records, stats) = scan_all(&path);
    assert_eq!(records.len(), 1);
    assert_eq!(stats.bytes_skipped, 20);
}

#[test]
fn test_scan_result_independent_of_block_size() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.log");
    fs::write(&path, vec![0x44u8; 50]).unwrap();
    let mut writer = LogWriter::open(&path, SyncStrategy::EveryWrite).unwrap();
    writer.append(b"k1", b"one").unwrap();
    let damaged = writer.append(b"k2", b"two").unwrap();
    writer.append(b"k3", &[0x55u8; 300]).unwrap();
    writer.append_tombstone(b"k1").unwrap();
    drop(writer);
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0x66u8; 11]).unwrap();
    }
    let mut bytes = fs::read(&path).unwrap();
    bytes[damaged.offset as usize] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let scan_with = |block: usize| {
        let mut scanner = LogScanner::open(&path, block).unwrap();
        let mut out = Vec::new();
        while let Some(record) = scanner.next_record().unwrap() {
            out.push((record.offset, record.key, record.value));
        }
        (out, scanner.stats())
    };

    let (expected, expected_stats) = scan_with(8192);
    assert_eq!(expected.len(), 3);
    assert_eq!(expected_stats.corrupt_records, 1);
    assert_eq!(expected_stats.tombstones, 1);
    assert_eq!(expected_stats.bytes_skipped, 50 + encoded_len(2, 3) + 11);

    for block in [MARKER_SIZE, MARKER_SIZE + 1, 13, BLOCK, 512] {
        assert_eq!(scan_with(block), (expected.clone(), expected_stats), "block {}", block);
    }
}

#[test]
fn test_scan_open_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let result = LogScanner::open(&dir.path().join("missing.log"), BLOCK);
    assert!(matches!(result, Err(HashLogError::OpenFile { .. })));
}

// =============================================================================
// Value Read Tests
// =============================================================================

#[test]
fn test_read_value_at_location() {
    let mut data = vec![0u8; 10];
    data.extend_from_slice(b"hello");
    data.extend_from_slice(&[0u8; 4]);

    let value = read_value(&mut Cursor::new(&data), Location::new(10, 5)).unwrap();
    assert_eq!(value, b"hello");
}

#[test]
fn test_read_value_short_read_is_read_error() {
    let data = vec![0u8; 12];
    let result = read_value(&mut Cursor::new(&data), Location::new(10, 5));

    assert!(matches!(result, Err(HashLogError::Read(_))));
}
