//! Tests for the table codec
//!
//! These tests verify:
//! - Exact pre-write sizing of both files
//! - Cursor chaining of record and offset writes
//! - Decoding of live values, empty values and tombstones
//! - Bounds checks on corrupt length fields

use std::path::{Path, PathBuf};

use strata::storage::codec::{self, TableSize, OFFSET_SIZE, RECORD_HEADER_SIZE, TOMBSTONE_LEN};
use strata::storage::region::{ReadRegion, WriteRegion};
use strata::{Entry, StrataError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_table(dir: &Path, entries: &[Entry]) -> (PathBuf, PathBuf) {
    let size = TableSize::measure(entries.iter().cloned());
    let values_path = dir.join("values0");
    let offsets_path = dir.join("offsets0");

    let mut values = WriteRegion::create(&values_path, size.values_bytes).unwrap();
    let mut offsets = WriteRegion::create(&offsets_path, size.offsets_bytes).unwrap();

    let mut value_cursor = 0;
    let mut offset_cursor = 0;
    for entry in entries {
        let next_offset_cursor = codec::write_offset_entry(value_cursor, &mut offsets, offset_cursor).unwrap();
        assert_eq!(next_offset_cursor, offset_cursor + 8);
        offset_cursor = next_offset_cursor;
        value_cursor = codec::encode_record(entry, &mut values, value_cursor).unwrap();
    }
    values.finish(value_cursor).unwrap();
    offsets.finish(offset_cursor).unwrap();

    (values_path, offsets_path)
}

fn decode_all(values: &ReadRegion, offsets: &ReadRegion) -> Vec<Entry> {
    (0..codec::entry_count(offsets))
        .map(|i| {
            let offset = codec::read_offset(offsets, i).unwrap();
            codec::decode_record(values, offset).unwrap()
        })
        .collect()
}

// =============================================================================
// Sizing Tests
// =============================================================================

#[test]
fn test_sizing_matches_written_bytes() {
    let temp = TempDir::new().unwrap();
    let entries = vec![
        Entry::new("alpha", "1"),
        Entry::tombstone("beta"),
        Entry::new("gamma", "three"),
    ];

    let size = TableSize::measure(entries.iter().cloned());
    let (values_path, offsets_path) = write_table(temp.path(), &entries);

    assert_eq!(size.entry_count, 3);
    assert_eq!(size.values_bytes, 2 * 8 * 3 + (5 + 4 + 5) + (1 + 5));
    assert_eq!(size.offsets_bytes, 8 * 3);
    assert_eq!(std::fs::metadata(values_path).unwrap().len(), size.values_bytes);
    assert_eq!(std::fs::metadata(offsets_path).unwrap().len(), size.offsets_bytes);
}

#[test]
fn test_sizing_from_totals() {
    let size = TableSize::from_totals(4, 100);
    assert_eq!(size.values_bytes, 4 * RECORD_HEADER_SIZE + 100);
    assert_eq!(size.offsets_bytes, 4 * OFFSET_SIZE);
}

#[test]
fn test_record_size() {
    assert_eq!(codec::record_size(&Entry::new("ab", "cde")), 16 + 5);
    assert_eq!(codec::record_size(&Entry::tombstone("ab")), 16 + 2);
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_decode_reproduces_entries() {
    let temp = TempDir::new().unwrap();
    let entries = vec![
        Entry::new("", "empty key"),
        Entry::new("a", ""),
        Entry::tombstone("b"),
        Entry::new(vec![0u8, 1, 2], vec![255u8; 1024]),
    ];
    let (values_path, offsets_path) = write_table(temp.path(), &entries);

    let values = ReadRegion::map(&values_path).unwrap();
    let offsets = ReadRegion::map(&offsets_path).unwrap();

    assert_eq!(decode_all(&values, &offsets), entries);
}

#[test]
fn test_tombstone_is_distinct_from_empty_value() {
    let temp = TempDir::new().unwrap();
    let entries = vec![Entry::new("a", ""), Entry::tombstone("b")];
    let (values_path, offsets_path) = write_table(temp.path(), &entries);

    let values = ReadRegion::map(&values_path).unwrap();
    let offsets = ReadRegion::map(&offsets_path).unwrap();
    let decoded = decode_all(&values, &offsets);

    assert_eq!(decoded[0].value.as_deref(), Some(&b""[..]));
    assert!(decoded[1].is_tombstone());

    // Tombstone record: key len, key, sentinel, nothing else
    let second = codec::read_offset(&offsets, 1).unwrap();
    assert_eq!(values.read_i64(second + 8 + 1).unwrap(), TOMBSTONE_LEN);
    assert_eq!(second + 8 + 1 + 8, values.len());
}

#[test]
fn test_decode_key_skips_value() {
    let temp = TempDir::new().unwrap();
    let entries = vec![Entry::new("key", "a long value that is not needed")];
    let (values_path, offsets_path) = write_table(temp.path(), &entries);

    let values = ReadRegion::map(&values_path).unwrap();
    let offsets = ReadRegion::map(&offsets_path).unwrap();
    let offset = codec::read_offset(&offsets, 0).unwrap();

    assert_eq!(codec::decode_key(&values, offset).unwrap(), b"key");
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_key_length_past_end_is_corrupt() {
    let mut raw = Vec::new();
    raw.extend_from_slice(&u64::MAX.to_le_bytes());
    raw.extend_from_slice(b"k");
    let values = ReadRegion::from_bytes(&raw).unwrap();

    let result = codec::decode_record(&values, 0);
    assert!(matches!(result, Err(StrataError::CorruptFormat { .. })));
}

#[test]
fn test_offset_past_end_is_corrupt() {
    let values = ReadRegion::from_bytes(&[0u8; 4]).unwrap();
    assert!(matches!(
        codec::decode_key(&values, 100),
        Err(StrataError::CorruptFormat { offset: 100, .. })
    ));
}

#[test]
fn test_encode_past_capacity_fails() {
    let temp = TempDir::new().unwrap();
    let mut values = WriteRegion::create(&temp.path().join("values0"), 10).unwrap();

    let result = codec::encode_record(&Entry::new("key", "value"), &mut values, 0);
    assert!(matches!(result, Err(StrataError::CapacityExceeded { .. })));
}
