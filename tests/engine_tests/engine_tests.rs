//! Engine Tests
//!
//! Tests verify:
//! - Basic get/upsert/remove operations
//! - Reads spanning memtable and generations
//! - Automatic and explicit flushes
//! - Range scans merged across every source
//! - Compaction and reopen behaviour
//! - Concurrent readers

use std::sync::Arc;
use std::thread;

use strata::storage::registry;
use strata::{Config, Engine, Entry, StrataError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open_path(&temp_dir.path().join("db")).unwrap();
    (temp_dir, engine)
}

fn open_with_threshold(temp: &TempDir, threshold: usize) -> Engine {
    let config = Config::builder()
        .base_path(temp.path().join("db"))
        .flush_threshold_bytes(threshold)
        .build();
    Engine::open(config).unwrap()
}

fn get_str(engine: &Engine, key: &str) -> Option<String> {
    engine
        .get(key.as_bytes())
        .unwrap()
        .map(|v| String::from_utf8(v.to_vec()).unwrap())
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_empty_base_path_rejected() {
    let result = Engine::open(Config::builder().base_path("").build());
    assert!(matches!(result, Err(StrataError::Config(_))));
}

#[test]
fn test_put_get_delete_in_memory() {
    let (_temp, engine) = setup_engine();

    engine.upsert("key", "value").unwrap();
    assert_eq!(get_str(&engine, "key"), Some("value".to_string()));

    engine.remove("key").unwrap();
    assert_eq!(get_str(&engine, "key"), None);
    assert_eq!(engine.get_entry(b"key").unwrap(), Some(Entry::tombstone("key")));
    assert_eq!(engine.get_entry(b"never").unwrap(), None);
}

#[test]
fn test_reads_fall_through_to_generations() {
    let (_temp, engine) = setup_engine();

    engine.upsert("a", "1").unwrap();
    engine.flush().unwrap();
    engine.upsert("b", "2").unwrap();

    assert_eq!(engine.memtable_entry_count(), 1);
    assert_eq!(engine.generation_count(), 1);
    assert_eq!(get_str(&engine, "a"), Some("1".to_string()));
    assert_eq!(get_str(&engine, "b"), Some("2".to_string()));
}

#[test]
fn test_memtable_tombstone_hides_flushed_value() {
    let (_temp, engine) = setup_engine();

    engine.upsert("x", "1").unwrap();
    engine.flush().unwrap();
    engine.remove("x").unwrap();

    assert_eq!(get_str(&engine, "x"), None);
}

#[test]
fn test_flushed_tombstone_is_not_not_found() {
    let (_temp, engine) = setup_engine();

    engine.upsert("x", "1").unwrap();
    engine.flush().unwrap();
    engine.remove("x").unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.generation_count(), 2);
    assert_eq!(engine.get_entry(b"x").unwrap(), Some(Entry::tombstone("x")));
    assert_eq!(get_str(&engine, "x"), None);
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_flush_empty_memtable_is_noop() {
    let (temp, engine) = setup_engine();

    assert!(engine.flush().unwrap().is_none());
    assert_eq!(engine.generation_count(), 0);
    assert!(!temp.path().join("db").exists());
}

#[test]
fn test_auto_flush_on_threshold() {
    let temp = TempDir::new().unwrap();
    let engine = open_with_threshold(&temp, 64);

    for i in 0..20 {
        engine.upsert(format!("key{:02}", i), "0123456789").unwrap();
    }

    assert!(engine.generation_count() >= 2);
    for i in 0..20 {
        assert_eq!(get_str(&engine, &format!("key{:02}", i)), Some("0123456789".to_string()));
    }
}

#[test]
fn test_zero_threshold_never_auto_flushes() {
    let temp = TempDir::new().unwrap();
    let engine = open_with_threshold(&temp, 0);

    for i in 0..100 {
        engine.upsert(format!("key{}", i), vec![0u8; 1024]).unwrap();
    }
    assert_eq!(engine.generation_count(), 0);
    assert_eq!(engine.memtable_entry_count(), 100);
}

// =============================================================================
// Range Tests
// =============================================================================

#[test]
fn test_range_merges_all_sources_newest_wins() {
    let (_temp, engine) = setup_engine();

    engine.upsert("a", "1").unwrap();
    engine.upsert("b", "2").unwrap();
    engine.flush().unwrap();
    engine.upsert("b", "3").unwrap();
    engine.upsert("c", "4").unwrap();
    engine.flush().unwrap();
    engine.upsert("c", "5").unwrap();
    engine.remove("a").unwrap();
    engine.upsert("d", "6").unwrap();

    assert_eq!(
        engine.range(None, None).unwrap(),
        vec![Entry::new("b", "3"), Entry::new("c", "5"), Entry::new("d", "6")]
    );
    assert_eq!(
        engine.range(Some(&b"b"[..]), Some(&b"d"[..])).unwrap(),
        vec![Entry::new("b", "3"), Entry::new("c", "5")]
    );
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compact_nothing() {
    let (_temp, engine) = setup_engine();
    assert!(engine.compact().unwrap().is_none());
}

#[test]
fn test_compact_merges_memtable_and_generations() {
    let (temp, engine) = setup_engine();

    engine.upsert("a", "1").unwrap();
    engine.upsert("b", "2").unwrap();
    engine.flush().unwrap();
    engine.upsert("b", "3").unwrap();
    engine.upsert("c", "4").unwrap();
    engine.flush().unwrap();
    engine.remove("a").unwrap();
    engine.upsert("d", "5").unwrap();

    let info = engine.compact().unwrap().unwrap();

    // Tombstoned "a" is dropped from the single remaining generation
    assert_eq!(info.entry_count, 3);
    assert_eq!(engine.generations(), vec![info.index]);
    assert_eq!(engine.memtable_entry_count(), 0);
    assert_eq!(registry::discover(&temp.path().join("db")).unwrap(), vec![info.index]);

    assert_eq!(get_str(&engine, "a"), None);
    assert_eq!(engine.get_entry(b"a").unwrap(), None);
    assert_eq!(get_str(&engine, "b"), Some("3".to_string()));
    assert_eq!(get_str(&engine, "c"), Some("4".to_string()));
    assert_eq!(get_str(&engine, "d"), Some("5".to_string()));
}

#[test]
fn test_writes_after_compaction() {
    let (_temp, engine) = setup_engine();

    engine.upsert("a", "1").unwrap();
    engine.compact().unwrap();
    engine.upsert("a", "2").unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.generation_count(), 2);
    assert_eq!(get_str(&engine, "a"), Some("2".to_string()));

    engine.compact().unwrap();
    assert_eq!(engine.generation_count(), 1);
    assert_eq!(get_str(&engine, "a"), Some("2".to_string()));
}

// =============================================================================
// Close / Reopen Tests
// =============================================================================

#[test]
fn test_close_persists_and_reopen_reads() {
    let temp = TempDir::new().unwrap();
    {
        let engine = open_with_threshold(&temp, 0);
        engine.upsert("persisted", "yes").unwrap();
        engine.remove("gone").unwrap();
        engine.close().unwrap();
        engine.close().unwrap(); // idempotent
    }

    let engine = open_with_threshold(&temp, 0);
    assert_eq!(get_str(&engine, "persisted"), Some("yes".to_string()));
    assert_eq!(engine.get_entry(b"gone").unwrap(), Some(Entry::tombstone("gone")));
}

#[test]
fn test_closed_engine_rejects_reads() {
    let (_temp, engine) = setup_engine();
    engine.upsert("a", "1").unwrap();
    engine.flush().unwrap();
    engine.close().unwrap();

    assert!(matches!(engine.get(b"a"), Err(StrataError::Closed)));
    assert!(matches!(engine.get_entry(b"a"), Err(StrataError::Closed)));
    assert!(matches!(engine.range(None, None), Err(StrataError::Closed)));
}

#[test]
fn test_closed_engine_rejects_writes() {
    let temp = TempDir::new().unwrap();
    {
        let engine = open_with_threshold(&temp, 0);
        engine.close().unwrap();

        assert!(matches!(engine.upsert("z", "1"), Err(StrataError::Closed)));
        assert!(matches!(engine.remove("z"), Err(StrataError::Closed)));
        assert!(matches!(engine.flush(), Err(StrataError::Closed)));
        engine.close().unwrap();
    }

    let engine = open_with_threshold(&temp, 0);
    assert_eq!(engine.get_entry(b"z").unwrap(), None);
}

#[test]
fn test_closed_engine_compact_keeps_flushed_data() {
    let temp = TempDir::new().unwrap();
    {
        let engine = open_with_threshold(&temp, 0);
        engine.upsert("a", "1").unwrap();
        engine.flush().unwrap();
        engine.close().unwrap();

        assert!(matches!(engine.compact(), Err(StrataError::Closed)));
    }

    let engine = open_with_threshold(&temp, 0);
    assert_eq!(get_str(&engine, "a"), Some("1".to_string()));
    assert_eq!(registry::discover(&temp.path().join("db")).unwrap(), vec![0]);
}

#[test]
fn test_reopen_after_compaction() {
    let temp = TempDir::new().unwrap();
    {
        let engine = open_with_threshold(&temp, 0);
        for round in 0..3 {
            for i in 0..10 {
                engine.upsert(format!("k{}", i), format!("r{}", round)).unwrap();
            }
            engine.flush().unwrap();
        }
        engine.compact().unwrap();
        engine.close().unwrap();
    }

    let engine = open_with_threshold(&temp, 0);
    assert_eq!(engine.generation_count(), 1);
    assert_eq!(engine.range(None, None).unwrap().len(), 10);
    assert_eq!(get_str(&engine, "k7"), Some("r2".to_string()));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_during_flush() {
    let temp = TempDir::new().unwrap();
    let engine = Arc::new(open_with_threshold(&temp, 0));
    for i in 0..200 {
        engine.upsert(format!("key{:03}", i), format!("v{}", i)).unwrap();
    }

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..200 {
                    let key = format!("key{:03}", i);
                    assert_eq!(get_str(&engine, &key), Some(format!("v{}", i)));
                }
            })
        })
        .collect();

    engine.flush().unwrap();

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(engine.generation_count(), 1);
}
