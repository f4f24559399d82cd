//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::entry::{Entry, EntrySource};

/// In-memory table for recent writes
pub struct MemTable {
    /// Sorted key → value; `None` is a tombstone
    data: RwLock<BTreeMap<Bytes, Option<Bytes>>>,
    /// Approximate size: sum of key + value lengths
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get the entry for `key`; tombstones are returned as such
    pub fn get(&self, key: &[u8]) -> Option<Entry> {
        let data = self.data.read();
        data.get_key_value(key).map(|(key, value)| Entry {
            key: key.clone(),
            value: value.clone(),
        })
    }

    /// Insert or replace an entry (`value == None` records a deletion)
    pub fn upsert(&self, entry: Entry) {
        let added = entry.payload_len() as usize;
        let mut data = self.data.write();
        let removed = match data.get_key_value(&entry.key[..]) {
            Some((key, value)) => key.len() + value.as_ref().map_or(0, |v| v.len()),
            None => 0,
        };
        data.insert(entry.key, entry.value);

        // Writers are serialized by the write lock held above
        let size = self.size.load(Ordering::Relaxed);
        self.size.store(size + added - removed, Ordering::Relaxed);
    }

    /// Put a key-value pair
    pub fn put(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        self.upsert(Entry::new(key, value));
    }

    /// Delete a key (inserts tombstone)
    pub fn delete(&self, key: impl Into<Bytes>) {
        self.upsert(Entry::tombstone(key));
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Get entry count (tombstones included)
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Check if should flush (size > limit, limit 0 = never)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        size_limit > 0 && self.size() > size_limit
    }

    /// Snapshot of all entries in sorted key order
    pub fn iter(&self) -> Vec<Entry> {
        self.range(None, None)
    }

    /// Snapshot of entries with key in `[from, to)`
    pub fn range(&self, from: Option<&[u8]>, to: Option<&[u8]>) -> Vec<Entry> {
        let lower = from.map_or(Bound::Unbounded, Bound::Included);
        let upper = to.map_or(Bound::Unbounded, Bound::Excluded);
        if let (Bound::Included(from), Bound::Excluded(to)) = (lower, upper) {
            if from >= to {
                return Vec::new();
            }
        }

        let data = self.data.read();
        data.range::<[u8], _>((lower, upper))
            .map(|(key, value)| Entry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
        self.size.store(0, Ordering::Relaxed);
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EntrySource for MemTable {
    fn is_empty(&self) -> bool {
        MemTable::is_empty(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_> {
        Box::new(self.iter().into_iter())
    }
}
