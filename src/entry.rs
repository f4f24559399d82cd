//! Entries and the buffered-source contract

use bytes::Bytes;

/// A key with an optional value
///
/// `value == None` is a tombstone: the key was deleted, which is distinct
/// from the key never having been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Bytes,
    pub value: Option<Bytes>,
}

impl Entry {
    /// A live key/value pair
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// A deletion marker for `key`
    pub fn tombstone(key: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Key plus value bytes (tombstones contribute only the key)
    pub fn payload_len(&self) -> u64 {
        (self.key.len() + self.value.as_ref().map_or(0, |v| v.len())) as u64
    }
}

/// A restartable, ascending-key, duplicate-free sequence of entries
///
/// Flushing walks the source twice (measure, then write), so every call to
/// `entries` must yield the same sequence.
pub trait EntrySource {
    /// Whether the source holds no entries at all
    fn is_empty(&self) -> bool;

    /// A fresh pass over the entries, in ascending key order
    fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_>;
}

impl EntrySource for [Entry] {
    fn is_empty(&self) -> bool {
        <[Entry]>::is_empty(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_> {
        Box::new(self.iter().cloned())
    }
}

impl EntrySource for Vec<Entry> {
    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_> {
        Box::new(self.iter().cloned())
    }
}
