//! Priority Iterator wrapper
//!
//! Adapts a sorted entry stream with a one-item lookahead and a recency
//! rank, which is what the merge engine needs to resolve duplicate keys.

use crate::entry::Entry;
use crate::error::{Result, StrataError};

use super::table::TableIterator;

/// Boxed per-source stream consumed by the merge engine
pub type EntryStream = Box<dyn Iterator<Item = Result<Entry>> + Send>;

/// Sorted stream with `peek` and a recency priority
///
/// Lower priority value = newer data. Storage generations are ranked from 1
/// (newest); the in-memory buffer, when merged, takes 0.
pub struct PeekingPriorityIterator {
    inner: EntryStream,
    peeked: Option<Option<Result<Entry>>>,
    priority: u32,
}

impl PeekingPriorityIterator {
    pub fn new(inner: EntryStream, priority: u32) -> Self {
        Self {
            inner,
            peeked: None,
            priority,
        }
    }

    /// Wrap a generation's table iterator
    pub fn from_table(iter: TableIterator, priority: u32) -> Self {
        Self::new(Box::new(iter), priority)
    }

    /// Wrap already-materialized entries (e.g. a memtable snapshot)
    pub fn from_entries(entries: Vec<Entry>, priority: u32) -> Self {
        Self::new(Box::new(entries.into_iter().map(Ok::<Entry, StrataError>)), priority)
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// The next item without consuming it
    pub fn peek(&mut self) -> Option<&Result<Entry>> {
        let inner = &mut self.inner;
        self.peeked.get_or_insert_with(|| inner.next()).as_ref()
    }

    /// The item loaded by the last `peek`, if any
    pub fn peeked(&self) -> Option<&Result<Entry>> {
        self.peeked.as_ref().and_then(|peeked| peeked.as_ref())
    }

    /// Key of the next entry, if the next item is an entry
    pub fn peek_key(&mut self) -> Option<&[u8]> {
        match self.peek() {
            Some(Ok(entry)) => Some(&entry.key[..]),
            _ => None,
        }
    }
}

impl Iterator for PeekingPriorityIterator {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.inner.next(),
        }
    }
}

impl std::fmt::Debug for PeekingPriorityIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeekingPriorityIterator")
            .field("priority", &self.priority)
            .field("peeked", &self.peeked)
            .finish()
    }
}
