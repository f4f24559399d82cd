//! Table Iterator
//!
//! Forward-only iteration over a key range of one generation.

use std::cmp::Ordering;

use bytes::Bytes;

use crate::comparator::SharedComparator;
use crate::entry::Entry;
use crate::error::Result;
use crate::storage::codec;
use crate::storage::region::ReadRegion;

/// Iterator over one generation's entries in ascending key order
///
/// Stops at the first key `>= to` without decoding its value. Yields at most
/// one error, then ends.
#[derive(Debug)]
pub struct TableIterator {
    values: ReadRegion,
    offsets: ReadRegion,
    comparator: SharedComparator,
    /// Next logical index to decode
    next_index: u64,
    /// One past the last index this iterator may visit
    end_index: u64,
    /// Exclusive upper key bound
    to: Option<Bytes>,
}

impl TableIterator {
    pub(super) fn new(
        values: ReadRegion,
        offsets: ReadRegion,
        comparator: SharedComparator,
        start_index: u64,
        end_index: u64,
        to: Option<Bytes>,
    ) -> Self {
        Self {
            values,
            offsets,
            comparator,
            next_index: start_index,
            end_index,
            to,
        }
    }

    fn read_next(&mut self) -> Result<Option<Entry>> {
        let offset = codec::read_offset(&self.offsets, self.next_index)?;

        if let Some(to) = &self.to {
            let key = codec::decode_key(&self.values, offset)?;
            if self.comparator.compare(key, to) != Ordering::Less {
                return Ok(None);
            }
        }

        let entry = codec::decode_record(&self.values, offset)?;
        self.next_index += 1;
        Ok(Some(entry))
    }
}

impl Iterator for TableIterator {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.end_index {
            return None;
        }

        match self.read_next() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                // Past the upper bound
                self.next_index = self.end_index;
                None
            }
            Err(e) => {
                self.next_index = self.end_index;
                Some(Err(e))
            }
        }
    }
}
