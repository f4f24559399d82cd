//! Table Reader
//!
//! Binds one generation's mapped regions and answers lookups by binary
//! search over the offsets index.

use std::cmp::Ordering;
use std::path::Path;

use bytes::Bytes;

use crate::comparator::SharedComparator;
use crate::entry::Entry;
use crate::error::{Result, StrataError};
use crate::storage::codec::{self, OFFSET_SIZE};
use crate::storage::region::ReadRegion;

use super::iterator::TableIterator;

/// Read-only view of one generation
///
/// All methods take `&self`; concurrent lookups and iterations are safe.
#[derive(Debug, Clone)]
pub struct TableReader {
    /// Generation index this table was loaded from
    generation: u64,
    /// Sequential entry records
    values: ReadRegion,
    /// Dense u64 index into `values`
    offsets: ReadRegion,
    /// Cached `offsets.len() / 8`
    entry_count: u64,
    comparator: SharedComparator,
}

impl TableReader {
    /// Map both files of a generation
    pub fn open(
        generation: u64,
        values_path: &Path,
        offsets_path: &Path,
        comparator: SharedComparator,
    ) -> Result<Self> {
        let values = ReadRegion::map(values_path)?;
        let offsets = ReadRegion::map(offsets_path)?;
        Self::from_regions(generation, values, offsets, comparator)
    }

    /// Bind already-mapped regions
    pub fn from_regions(
        generation: u64,
        values: ReadRegion,
        offsets: ReadRegion,
        comparator: SharedComparator,
    ) -> Result<Self> {
        if offsets.len() % OFFSET_SIZE != 0 {
            return Err(StrataError::corrupt(
                offsets.len(),
                format!("offsets file length {} is not a multiple of 8", offsets.len()),
            ));
        }
        let entry_count = codec::entry_count(&offsets);

        Ok(Self {
            generation,
            values,
            offsets,
            entry_count,
            comparator,
        })
    }

    /// Binary search for `key`
    ///
    /// `Ok(index)` on an exact match, `Err(index)` with the first index whose
    /// key is greater than `key` otherwise (same contract as
    /// `slice::binary_search`).
    pub fn search(&self, key: &[u8]) -> Result<std::result::Result<u64, u64>> {
        let mut low = 0u64;
        let mut high = self.entry_count;

        while low < high {
            let mid = low + (high - low) / 2;
            match self.comparator.compare(self.key_at(mid)?, key) {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
                Ordering::Equal => return Ok(Ok(mid)),
            }
        }

        Ok(Err(low))
    }

    /// Index of the entry stored under exactly `key`
    pub fn point_lookup(&self, key: &[u8]) -> Result<Option<u64>> {
        Ok(self.search(key)?.ok())
    }

    /// The entry stored under `key`, tombstones included
    pub fn get(&self, key: &[u8]) -> Result<Option<Entry>> {
        match self.point_lookup(key)? {
            Some(index) => {
                tracing::trace!(generation = self.generation, index, "table hit");
                self.entry_at(index).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Full decode of the entry at logical `index`
    pub fn entry_at(&self, index: u64) -> Result<Entry> {
        let offset = codec::read_offset(&self.offsets, index)?;
        codec::decode_record(&self.values, offset)
    }

    /// Borrow the key at logical `index` without decoding its value
    pub fn key_at(&self, index: u64) -> Result<&[u8]> {
        let offset = codec::read_offset(&self.offsets, index)?;
        codec::decode_key(&self.values, offset)
    }

    /// Lazy ascending iterator over keys in `[from, to)`
    ///
    /// `None` leaves that side unbounded. The iterator shares this table's
    /// mappings and stays valid after the reader itself is dropped.
    pub fn iter(&self, from: Option<&[u8]>, to: Option<&[u8]>) -> Result<TableIterator> {
        let start = match from {
            Some(from) => match self.search(from)? {
                Ok(index) | Err(index) => index,
            },
            None => 0,
        };

        Ok(TableIterator::new(
            self.values.clone(),
            self.offsets.clone(),
            self.comparator.clone(),
            start,
            self.entry_count,
            to.map(Bytes::copy_from_slice),
        ))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Byte size of the values file
    pub fn values_bytes(&self) -> u64 {
        self.values.len()
    }

    /// Byte size of the offsets file
    pub fn offsets_bytes(&self) -> u64 {
        self.offsets.len()
    }
}
