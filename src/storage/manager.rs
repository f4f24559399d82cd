//! Storage Manager
//!
//! Owns the mapped generations of one storage directory and coordinates
//! reads, flushes and compactions.
//!
//! ## Responsibilities
//! - Discover existing generations on startup
//! - Search generations newest → oldest for reads
//! - Hand out per-generation sorted iterators to the merge engine
//! - Write new generations from buffered entries (flush)
//! - Replace every generation with one merged generation (compaction)

use std::fs;
use std::path::{Path, PathBuf};

use crate::comparator::SharedComparator;
use crate::entry::{Entry, EntrySource};
use crate::error::{Result, StrataError};

use super::codec::{self, TableSize};
use super::priority::PeekingPriorityIterator;
use super::region::WriteRegion;
use super::registry::{self, OFFSETS_PREFIX, VALUES_PREFIX};
use super::table::TableReader;

/// Summary of a freshly written generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationInfo {
    pub index: u64,
    pub entry_count: u64,
    pub values_bytes: u64,
    pub offsets_bytes: u64,
}

/// Manages the generations of one storage directory
///
/// ## Concurrency:
/// - Reads (`get`, `iterators`) take `&self` and only touch read-only
///   mappings, so any number may run at once.
/// - Mutations (`flush`, `compact`, `reload`, `close`) take `&mut self`;
///   the caller serializes them, typically behind a `RwLock`.
///
/// ## Lifecycle:
/// - After `close`, every read and write fails with `Closed`.
/// - After `compact`, every read and write fails with `ReloadRequired`.
/// - `reload` remaps the directory and clears both states.
pub struct StorageManager {
    /// Directory holding the generation files
    base_path: PathBuf,

    /// Ordering shared with every table reader
    comparator: SharedComparator,

    /// Mapped generations, ordered newest → oldest
    tables: Vec<TableReader>,

    /// Set by `close`, cleared by `reload`
    closed: bool,

    /// Set once compaction released the superseded mappings, cleared by `reload`
    pending_reload: bool,
}

impl StorageManager {
    /// Open the storage in `path`
    ///
    /// A missing directory is a store with no persisted data yet; it is
    /// created by the first flush.
    pub fn open(path: &Path, comparator: SharedComparator) -> Result<Self> {
        let tables = if path.exists() {
            Self::load_tables(path, &comparator)?
        } else {
            tracing::debug!(dir = %path.display(), "storage directory absent, starting empty");
            Vec::new()
        };

        Ok(Self {
            base_path: path.to_path_buf(),
            comparator,
            tables,
            closed: false,
            pending_reload: false,
        })
    }

    /// Get the entry for `key` (searches generations newest → oldest)
    ///
    /// Returns:
    /// - `Ok(Some(entry))`: found; `entry.value == None` is a tombstone
    /// - `Ok(None)`: no generation holds the key
    ///
    /// The first generation holding the key wins, tombstone or not.
    pub fn get(&self, key: &[u8]) -> Result<Option<Entry>> {
        self.ensure_usable()?;
        for table in &self.tables {
            if let Some(entry) = table.get(key)? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// One bounded iterator per generation, newest first
    ///
    /// Priority 1 is the newest generation. No merging happens here.
    pub fn iterators(
        &self,
        from: Option<&[u8]>,
        to: Option<&[u8]>,
    ) -> Result<Vec<PeekingPriorityIterator>> {
        self.ensure_usable()?;
        let mut iterators = Vec::with_capacity(self.tables.len());
        for (rank, table) in self.tables.iter().enumerate() {
            let iter = table.iter(from, to)?;
            iterators.push(PeekingPriorityIterator::from_table(iter, rank as u32 + 1));
        }
        Ok(iterators)
    }

    /// Write `source` out as a new generation
    ///
    /// Two passes: the first measures exact file sizes, the second writes
    /// into mappings of exactly that size. Returns `None` without touching
    /// the filesystem when the source is empty. The new generation is
    /// mapped and becomes the newest readable one.
    pub fn flush<S>(&mut self, source: &S) -> Result<Option<GenerationInfo>>
    where
        S: EntrySource + ?Sized,
    {
        self.ensure_usable()?;
        if source.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(&self.base_path)?;
        let index = registry::next_index(&self.base_path)?;
        let size = TableSize::measure(source.entries());

        tracing::debug!(
            generation = index,
            entries = size.entry_count,
            values_bytes = size.values_bytes,
            "flushing buffered entries"
        );

        let info = self.write_generation(index, source.entries().map(Ok), size)?;

        let reader = TableReader::open(
            index,
            &registry::values_path(&self.base_path, index),
            &registry::offsets_path(&self.base_path, index),
            self.comparator.clone(),
        )?;
        self.tables.insert(0, reader);

        tracing::info!(generation = index, entries = info.entry_count, "flush complete");
        Ok(Some(info))
    }

    /// Replace every current generation with the merged sequence `merged`
    ///
    /// `entry_count` and `payload_bytes` describe the not-yet-persisted part
    /// of the merge input. Files are sized for that plus every current
    /// generation (duplicates make this an upper bound) and truncated to the
    /// bytes actually written.
    ///
    /// Phases:
    /// 1. write the new generation
    /// 2. release the read mappings of the superseded generations
    /// 3. delete superseded files (best effort)
    ///
    /// The new generation is NOT readable afterwards: every operation other
    /// than [`reload`] fails with `ReloadRequired` until it runs.
    ///
    /// [`reload`]: StorageManager::reload
    pub fn compact<I>(&mut self, merged: I, entry_count: u64, payload_bytes: u64) -> Result<GenerationInfo>
    where
        I: IntoIterator<Item = Result<Entry>>,
    {
        self.ensure_usable()?;
        fs::create_dir_all(&self.base_path)?;
        let index = registry::next_index(&self.base_path)?;

        let mut bound = TableSize::from_totals(entry_count, payload_bytes);
        for table in &self.tables {
            bound.values_bytes += table.values_bytes();
            bound.offsets_bytes += table.offsets_bytes();
        }

        tracing::debug!(
            generation = index,
            values_capacity = bound.values_bytes,
            offsets_capacity = bound.offsets_bytes,
            "compacting {} generations",
            self.tables.len()
        );

        // Phase 1
        let info = self.write_generation(index, merged, bound)?;

        // Phase 2
        self.tables.clear();
        self.pending_reload = true;

        // Phase 3
        for prefix in [VALUES_PREFIX, OFFSETS_PREFIX] {
            if let Err(e) = registry::purge_older_than(&self.base_path, prefix, index) {
                tracing::warn!(
                    dir = %self.base_path.display(),
                    prefix,
                    "failed to purge superseded generations: {}",
                    e
                );
            }
        }

        tracing::info!(
            generation = index,
            entries = info.entry_count,
            values_bytes = info.values_bytes,
            "compaction complete"
        );
        Ok(info)
    }

    /// Rediscover and remap every generation in the directory
    ///
    /// Makes a compacted generation visible, and reopens a closed manager.
    pub fn reload(&mut self) -> Result<()> {
        let tables = Self::load_tables(&self.base_path, &self.comparator)?;
        tracing::debug!(generations = tables.len(), "remapped generations");
        self.tables = tables;
        self.closed = false;
        self.pending_reload = false;
        Ok(())
    }

    /// Release every read mapping. Idempotent.
    ///
    /// Iterators handed out earlier keep their own mappings alive until
    /// they are dropped.
    pub fn close(&mut self) {
        if !self.tables.is_empty() {
            tracing::debug!(generations = self.tables.len(), "releasing read mappings");
        }
        self.tables.clear();
        self.closed = true;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of mapped generations
    pub fn generation_count(&self) -> usize {
        self.tables.len()
    }

    /// Indices of mapped generations, newest first
    pub fn generations(&self) -> Vec<u64> {
        self.tables.iter().map(TableReader::generation).collect()
    }

    /// Mapped generations, newest first
    pub fn tables(&self) -> &[TableReader] {
        &self.tables
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn comparator(&self) -> &SharedComparator {
        &self.comparator
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a compaction is waiting for `reload`
    pub fn needs_reload(&self) -> bool {
        self.pending_reload
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn ensure_usable(&self) -> Result<()> {
        if self.closed {
            return Err(StrataError::Closed);
        }
        if self.pending_reload {
            return Err(StrataError::ReloadRequired);
        }
        Ok(())
    }

    /// Map every generation in `dir`, newest first
    fn load_tables(dir: &Path, comparator: &SharedComparator) -> Result<Vec<TableReader>> {
        let mut tables = Vec::new();
        for index in registry::discover(dir)?.into_iter().rev() {
            tables.push(TableReader::open(
                index,
                &registry::values_path(dir, index),
                &registry::offsets_path(dir, index),
                comparator.clone(),
            )?);
        }
        Ok(tables)
    }

    /// Write `entries` into generation `index` with the given capacities
    ///
    /// Each record is followed immediately by its offset slot. Both files
    /// are truncated to the bytes written and synced before returning; the
    /// write mappings never outlive this call.
    fn write_generation<I>(&self, index: u64, entries: I, capacity: TableSize) -> Result<GenerationInfo>
    where
        I: IntoIterator<Item = Result<Entry>>,
    {
        let mut values = WriteRegion::create(&registry::values_path(&self.base_path, index), capacity.values_bytes)?;
        let mut offsets = WriteRegion::create(&registry::offsets_path(&self.base_path, index), capacity.offsets_bytes)?;

        let mut value_cursor = 0u64;
        let mut offset_cursor = 0u64;
        let mut entry_count = 0u64;
        for entry in entries {
            let entry = entry?;
            let record_offset = value_cursor;
            value_cursor = codec::encode_record(&entry, &mut values, value_cursor)?;
            offset_cursor = codec::write_offset_entry(record_offset, &mut offsets, offset_cursor)?;
            entry_count += 1;
        }

        values.finish(value_cursor)?;
        offsets.finish(offset_cursor)?;

        Ok(GenerationInfo {
            index,
            entry_count,
            values_bytes: value_cursor,
            offsets_bytes: offset_cursor,
        })
    }
}

impl std::fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager")
            .field("base_path", &self.base_path)
            .field("generations", &self.generations())
            .field("closed", &self.closed)
            .field("pending_reload", &self.pending_reload)
            .finish()
    }
}
