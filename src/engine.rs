//! Engine Module
//!
//! The store façade that coordinates the memtable and the generations.
//!
//! ## Responsibilities
//! - Route reads through memtable, then generations newest → oldest
//! - Buffer writes in the memtable and flush when it grows too large
//! - Merge memtable and generations for range scans and compaction
//! - Serialize every operation that changes the generation set

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::entry::Entry;
use crate::error::{Result, StrataError};
use crate::memtable::MemTable;
use crate::merge::MergeIterator;
use crate::storage::{GenerationInfo, PeekingPriorityIterator, StorageManager};

/// Priority of the memtable in merges; generations start at 1
const MEMTABLE_PRIORITY: u32 = 0;

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (upsert/remove/flush/compact/close): serialized by `write_lock`
///   - Only ONE write operation at a time
///   - Lock order: write_lock → storage (write)
///
/// - **Reads** (get/range): fully concurrent
///   - MemTable uses an internal RwLock
///   - Generations are read-only mappings behind `storage.read()`
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Mapped generations; mutated only with `write_lock` held
    storage: RwLock<StorageManager>,

    /// Serializes write operations
    write_lock: Mutex<()>,

    /// Set once `close` has completed
    closed: AtomicBool,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// The storage directory is not created until the first flush.
    pub fn open(config: Config) -> Result<Self> {
        if config.base_path.as_os_str().is_empty() {
            return Err(StrataError::Config("base_path must not be empty".to_string()));
        }

        let storage = StorageManager::open(&config.base_path, config.comparator.clone())?;
        tracing::debug!(
            dir = %config.base_path.display(),
            generations = storage.generation_count(),
            "engine opened"
        );

        Ok(Self {
            config,
            memtable: MemTable::new(),
            storage: RwLock::new(storage),
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified storage directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().base_path(path).build())
    }

    /// Get a live value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. Generations (newest to oldest)
    ///
    /// A tombstone anywhere along that order reads as `None`.
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        Ok(self.get_entry(key)?.and_then(|entry| entry.value))
    }

    /// Get the newest entry for `key`, tombstones included
    pub fn get_entry(&self, key: &[u8]) -> Result<Option<Entry>> {
        self.ensure_open()?;
        if let Some(entry) = self.memtable.get(key) {
            return Ok(Some(entry));
        }
        self.storage.read().get(key)
    }

    /// Put a key-value pair
    pub fn upsert(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<()> {
        self.write(Entry::new(key, value))
    }

    /// Delete a key (writes a tombstone)
    pub fn remove(&self, key: impl Into<Bytes>) -> Result<()> {
        self.write(Entry::tombstone(key))
    }

    /// Live entries with key in `[from, to)`, ascending
    ///
    /// `None` leaves that side unbounded.
    pub fn range(&self, from: Option<&[u8]>, to: Option<&[u8]>) -> Result<Vec<Entry>> {
        self.ensure_open()?;
        let storage = self.storage.read();
        let mut inputs = vec![PeekingPriorityIterator::from_entries(
            self.memtable.range(from, to),
            MEMTABLE_PRIORITY,
        )];
        inputs.extend(storage.iterators(from, to)?);

        let mut live = Vec::new();
        for entry in MergeIterator::new(inputs, self.config.comparator.clone()) {
            let entry = entry?;
            if !entry.is_tombstone() {
                live.push(entry);
            }
        }
        Ok(live)
    }

    /// Flush memtable to a new generation (public API)
    ///
    /// Forces a flush regardless of memtable size
    pub fn flush(&self) -> Result<Option<GenerationInfo>> {
        let _write_guard = self.write_lock.lock();
        self.ensure_open()?;
        self.flush_internal()
    }

    /// Merge the memtable and every generation into a single generation
    ///
    /// The result is the oldest data left, so tombstones are dropped. The
    /// new generation is remapped before returning, then the memtable is
    /// cleared. Returns `None` when there is nothing to compact.
    pub fn compact(&self) -> Result<Option<GenerationInfo>> {
        let _write_guard = self.write_lock.lock();
        self.ensure_open()?;
        let mut storage = self.storage.write();

        if storage.generation_count() == 0 && self.memtable.is_empty() {
            return Ok(None);
        }

        let mut inputs = vec![PeekingPriorityIterator::from_entries(
            self.memtable.iter(),
            MEMTABLE_PRIORITY,
        )];
        inputs.extend(storage.iterators(None, None)?);
        let merged = MergeIterator::new(inputs, self.config.comparator.clone())
            .filter(|entry| !matches!(entry, Ok(entry) if entry.is_tombstone()));

        let info = storage.compact(
            merged,
            self.memtable.entry_count() as u64,
            self.memtable.size() as u64,
        )?;

        // The compacted generation only becomes readable once remapped
        storage.reload()?;
        self.memtable.clear();

        Ok(Some(info))
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data and releases every mapping. Calling it again
    /// is a no-op; every other operation fails with `Closed` afterwards.
    pub fn close(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }

        self.flush_internal()?;
        self.storage.write().close();
        self.closed.store(true, Ordering::Release);
        tracing::debug!(dir = %self.config.base_path.display(), "engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the storage directory path
    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of mapped generations
    pub fn generation_count(&self) -> usize {
        self.storage.read().generation_count()
    }

    /// Get the mapped generation indices, newest first
    pub fn generations(&self) -> Vec<u64> {
        self.storage.read().generations()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StrataError::Closed);
        }
        Ok(())
    }

    fn write(&self, entry: Entry) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.ensure_open()?;
        self.memtable.upsert(entry);

        if self.memtable.should_flush(self.config.flush_threshold_bytes) {
            self.flush_internal()?;
        }
        Ok(())
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self) -> Result<Option<GenerationInfo>> {
        if self.memtable.is_empty() {
            return Ok(None);
        }

        let info = self.storage.write().flush(&self.memtable)?;
        self.memtable.clear();
        Ok(info)
    }
}
