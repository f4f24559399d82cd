//! Configuration for Strata
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::comparator::{self, SharedComparator};

/// Main configuration for a Strata instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding every generation of the store.
    /// Internal structure (no sub-directories):
    ///   {base_path}/
    ///     ├── values0, offsets0
    ///     ├── values1, offsets1
    ///     └── ...
    pub base_path: PathBuf,

    /// Key ordering shared by lookups, iterators and merges
    pub comparator: SharedComparator,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Approximate memtable size (in bytes) that triggers a flush.
    /// Zero disables automatic flushing.
    pub flush_threshold_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./strata_data"),
            comparator: comparator::lexicographic(),
            flush_threshold_bytes: 1024 * 1024, // 1 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage directory
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_path = path.into();
        self
    }

    /// Set the key comparator
    pub fn comparator(mut self, comparator: SharedComparator) -> Self {
        self.config.comparator = comparator;
        self
    }

    /// Set the memtable flush threshold (in bytes, 0 = never auto-flush)
    pub fn flush_threshold_bytes(mut self, size: usize) -> Self {
        self.config.flush_threshold_bytes = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
