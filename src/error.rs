//! Error types for Strata
//!
//! Provides a unified error type for all storage operations.
//! A missing key is not an error: lookups return `Option`.

use thiserror::Error;

/// Result type alias using StrataError
pub type Result<T> = std::result::Result<T, StrataError>;

/// Unified error type for Strata operations
#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// File creation, mapping, truncation or deletion failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Layout / Format Errors
    // -------------------------------------------------------------------------
    /// The storage directory holds values/offsets files that do not pair up
    #[error("Directory layout error: {0}")]
    DirectoryLayout(String),

    /// A length field would read outside the mapped region
    #[error("Corrupt table format at byte {offset}: {reason}")]
    CorruptFormat { offset: u64, reason: String },

    /// A write would run past the end of a pre-sized write region
    #[error("Write region exhausted: needed {needed} bytes, capacity {capacity}")]
    CapacityExceeded { needed: u64, capacity: u64 },

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    /// The store was closed; no further reads or writes are accepted
    #[error("Storage is closed")]
    Closed,

    /// A compaction replaced the generation set; `reload` must run before
    /// the store is used again
    #[error("Generation set changed by compaction, reload required")]
    ReloadRequired,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StrataError {
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        StrataError::CorruptFormat {
            offset,
            reason: reason.into(),
        }
    }
}
