//! # Strata
//!
//! The on-disk half of an LSM key-value store:
//! - Immutable, sorted generations stored as memory-mapped file pairs
//! - Binary-search point lookups and bounded range iterators
//! - Flush of buffered writes into a new generation
//! - Compaction of every generation into one, newest value wins
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                              │
//! │            (Single Writer / Multi Reader)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌────────────────┐
//!   │  MemTable   │          │ StorageManager │
//!   │  (RwLock)   │          │ (generations)  │
//!   └──────┬──────┘          └───────┬────────┘
//!          │                         │ newest → oldest
//!          │                         ▼
//!          │        ┌──────────┬──────────┬──────────┐
//!          │        │ values2  │ values1  │ values0  │
//!          │        │ offsets2 │ offsets1 │ offsets0 │
//!          │        └────┬─────┴────┬─────┴────┬─────┘
//!          ▼             ▼          ▼          ▼
//!   ┌─────────────────────────────────────────────┐
//!   │      MergeIterator (priority 0, 1, 2, 3)    │
//!   └─────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod comparator;
pub mod entry;
pub mod memtable;
pub mod merge;
pub mod storage;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use comparator::{KeyComparator, Lexicographic, SharedComparator};
pub use config::Config;
pub use engine::Engine;
pub use entry::{Entry, EntrySource};
pub use error::{Result, StrataError};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
