//! Storage Module
//!
//! Persistent storage layer: a directory of immutable, memory-mapped
//! generations.
//!
//! ## Responsibilities
//! - Persist buffered writes as new sorted generations (flush)
//! - Point lookups and range scans across generations, newest wins
//! - Merge all generations into one (compaction)
//!
//! ## File Format
//! ```text
//! values<N>
//! ┌────────────────┬─────┬──────────────────────┬─────────┐
//! │ KeyLen u64 (8) │ Key │ ValLen i64 (8)       │  Value  │
//! └────────────────┴─────┴──────────────────────┴─────────┘
//! ... one record per entry, ascending key order ...
//! (ValLen = -1 means tombstone, no value bytes)
//!
//! offsets<N>
//! ┌──────────────┬──────────────┬─────┐
//! │ Offset0 u64  │ Offset1 u64  │ ... │   entry count = file size / 8
//! └──────────────┴──────────────┴─────┘
//! ```
//! All integers are little-endian.

pub mod codec;
pub mod registry;
pub mod region;

mod manager;
mod priority;
mod table;

pub use manager::{GenerationInfo, StorageManager};
pub use priority::{EntryStream, PeekingPriorityIterator};
pub use table::{TableIterator, TableReader};
