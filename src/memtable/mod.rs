//! MemTable Module
//!
//! In-memory buffer for recent writes, flushed into a new generation.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track size for flush triggers
//! - Ordered, restartable iteration for flushes and merges
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock:
//! - Ordered keys (byte-lexicographic), required for generation files
//! - A deleted key stays in the map as a tombstone (`None` value)

mod table;

pub use table::MemTable;
