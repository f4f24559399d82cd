//! Table Module
//!
//! Read side of one generation: a values file plus an offsets file, both
//! memory-mapped read-only.
//!
//! ## Lookup
//! ```text
//!   offsets: [ o0 | o1 | o2 | ... | oN-1 ]      (u64 each)
//!               │    │
//!               ▼    ▼
//!   values:  [rec0][rec1][rec2] ...             (ascending keys)
//! ```
//! Binary search runs over logical indices `[0, N)`: each probe reads
//! `offsets[mid]` and decodes only the key at that position.

mod iterator;
mod reader;

pub use iterator::TableIterator;
pub use reader::TableReader;
