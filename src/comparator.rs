//! Key ordering
//!
//! One comparator instance is shared by binary search, iterator bound
//! checks and the merge engine so that lookup and iteration never disagree
//! on ordering.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

/// Total order over byte-sequence keys
///
/// Implementations must be deterministic, consistent and transitive.
pub trait KeyComparator: Debug + Send + Sync {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Comparator handle shared between every component that orders keys
pub type SharedComparator = Arc<dyn KeyComparator>;

/// Unsigned byte-wise lexicographic order (shorter prefix sorts first)
#[derive(Debug, Default, Clone, Copy)]
pub struct Lexicographic;

impl KeyComparator for Lexicographic {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

/// The default comparator used when none is configured
pub fn lexicographic() -> SharedComparator {
    Arc::new(Lexicographic)
}
