//! Merge engine
//!
//! Combines several sorted, priority-ranked streams into one ascending,
//! duplicate-free stream. For a key present in several inputs, the input
//! with the lowest priority value (the newest) wins. Tombstones pass through.

use std::cmp::Ordering;

use crate::comparator::SharedComparator;
use crate::entry::Entry;
use crate::error::Result;
use crate::storage::PeekingPriorityIterator;

/// K-way merge over [`PeekingPriorityIterator`]s
///
/// Linear scan per step; meant for the handful of inputs a store has.
pub struct MergeIterator {
    inputs: Vec<PeekingPriorityIterator>,
    comparator: SharedComparator,
    failed: bool,
}

impl MergeIterator {
    pub fn new(inputs: Vec<PeekingPriorityIterator>, comparator: SharedComparator) -> Self {
        Self {
            inputs,
            comparator,
            failed: false,
        }
    }

    /// Index of the input holding the smallest next key, ties broken by
    /// priority. An input whose next item is an error is returned at once.
    fn select(&mut self) -> Option<usize> {
        for input in &mut self.inputs {
            input.peek();
        }

        let mut best: Option<(usize, &[u8])> = None;
        for (i, input) in self.inputs.iter().enumerate() {
            let key = match input.peeked() {
                None => continue,
                Some(Err(_)) => return Some(i),
                Some(Ok(entry)) => &entry.key[..],
            };

            let better = match best {
                None => true,
                Some((b, best_key)) => match self.comparator.compare(key, best_key) {
                    Ordering::Less => true,
                    Ordering::Equal => input.priority() < self.inputs[b].priority(),
                    Ordering::Greater => false,
                },
            };
            if better {
                best = Some((i, key));
            }
        }

        best.map(|(i, _)| i)
    }

    /// Advance every input whose next key equals `key`
    fn skip_key(&mut self, key: &[u8]) {
        for input in &mut self.inputs {
            while let Some(next) = input.peek_key() {
                if self.comparator.compare(next, key) != Ordering::Equal {
                    break;
                }
                input.next();
            }
        }
    }
}

impl Iterator for MergeIterator {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let winner = self.select()?;
        match self.inputs[winner].next()? {
            Ok(entry) => {
                self.skip_key(&entry.key);
                Some(Ok(entry))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for MergeIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeIterator")
            .field("inputs", &self.inputs.len())
            .field("failed", &self.failed)
            .finish()
    }
}
