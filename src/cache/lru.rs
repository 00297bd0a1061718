//! LRU Victim Selection Module
//!
//! Picks the least recently touched entries across all shards when the cache
//! has to be pruned.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

// == Victim ==
/// An eviction candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Victim {
    /// Recency stamp at the time the candidate was collected
    pub(crate) touched: u64,
    /// Index of the shard holding the key
    pub(crate) shard: usize,
    /// The cache key
    pub(crate) key: String,
}

impl Ord for Victim {
    fn cmp(&self, other: &Self) -> Ordering {
        self.touched
            .cmp(&other.touched)
            .then_with(|| self.shard.cmp(&other.shard))
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl PartialOrd for Victim {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// == LRU Candidates ==
/// Bounded collection keeping the `limit` oldest candidates offered to it.
///
/// Backed by a max-heap so the newest retained candidate is the one that
/// gets replaced when an older one shows up.
#[derive(Debug)]
pub(crate) struct LruCandidates {
    limit: usize,
    heap: BinaryHeap<Victim>,
}

impl LruCandidates {
    // == Constructor ==
    /// Creates a collector retaining at most `limit` candidates.
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit,
            heap: BinaryHeap::with_capacity(limit.saturating_add(1).min(4096)),
        }
    }

    // == Offer ==
    /// Considers a candidate, keeping it only if it is among the oldest seen.
    ///
    /// The key is only cloned when the candidate is retained.
    pub(crate) fn offer(&mut self, touched: u64, shard: usize, key: &str) {
        if self.limit == 0 {
            return;
        }

        if self.heap.len() < self.limit {
            self.heap.push(Victim {
                touched,
                shard,
                key: key.to_string(),
            });
            return;
        }

        let newest_kept = self.heap.peek().map(|victim| victim.touched);
        if matches!(newest_kept, Some(newest) if touched < newest) {
            self.heap.pop();
            self.heap.push(Victim {
                touched,
                shard,
                key: key.to_string(),
            });
        }
    }

    // == Into Victims ==
    /// Returns the retained candidates, oldest first.
    pub(crate) fn into_victims(self) -> Vec<Victim> {
        self.heap.into_sorted_vec()
    }

    // == Is Empty ==
    /// Returns true if no candidate was retained.
    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
