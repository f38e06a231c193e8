//! Common traits for vector index implementations.
//!
//! The forest and the exact baseline answer the same queries; these traits
//! let evaluation code treat them interchangeably.

use crate::error::Result;
use crate::types::ItemId;
use std::cmp::Ordering;

/// A search result containing an item ID and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// The ID of the matched item.
    pub id: ItemId,
    /// The distance from the query vector.
    pub distance: f32,
}

impl SearchResult {
    /// Create a new SearchResult.
    #[inline]
    pub fn new(id: impl Into<ItemId>, distance: f32) -> Self {
        Self {
            id: id.into(),
            distance,
        }
    }

    /// Convert to a raw (u32, f32) tuple.
    #[inline]
    pub fn to_tuple(self) -> (u32, f32) {
        (self.id.0, self.distance)
    }

    /// Result order: ascending distance, then ascending id.
    #[inline]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

impl From<SearchResult> for (u32, f32) {
    fn from(result: SearchResult) -> Self {
        result.to_tuple()
    }
}

/// Heap entry ordered by [`SearchResult::rank_cmp`].
///
/// `BinaryHeap` is a max-heap, so `peek()` yields the current worst of the
/// k best, which is what a bounded top-k scan compares against.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Ranked(pub SearchResult);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank_cmp(&other.0)
    }
}

/// Keep the `k` best results from `results`, sorted best first.
pub(crate) fn top_k(results: impl IntoIterator<Item = SearchResult>, k: usize) -> Vec<SearchResult> {
    use std::collections::BinaryHeap;

    if k == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Ranked> = BinaryHeap::with_capacity(k + 1);
    for result in results {
        let candidate = Ranked(result);
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
}

/// Common interface for indices that answer k-nearest-neighbor queries.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; search takes `&self` and never
/// mutates the index, so any number of threads may query concurrently.
pub trait VectorIndex: Send + Sync {
    /// Search for the k nearest neighbors to the query vector.
    ///
    /// Returns at most `k` results sorted by distance (closest first), with
    /// ties broken by ascending item id.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Return the number of vectors in the index.
    fn len(&self) -> usize;

    /// Return true if the index contains no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the dimensionality of vectors in this index.
    fn dimension(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_result() {
        let result = SearchResult::new(42u32, 0.5);
        assert_eq!(result.id, ItemId(42));
        assert_eq!(result.to_tuple(), (42, 0.5));
    }

    #[test]
    fn test_top_k_orders_and_truncates() {
        let results = vec![
            SearchResult::new(3u32, 0.9),
            SearchResult::new(1u32, 0.1),
            SearchResult::new(2u32, 0.5),
            SearchResult::new(0u32, 0.7),
        ];
        let best = top_k(results, 2);
        let ids: Vec<u32> = best.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_top_k_breaks_ties_by_id() {
        let results = vec![
            SearchResult::new(7u32, 0.25),
            SearchResult::new(2u32, 0.25),
            SearchResult::new(5u32, 0.25),
        ];
        let ids: Vec<u32> = top_k(results, 3).iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![2, 5, 7]);
    }

    #[test]
    fn test_top_k_zero_and_short_input() {
        assert!(top_k(vec![SearchResult::new(0u32, 1.0)], 0).is_empty());
        assert_eq!(top_k(vec![SearchResult::new(0u32, 1.0)], 5).len(), 1);
    }
}
