//! Brute force index for exact nearest neighbor search.
//!
//! This implementation serves as the ground truth baseline for the forest.
//! It computes distances to all vectors and returns the k closest.

use crate::constants::cache::BRUTE_FORCE_CHUNK_SIZE;
use crate::distance::DistanceMetric;
use crate::error::{GroveDbError, Result};
use crate::types::ItemId;
use crate::vector::VectorTable;
use rayon::prelude::*;

use super::traits::{top_k, SearchResult, VectorIndex};

/// Brute force index that performs exact nearest neighbor search.
///
/// This index computes distances to all stored vectors for each query,
/// guaranteeing 100% recall at the cost of O(n) search time.
pub struct BruteForceIndex {
    vectors: VectorTable,
    metric: DistanceMetric,
}

impl BruteForceIndex {
    /// Create a brute force index over `vectors`.
    pub fn new(vectors: VectorTable, metric: DistanceMetric) -> Self {
        Self { vectors, metric }
    }

    /// Return the number of vectors in the index.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Return true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    fn check_query(&self, query: &[f32]) -> Result<()> {
        if self.vectors.is_empty() {
            return Err(GroveDbError::EmptyIndex);
        }
        if query.len() != self.vectors.dim() {
            return Err(GroveDbError::dimension_mismatch(
                self.vectors.dim(),
                query.len(),
            ));
        }
        Ok(())
    }

    /// Search for the k nearest neighbors using a linear scan.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.check_query(query)?;
        let scored = self
            .vectors
            .iter()
            .map(|(id, row)| SearchResult::new(id, self.metric.compute(query, row)));
        Ok(top_k(scored, k))
    }

    /// Parallel search using Rayon for multi-core scaling.
    ///
    /// Divides the table into chunks, keeps the best k of each chunk in
    /// parallel, then merges. Returns exactly what [`search`](Self::search)
    /// returns.
    pub fn search_parallel(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.check_query(query)?;
        let dim = self.vectors.dim();

        let partial: Vec<Vec<SearchResult>> = self
            .vectors
            .as_slice()
            .par_chunks(BRUTE_FORCE_CHUNK_SIZE * dim)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                let base = chunk_index * BRUTE_FORCE_CHUNK_SIZE;
                let scored = chunk.chunks_exact(dim).enumerate().map(|(offset, row)| {
                    SearchResult::new(
                        ItemId((base + offset) as u32),
                        self.metric.compute(query, row),
                    )
                });
                top_k(scored, k)
            })
            .collect();

        Ok(top_k(partial.into_iter().flatten(), k))
    }

    /// Batch search for multiple queries in parallel.
    pub fn batch_search<Q>(&self, queries: &[Q], k: usize) -> Result<Vec<Vec<SearchResult>>>
    where
        Q: AsRef<[f32]> + Sync,
    {
        queries
            .par_iter()
            .map(|query| self.search(query.as_ref(), k))
            .collect()
    }
}

impl VectorIndex for BruteForceIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        BruteForceIndex::search(self, query, k)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimension(&self) -> usize {
        self.vectors.dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::random_table;

    #[test]
    fn test_basic_search() {
        let index = BruteForceIndex::new(random_table(100, 128, 1), DistanceMetric::Euclidean);
        let query = random_table(1, 128, 2).row(ItemId(0)).to_vec();
        let results = index.search(&query, 10).unwrap();

        assert_eq!(results.len(), 10);
        for pair in results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_search_variants_consistency() {
        let index = BruteForceIndex::new(random_table(5000, 32, 3), DistanceMetric::Angular);
        let query = random_table(1, 32, 4).row(ItemId(0)).to_vec();

        let basic = index.search(&query, 10).unwrap();
        let parallel = index.search_parallel(&query, 10).unwrap();
        assert_eq!(basic, parallel);
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = BruteForceIndex::new(random_table(10, 8, 5), DistanceMetric::Angular);
        assert!(matches!(
            index.search(&[1.0; 3], 1),
            Err(GroveDbError::DimensionMismatch { .. })
        ));
    }
}
