//! Dataset utilities for generating corpora and evaluating recall.

use crate::distance::DistanceMetric;
use crate::error::Result;
use crate::index::brute_force::BruteForceIndex;
use crate::types::ItemId;
use crate::vector::VectorTable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Seeded table of `n` vectors with components uniform in [-1.0, 1.0).
///
/// # Panics
/// Panics if `dim` is zero.
pub fn random_table(n: usize, dim: usize, seed: u64) -> VectorTable {
    assert!(dim > 0, "dimension must be positive");
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f32> = (0..n * dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
    VectorTable::from_raw(dim, data)
}

/// A dataset containing vectors, queries, and ground truth for evaluation.
pub struct Dataset {
    pub vectors: VectorTable,
    pub queries: Vec<Vec<f32>>,
    pub ground_truth: Vec<Vec<ItemId>>,
}

impl Dataset {
    /// Generate a random synthetic dataset.
    ///
    /// Creates `n_vectors` random vectors and `n_queries` random query vectors,
    /// all with the specified dimensionality.
    pub fn generate(n_vectors: usize, n_queries: usize, dim: usize, seed: u64) -> Self {
        let vectors = random_table(n_vectors, dim, seed);
        let queries = random_table(n_queries, dim, seed.wrapping_add(1))
            .iter()
            .map(|(_, row)| row.to_vec())
            .collect();

        Self {
            vectors,
            queries,
            ground_truth: Vec::new(),
        }
    }

    /// Compute ground truth nearest neighbors using brute force search.
    ///
    /// For each query, finds the k nearest neighbors and stores their IDs.
    ///
    /// # Errors
    /// `EmptyIndex` for a dataset without vectors, `DimensionMismatch` for a
    /// query of the wrong length. On error the previous ground truth is kept.
    pub fn compute_ground_truth(&mut self, k: usize, metric: DistanceMetric) -> Result<()> {
        let index = BruteForceIndex::new(self.vectors.clone(), metric);
        self.ground_truth = self
            .queries
            .iter()
            .map(|query| {
                index
                    .search_parallel(query, k)
                    .map(|results| results.into_iter().map(|r| r.id).collect::<Vec<ItemId>>())
            })
            .collect::<Result<_>>()?;
        Ok(())
    }
}

/// Compute recall@k between predicted and ground truth results.
///
/// Recall is the fraction of true nearest neighbors that were found.
/// Returns a value between 0.0 and 1.0.
pub fn recall_at_k(predicted: &[ItemId], ground_truth: &[ItemId], k: usize) -> f32 {
    let pred_set: HashSet<ItemId> = predicted.iter().take(k).copied().collect();
    let truth_set: HashSet<ItemId> = ground_truth.iter().take(k).copied().collect();

    if truth_set.is_empty() {
        return 1.0;
    }
    let intersection = pred_set.intersection(&truth_set).count();
    intersection as f32 / truth_set.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GroveDbError;

    fn ids(raw: &[u32]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId).collect()
    }

    #[test]
    fn test_generate_dataset() {
        let dataset = Dataset::generate(1000, 100, 128, 7);
        assert_eq!(dataset.vectors.len(), 1000);
        assert_eq!(dataset.queries.len(), 100);
        assert_eq!(dataset.vectors.dim(), 128);
        assert_eq!(dataset.queries[0].len(), 128);
    }

    #[test]
    fn test_random_table_is_seeded() {
        assert_eq!(random_table(10, 4, 3), random_table(10, 4, 3));
        assert_ne!(random_table(10, 4, 3), random_table(10, 4, 4));
    }

    #[test]
    fn test_ground_truth() {
        let mut dataset = Dataset::generate(200, 5, 16, 11);
        dataset.compute_ground_truth(10, DistanceMetric::Angular).unwrap();
        assert_eq!(dataset.ground_truth.len(), 5);
        assert!(dataset.ground_truth.iter().all(|gt| gt.len() == 10));
    }

    #[test]
    fn test_ground_truth_rejects_bad_query() {
        let mut dataset = Dataset::generate(50, 3, 8, 12);
        dataset.queries.push(vec![0.5; 4]);
        let err = dataset
            .compute_ground_truth(5, DistanceMetric::Angular)
            .unwrap_err();
        assert!(matches!(
            err,
            GroveDbError::DimensionMismatch {
                expected: 8,
                actual: 4
            }
        ));
        assert!(dataset.ground_truth.is_empty());
    }

    #[test]
    fn test_ground_truth_needs_vectors() {
        let mut dataset = Dataset::generate(0, 2, 8, 13);
        assert!(matches!(
            dataset.compute_ground_truth(5, DistanceMetric::Angular),
            Err(GroveDbError::EmptyIndex)
        ));
    }

    #[test]
    fn test_recall_perfect() {
        assert_eq!(recall_at_k(&ids(&[1, 2, 3, 4, 5]), &ids(&[1, 2, 3, 4, 5]), 5), 1.0);
    }

    #[test]
    fn test_recall_partial() {
        assert_eq!(recall_at_k(&ids(&[1, 2, 6, 7, 8]), &ids(&[1, 2, 3, 4, 5]), 5), 0.4);
    }

    #[test]
    fn test_recall_short_prediction() {
        // Fewer predictions than k still count against recall.
        assert_eq!(recall_at_k(&ids(&[1]), &ids(&[1, 2]), 2), 0.5);
    }

    #[test]
    fn test_recall_none() {
        assert_eq!(recall_at_k(&ids(&[6, 7, 8, 9, 10]), &ids(&[1, 2, 3, 4, 5]), 5), 0.0);
    }
}
