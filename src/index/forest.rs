//! Random-projection forest for approximate nearest neighbor search.
//!
//! Trees are built independently over the full id set, each with its own
//! seeded generator, and collected once all are finished. A query descends
//! every tree to exactly one leaf (no backtracking), unions the leaf contents,
//! and re-ranks that candidate set with exact distances against the stored
//! vectors. Fewer than `k` results is a normal outcome for small corpora.

use crate::constants::forest::TREE_SEED_STRIDE;
use crate::distance::DistanceMetric;
use crate::error::{GroveDbError, Result};
use crate::metrics::{ForestStatistics, SearchStatistics, SearchStatsBuilder};
use crate::types::ItemId;
use crate::vector::VectorTable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

use super::builder::ForestConfig;
use super::traits::{top_k, SearchResult, VectorIndex};
use super::tree::PartitionTree;

/// Seed of tree `tree` in a build seeded with `seed`.
#[inline]
pub(crate) fn tree_seed(seed: u64, tree: usize) -> u64 {
    seed.wrapping_add((tree as u64).wrapping_mul(TREE_SEED_STRIDE))
}

/// An immutable forest of partition trees plus the vectors they index.
///
/// The index is `Send + Sync` and never mutated after construction, so it can
/// be shared across threads (e.g. behind an `Arc`) and queried concurrently.
#[derive(Clone, Debug, PartialEq)]
pub struct ForestIndex {
    vectors: VectorTable,
    trees: Vec<PartitionTree>,
    metric: DistanceMetric,
    leaf_capacity: usize,
}

impl ForestIndex {
    /// Build a forest over `vectors`.
    ///
    /// # Errors
    /// `InvalidParameter` for a zero tree count or leaf capacity,
    /// `EmptyCorpus` if the table has no rows.
    pub fn build(vectors: VectorTable, config: &ForestConfig) -> Result<Self> {
        config.validate()?;
        if vectors.is_empty() {
            return Err(GroveDbError::EmptyCorpus);
        }

        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let start = Instant::now();

        let trees: Vec<PartitionTree> = (0..config.tree_count)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(tree_seed(seed, t));
                let tree = PartitionTree::build(
                    &vectors,
                    vectors.ids().collect(),
                    config.metric,
                    config.leaf_capacity,
                    &mut rng,
                );
                debug!(
                    tree = t,
                    nodes = tree.node_count(),
                    depth = tree.depth(),
                    "partition tree built"
                );
                tree
            })
            .collect();

        info!(
            items = vectors.len(),
            dimension = vectors.dim(),
            trees = trees.len(),
            leaf_capacity = config.leaf_capacity,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "forest built"
        );

        Ok(Self {
            vectors,
            trees,
            metric: config.metric,
            leaf_capacity: config.leaf_capacity,
        })
    }

    /// Assemble an index from already validated parts.
    pub(crate) fn from_parts(
        vectors: VectorTable,
        trees: Vec<PartitionTree>,
        metric: DistanceMetric,
        leaf_capacity: usize,
    ) -> Self {
        Self {
            vectors,
            trees,
            metric,
            leaf_capacity,
        }
    }

    /// Search for the k nearest neighbors.
    ///
    /// # Returns
    /// At most `k` `(id, distance)` results, ascending by distance and then
    /// by id. The result is shorter than `k` when the forest surfaces fewer
    /// distinct candidates.
    ///
    /// # Errors
    /// `EmptyIndex` for a forest with no trees or no items,
    /// `DimensionMismatch` if `query.len()` differs from the index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.search_inner(query, k, None)
    }

    /// Search and report what the query cost.
    pub fn search_with_stats(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<(Vec<SearchResult>, SearchStatistics)> {
        let start = Instant::now();
        let mut stats = SearchStatsBuilder::new();
        let results = self.search_inner(query, k, Some(&mut stats))?;
        stats.set_query_time(start.elapsed());
        Ok((results, stats.build()))
    }

    /// Batch search for multiple queries in parallel.
    ///
    /// Results are returned in the same order as the queries. The first
    /// failing query aborts the batch.
    pub fn batch_search<Q>(&self, queries: &[Q], k: usize) -> Result<Vec<Vec<SearchResult>>>
    where
        Q: AsRef<[f32]> + Sync,
    {
        queries
            .par_iter()
            .map(|query| self.search(query.as_ref(), k))
            .collect()
    }

    /// Distinct candidate ids the forest surfaces for `query`, ascending.
    pub fn candidates(&self, query: &[f32]) -> Result<Vec<ItemId>> {
        self.check_query(query)?;
        Ok(self.collect_candidates(query, None))
    }

    fn search_inner(
        &self,
        query: &[f32],
        k: usize,
        mut stats: Option<&mut SearchStatsBuilder>,
    ) -> Result<Vec<SearchResult>> {
        self.check_query(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let candidates = self.collect_candidates(query, stats.as_deref_mut());
        if let Some(stats) = stats {
            stats.unique_candidates(candidates.len());
            stats.add_distances(candidates.len());
        }

        let scored = candidates.iter().map(|&id| {
            SearchResult::new(id, self.metric.compute(query, self.vectors.row(id)))
        });
        let results = top_k(scored, k);

        debug!(
            candidates = candidates.len(),
            returned = results.len(),
            k,
            "forest query"
        );
        Ok(results)
    }

    fn check_query(&self, query: &[f32]) -> Result<()> {
        if self.trees.is_empty() || self.vectors.is_empty() {
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

    /// One leaf per tree, merged and deduplicated.
    fn collect_candidates(
        &self,
        query: &[f32],
        mut stats: Option<&mut SearchStatsBuilder>,
    ) -> Vec<ItemId> {
        let mut candidates = Vec::new();
        for tree in &self.trees {
            let leaf = tree.descend(self.metric, query);
            if let Some(stats) = stats.as_deref_mut() {
                stats.add_leaf(leaf.len());
            }
            candidates.extend_from_slice(leaf);
        }
        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }

    /// Shape of the forest.
    pub fn statistics(&self) -> ForestStatistics {
        let mut stats = ForestStatistics {
            num_items: self.vectors.len(),
            dimension: self.vectors.dim(),
            num_trees: self.trees.len(),
            leaf_size_min: usize::MAX,
            memory_bytes: self.memory_bytes(),
            ..ForestStatistics::default()
        };

        let mut leaf_items = 0usize;
        for tree in &self.trees {
            stats.total_nodes += tree.node_count();
            stats.max_depth = stats.max_depth.max(tree.depth());
            for size in tree.leaf_sizes() {
                stats.total_leaves += 1;
                leaf_items += size;
                stats.leaf_size_min = stats.leaf_size_min.min(size);
                stats.leaf_size_max = stats.leaf_size_max.max(size);
            }
        }

        if stats.total_leaves == 0 {
            stats.leaf_size_min = 0;
        } else {
            stats.leaf_size_mean = leaf_items as f32 / stats.total_leaves as f32;
        }
        stats
    }

    /// Estimated heap bytes held by the index.
    pub fn memory_bytes(&self) -> usize {
        self.vectors.memory_bytes() + self.trees.iter().map(|t| t.memory_bytes()).sum::<usize>()
    }

    /// The stored vectors.
    pub fn vectors(&self) -> &VectorTable {
        &self.vectors
    }

    /// The trees, in build order.
    pub fn trees(&self) -> &[PartitionTree] {
        &self.trees
    }

    /// Number of trees.
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Leaf capacity the forest was built with.
    pub fn leaf_capacity(&self) -> usize {
        self.leaf_capacity
    }

    /// Distance metric used for splitting and re-ranking.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Return the number of vectors in the index.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Return true if the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Return the vector dimension.
    pub fn dimension(&self) -> usize {
        self.vectors.dim()
    }
}

impl VectorIndex for ForestIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        ForestIndex::search(self, query, k)
    }

    fn len(&self) -> usize {
        ForestIndex::len(self)
    }

    fn dimension(&self) -> usize {
        ForestIndex::dimension(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::random_table;

    fn forest(table: VectorTable, trees: usize, leaf: usize, seed: u64) -> ForestIndex {
        let config = ForestConfig {
            seed: Some(seed),
            ..ForestConfig::new(trees, leaf)
        };
        ForestIndex::build(table, &config).unwrap()
    }

    #[test]
    fn test_forest_basic() {
        let index = forest(random_table(1000, 32, 1), 8, 16, 2);
        assert_eq!(index.tree_count(), 8);
        assert_eq!(index.len(), 1000);
        assert_eq!(index.dimension(), 32);
        for tree in index.trees() {
            tree.validate(32, 1000).unwrap();
        }
    }

    #[test]
    fn test_forest_search_sorted() {
        let table = random_table(2000, 64, 3);
        let query = table.row(ItemId(17)).to_vec();
        let index = forest(table, 10, 32, 4);

        let results = index.search(&query, 10).unwrap();
        assert!(!results.is_empty() && results.len() <= 10);
        assert_eq!(results[0].id, ItemId(17));
        assert_eq!(results[0].distance, 0.0);
        for pair in results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_trees_differ() {
        let index = forest(random_table(500, 16, 5), 4, 8, 6);
        assert_ne!(index.trees()[0], index.trees()[1]);
    }

    #[test]
    fn test_seeded_build_is_reproducible() {
        let a = forest(random_table(800, 16, 7), 6, 10, 99);
        let b = forest(random_table(800, 16, 7), 6, 10, 99);
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_leaf_is_exact_rerank() {
        let table = random_table(200, 8, 8);
        let query: Vec<f32> = random_table(1, 8, 9).row(ItemId(0)).to_vec();

        let mut exact: Vec<SearchResult> = table
            .iter()
            .map(|(id, row)| SearchResult::new(id, DistanceMetric::Angular.compute(&query, row)))
            .collect();
        exact.sort_by(|a, b| a.rank_cmp(b));
        exact.truncate(15);

        let index = forest(table, 1, 200, 10);
        assert_eq!(index.trees()[0].node_count(), 1);
        assert_eq!(index.search(&query, 15).unwrap(), exact);
    }

    #[test]
    fn test_k_zero_and_large_k() {
        let index = forest(random_table(50, 4, 11), 3, 4, 12);
        let query = vec![0.1, 0.2, 0.3, 0.4];
        assert!(index.search(&query, 0).unwrap().is_empty());

        let candidates = index.candidates(&query).unwrap();
        let all = index.search(&query, 1000).unwrap();
        assert_eq!(all.len(), candidates.len());
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = forest(random_table(50, 4, 13), 2, 4, 14);
        let err = index.search(&[1.0, 2.0], 5).unwrap_err();
        assert!(matches!(
            err,
            GroveDbError::DimensionMismatch {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_empty_index() {
        let table = random_table(10, 4, 15);
        let index = ForestIndex::from_parts(table, Vec::new(), DistanceMetric::Angular, 4);
        assert!(matches!(
            index.search(&[0.0; 4], 3),
            Err(GroveDbError::EmptyIndex)
        ));
    }

    #[test]
    fn test_invalid_config() {
        let table = random_table(10, 4, 16);
        assert!(matches!(
            ForestIndex::build(table, &ForestConfig::new(0, 4)),
            Err(GroveDbError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_search_with_stats() {
        let table = random_table(1000, 16, 17);
        let query = table.row(ItemId(3)).to_vec();
        let index = forest(table, 5, 20, 18);

        let (results, stats) = index.search_with_stats(&query, 5).unwrap();
        assert_eq!(results, index.search(&query, 5).unwrap());
        assert_eq!(stats.trees_descended, 5);
        assert!(stats.unique_candidates <= stats.candidates_collected);
        assert_eq!(stats.distances_computed, stats.unique_candidates);
    }

    #[test]
    fn test_batch_search_matches_sequential() {
        let table = random_table(1000, 32, 19);
        let queries: Vec<Vec<f32>> = (0..10).map(|i| table.row(ItemId(i * 7)).to_vec()).collect();
        let index = forest(table, 6, 16, 20);

        let batch = index.batch_search(&queries, 5).unwrap();
        assert_eq!(batch.len(), queries.len());
        for (query, results) in queries.iter().zip(&batch) {
            assert_eq!(results, &index.search(query, 5).unwrap());
        }
    }

    #[test]
    fn test_statistics() {
        let index = forest(random_table(1000, 16, 21), 4, 25, 22);
        let stats = index.statistics();
        assert_eq!(stats.num_items, 1000);
        assert_eq!(stats.num_trees, 4);
        assert!(stats.leaf_size_max <= 25);
        assert!(stats.leaf_size_min >= 1);
        assert!((stats.leaf_size_mean * stats.total_leaves as f32 - 4000.0).abs() < 1.0);
        assert!(stats.memory_bytes >= 1000 * 16 * 4);
    }
}
