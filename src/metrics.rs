//! Metrics and statistics for index monitoring.
//!
//! # Forest Statistics
//!
//! Use [`ForestStatistics`] to inspect the shape of a built forest:
//!
//! ```ignore
//! let stats = index.statistics();
//! println!("{}", stats.summary());
//! // ForestStatistics:
//! //   Items: 10000, Dimension: 384
//! //   Trees: 10 (nodes=3150, leaves=1580, max depth=9)
//! //   Leaves: min=32, max=64, mean=63.3
//! //   Memory: 18.42 MB
//! ```
//!
//! # Search Statistics
//!
//! Use [`SearchStatistics`] to profile a query:
//!
//! ```ignore
//! let (results, stats) = index.search_with_stats(&query, 10)?;
//! println!("{:.3}ms, {} unique candidates", stats.query_time_ms(), stats.unique_candidates);
//! ```

use std::time::Duration;

/// Shape of a built forest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForestStatistics {
    /// Number of indexed items.
    pub num_items: usize,
    /// Vector dimension.
    pub dimension: usize,
    /// Number of trees.
    pub num_trees: usize,
    /// Nodes across all trees.
    pub total_nodes: usize,
    /// Leaves across all trees.
    pub total_leaves: usize,
    /// Longest root-to-leaf path over all trees.
    pub max_depth: usize,
    /// Smallest leaf.
    pub leaf_size_min: usize,
    /// Largest leaf. Exceeds the configured capacity only for unsplittable sets.
    pub leaf_size_max: usize,
    /// Mean leaf size.
    pub leaf_size_mean: f32,
    /// Estimated memory usage in bytes (vectors plus trees).
    pub memory_bytes: usize,
}

impl ForestStatistics {
    /// Create a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "ForestStatistics:\n  \
             Items: {}, Dimension: {}\n  \
             Trees: {} (nodes={}, leaves={}, max depth={})\n  \
             Leaves: min={}, max={}, mean={:.1}\n  \
             Memory: {:.2} MB",
            self.num_items,
            self.dimension,
            self.num_trees,
            self.total_nodes,
            self.total_leaves,
            self.max_depth,
            self.leaf_size_min,
            self.leaf_size_max,
            self.leaf_size_mean,
            self.memory_bytes as f64 / (1024.0 * 1024.0),
        )
    }
}

/// Statistics about a single search operation.
#[derive(Clone, Debug, Default)]
pub struct SearchStatistics {
    /// Total query execution time.
    pub query_time: Duration,
    /// Number of trees descended.
    pub trees_descended: usize,
    /// Item ids collected from leaves, duplicates included.
    pub candidates_collected: usize,
    /// Distinct item ids after the union across trees.
    pub unique_candidates: usize,
    /// Exact distance computations in the re-rank.
    pub distances_computed: usize,
}

impl SearchStatistics {
    /// Get query time in milliseconds.
    pub fn query_time_ms(&self) -> f32 {
        self.query_time.as_secs_f32() * 1000.0
    }

    /// Share of collected ids that were duplicates across trees.
    pub fn overlap_ratio(&self) -> f32 {
        if self.candidates_collected == 0 {
            0.0
        } else {
            1.0 - self.unique_candidates as f32 / self.candidates_collected as f32
        }
    }

    /// Create a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "SearchStatistics:\n  \
             Time: {:.3}ms\n  \
             Trees descended: {}\n  \
             Candidates: {} collected, {} unique ({:.1}% overlap)\n  \
             Distances computed: {}",
            self.query_time_ms(),
            self.trees_descended,
            self.candidates_collected,
            self.unique_candidates,
            self.overlap_ratio() * 100.0,
            self.distances_computed,
        )
    }
}

/// Builder for collecting search statistics during a search operation.
#[derive(Default)]
pub struct SearchStatsBuilder {
    stats: SearchStatistics,
}

impl SearchStatsBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one descended tree and the size of the leaf it reached.
    pub fn add_leaf(&mut self, leaf_size: usize) {
        self.stats.trees_descended += 1;
        self.stats.candidates_collected += leaf_size;
    }

    /// Record the candidate count after deduplication.
    pub fn unique_candidates(&mut self, count: usize) {
        self.stats.unique_candidates = count;
    }

    /// Add to the count of exact distances computed.
    pub fn add_distances(&mut self, count: usize) {
        self.stats.distances_computed += count;
    }

    /// Set the query execution time.
    pub fn set_query_time(&mut self, duration: Duration) {
        self.stats.query_time = duration;
    }

    /// Build the final statistics.
    pub fn build(self) -> SearchStatistics {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forest_statistics_summary() {
        let stats = ForestStatistics {
            num_items: 1000,
            dimension: 384,
            num_trees: 10,
            total_nodes: 630,
            total_leaves: 320,
            max_depth: 6,
            leaf_size_min: 20,
            leaf_size_max: 40,
            leaf_size_mean: 31.25,
            memory_bytes: 2 * 1024 * 1024,
        };

        let summary = stats.summary();
        assert!(summary.contains("Items: 1000"));
        assert!(summary.contains("384"));
        assert!(summary.contains("max depth=6"));
        assert!(summary.contains("2.00 MB"));
    }

    #[test]
    fn test_search_statistics_summary() {
        let stats = SearchStatistics {
            query_time: Duration::from_micros(1500),
            trees_descended: 10,
            candidates_collected: 200,
            unique_candidates: 150,
            distances_computed: 150,
        };

        let summary = stats.summary();
        assert!(summary.contains("1.5"));
        assert!(summary.contains("200 collected"));
        assert!(summary.contains("25.0% overlap"));
    }

    #[test]
    fn test_search_stats_builder() {
        let mut builder = SearchStatsBuilder::new();
        builder.add_leaf(12);
        builder.add_leaf(8);
        builder.unique_candidates(15);
        builder.add_distances(15);
        builder.set_query_time(Duration::from_millis(5));

        let stats = builder.build();
        assert_eq!(stats.trees_descended, 2);
        assert_eq!(stats.candidates_collected, 20);
        assert_eq!(stats.unique_candidates, 15);
        assert_eq!(stats.distances_computed, 15);
        assert_eq!(stats.query_time, Duration::from_millis(5));
    }

    #[test]
    fn test_overlap_ratio_empty() {
        assert_eq!(SearchStatistics::default().overlap_ratio(), 0.0);
    }
}
