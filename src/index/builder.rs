//! Build configuration and a fluent builder for [`ForestIndex`].
//!
//! # Example
//!
//! ```
//! use grove_db::{DistanceMetric, ForestIndexBuilder, VectorTable};
//!
//! let vectors = VectorTable::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]])?;
//! let index = ForestIndexBuilder::new()
//!     .vectors(vectors)
//!     .tree_count(5)
//!     .leaf_capacity(2)
//!     .metric(DistanceMetric::Angular)
//!     .seed(42)
//!     .build()?;
//!
//! assert_eq!(index.tree_count(), 5);
//! # Ok::<(), grove_db::GroveDbError>(())
//! ```

use crate::constants::forest::{DEFAULT_LEAF_CAPACITY, DEFAULT_TREE_COUNT};
use crate::distance::DistanceMetric;
use crate::error::{GroveDbError, Result};
use crate::vector::VectorTable;
use serde::{Deserialize, Serialize};

use super::ForestIndex;

/// Parameters of a forest build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of independently randomized trees.
    pub tree_count: usize,
    /// Maximum items per leaf before a node is split.
    pub leaf_capacity: usize,
    /// Metric used for splitting and re-ranking.
    pub metric: DistanceMetric,
    /// Seed for the split directions. `None` draws one from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            tree_count: DEFAULT_TREE_COUNT,
            leaf_capacity: DEFAULT_LEAF_CAPACITY,
            metric: DistanceMetric::default(),
            seed: None,
        }
    }
}

impl ForestConfig {
    /// Create a config with the given tree count and leaf capacity.
    pub fn new(tree_count: usize, leaf_capacity: usize) -> Self {
        Self {
            tree_count,
            leaf_capacity,
            ..Self::default()
        }
    }

    /// Reject parameters no forest can be built with.
    pub fn validate(&self) -> Result<()> {
        if self.tree_count == 0 {
            return Err(GroveDbError::invalid_parameter(
                "tree_count must be at least 1",
            ));
        }
        if self.tree_count > u32::MAX as usize {
            return Err(GroveDbError::invalid_parameter(
                "tree_count must fit in u32",
            ));
        }
        if self.leaf_capacity == 0 {
            return Err(GroveDbError::invalid_parameter(
                "leaf_capacity must be at least 1",
            ));
        }
        if self.leaf_capacity > u32::MAX as usize {
            return Err(GroveDbError::invalid_parameter(
                "leaf_capacity must fit in u32",
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`ForestIndex`].
#[derive(Default)]
pub struct ForestIndexBuilder {
    vectors: Option<VectorTable>,
    config: ForestConfig,
}

impl ForestIndexBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn with_config(config: ForestConfig) -> Self {
        Self {
            vectors: None,
            config,
        }
    }

    /// Set the vectors to index.
    ///
    /// This is required for building the index.
    pub fn vectors(mut self, vectors: VectorTable) -> Self {
        self.vectors = Some(vectors);
        self
    }

    /// Set the number of trees.
    ///
    /// More trees surface more candidates per query, raising recall at the
    /// cost of build time, memory and query time.
    pub fn tree_count(mut self, tree_count: usize) -> Self {
        self.config.tree_count = tree_count;
        self
    }

    /// Set the maximum number of items per leaf.
    pub fn leaf_capacity(mut self, leaf_capacity: usize) -> Self {
        self.config.leaf_capacity = leaf_capacity;
        self
    }

    /// Set the distance metric.
    ///
    /// Default: `DistanceMetric::Angular`
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Fix the random seed so the build is reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Build the index.
    ///
    /// # Errors
    /// `EmptyCorpus` if no vectors were supplied, `InvalidParameter` for a
    /// zero tree count or leaf capacity.
    pub fn build(self) -> Result<ForestIndex> {
        let vectors = self.vectors.ok_or(GroveDbError::EmptyCorpus)?;
        ForestIndex::build(vectors, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ForestConfig::default();
        assert_eq!(config.tree_count, 10);
        assert_eq!(config.metric, DistanceMetric::Angular);
        assert!(config.seed.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_parameters() {
        assert!(matches!(
            ForestConfig::new(0, 8).validate(),
            Err(GroveDbError::InvalidParameter(_))
        ));
        assert!(matches!(
            ForestConfig::new(4, 0).validate(),
            Err(GroveDbError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ForestConfig =
            serde_json::from_str(r#"{"tree_count": 3, "metric": "euclidean", "seed": 9}"#).unwrap();
        assert_eq!(config.tree_count, 3);
        assert_eq!(config.leaf_capacity, DEFAULT_LEAF_CAPACITY);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert_eq!(config.seed, Some(9));

        let json = serde_json::to_string(&config).unwrap();
        let back: ForestConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_builder_without_vectors() {
        let result = ForestIndexBuilder::new().tree_count(2).build();
        assert!(matches!(result, Err(GroveDbError::EmptyCorpus)));
    }

    #[test]
    fn test_builder_sets_config() {
        let builder = ForestIndexBuilder::new()
            .tree_count(7)
            .leaf_capacity(3)
            .metric(DistanceMetric::Euclidean)
            .seed(1);
        let config = builder.config();
        assert_eq!(config.tree_count, 7);
        assert_eq!(config.leaf_capacity, 3);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert_eq!(config.seed, Some(1));
    }
}
