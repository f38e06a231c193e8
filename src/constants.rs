//! Named constants for configuration values.
//!
//! This module centralizes magic numbers and default values used throughout
//! the codebase, making them easier to find, document, and tune.

/// Constants for forest construction.
pub mod forest {
    /// Default number of trees in a forest.
    pub const DEFAULT_TREE_COUNT: usize = 10;

    /// Default maximum number of items held by one leaf.
    pub const DEFAULT_LEAF_CAPACITY: usize = 64;

    /// Random directions tried at a node before it is given up as a leaf.
    /// Only sets of (near-)duplicate vectors exhaust all attempts.
    pub const SPLIT_ATTEMPTS: usize = 5;

    /// Odd 64-bit constant used to spread the build seed across trees.
    pub const TREE_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;
}

/// Constants for the external vector source.
pub mod source {
    /// Number of corpus items embedded before the rest is dropped.
    pub const DEFAULT_CORPUS_LIMIT: usize = 10_000;

    /// Language queries are translated into before embedding.
    pub const DEFAULT_TARGET_LANGUAGE: &str = "English";
}

/// Constants for brute force search.
pub mod cache {
    /// Chunk size for parallel brute force search.
    /// Sized to fit multiple vectors in L2 cache.
    pub const BRUTE_FORCE_CHUNK_SIZE: usize = 1000;
}
