//! grove-db: a random-projection forest for approximate nearest neighbor search.
//!
//! Vectors (typically sentence embeddings) are indexed by an ensemble of
//! binary trees, each splitting the corpus at the median of a random
//! projection. A query walks every tree to one leaf, unions the leaves and
//! re-ranks those candidates with exact distances.
//!
//! # Features
//!
//! - **Angular and Euclidean metrics**: angular distance is
//!   `sqrt(2 * (1 - cos))`, insensitive to vector magnitude
//! - **Parallel, reproducible builds**: trees are built with Rayon, each from
//!   its own seeded generator
//! - **Compact, validated persistence**: one self-describing binary file,
//!   bounds-checked on load
//! - **Concurrent queries**: the index is immutable and `Send + Sync`
//!
//! # Example
//!
//! ```
//! use grove_db::{build_index, query, ItemId};
//!
//! let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
//! let index = build_index(vectors, 5, 2)?;
//!
//! let results = query(&index, &[1.0, 0.0], 1)?;
//! assert_eq!(results[0].id, ItemId(0));
//! # Ok::<(), grove_db::GroveDbError>(())
//! ```

pub mod constants;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod index;
pub mod metrics;
pub mod persistence;
pub mod source;
pub mod types;
pub mod vector;

// Re-export commonly used types at crate root
pub use dataset::{recall_at_k, Dataset};
pub use distance::DistanceMetric;
pub use error::{GroveDbError, Result};
pub use index::{
    BruteForceIndex, ForestConfig, ForestIndex, ForestIndexBuilder, SearchResult, VectorIndex,
};
pub use metrics::{ForestStatistics, SearchStatistics};
pub use persistence::{load_index, save_index, Persistable};
pub use source::{embed_corpus, normalize_text, Embedder, QueryPipeline, Translator};
pub use types::ItemId;
pub use vector::VectorTable;

/// Build a forest of `tree_count` trees over `vectors` with the default
/// (angular) metric and a random seed.
///
/// # Errors
/// `EmptyCorpus` for no vectors, `DimensionMismatch` if the vectors differ
/// in length, `InvalidParameter` for a zero tree count or leaf capacity.
pub fn build_index<I, V>(vectors: I, tree_count: usize, leaf_capacity: usize) -> Result<ForestIndex>
where
    I: IntoIterator<Item = V>,
    V: AsRef<[f32]>,
{
    let table = VectorTable::from_rows(vectors)?;
    ForestIndex::build(table, &ForestConfig::new(tree_count, leaf_capacity))
}

/// Return up to `k` items nearest to `vector`, closest first.
pub fn query(index: &ForestIndex, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
    index.search(vector, k)
}
