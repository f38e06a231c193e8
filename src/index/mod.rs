//! Index implementations for vector search.

pub mod brute_force;
pub mod builder;
pub mod forest;
pub mod traits;
pub mod tree;

pub use brute_force::BruteForceIndex;
pub use builder::{ForestConfig, ForestIndexBuilder};
pub use forest::ForestIndex;
pub use traits::{SearchResult, VectorIndex};
pub use tree::{Node, PartitionTree};
