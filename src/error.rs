//! Error types for grove-db operations.
//!
//! Every fallible operation in the crate (building a forest, querying it,
//! persisting it, and pulling vectors out of an external embedder) reports
//! failures through [`GroveDbError`].

use std::io;
use thiserror::Error;

/// Result type alias using [`GroveDbError`].
pub type Result<T> = std::result::Result<T, GroveDbError>;

/// Opaque error produced by an external collaborator (embedder, translator).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during grove-db operations.
#[derive(Error, Debug)]
pub enum GroveDbError {
    /// The vector source produced no vectors.
    #[error("empty corpus: at least one vector is required to build an index")]
    EmptyCorpus,

    /// Vector dimensions do not match the expected dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected vector dimension.
        expected: usize,
        /// Actual vector dimension provided.
        actual: usize,
    },

    /// A persisted index failed validation.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Query against an index with no trees or no items.
    #[error("empty index: the forest holds no trees or no items")]
    EmptyIndex,

    /// Invalid parameter value provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The embedding provider failed.
    #[error("embedding failed: {0}")]
    Embedding(#[source] BoxError),

    /// The translation service failed.
    #[error("translation failed: {0}")]
    Translation(#[source] BoxError),
}

impl GroveDbError {
    /// Creates a new `DimensionMismatch` error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates a new `CorruptIndex` error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptIndex(msg.into())
    }

    /// Creates a new `InvalidParameter` error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GroveDbError::dimension_mismatch(384, 128);
        assert_eq!(err.to_string(), "dimension mismatch: expected 384, got 128");

        let err = GroveDbError::corrupt("invalid magic bytes");
        assert_eq!(err.to_string(), "corrupt index: invalid magic bytes");

        let err = GroveDbError::EmptyIndex;
        assert_eq!(
            err.to_string(),
            "empty index: the forest holds no trees or no items"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: GroveDbError = io_err.into();
        assert!(matches!(err, GroveDbError::Io(_)));
    }

    #[test]
    fn test_external_error_source_preserved() {
        use std::error::Error as _;

        let inner: BoxError = "service unavailable".into();
        let err = GroveDbError::Translation(inner);
        assert_eq!(err.to_string(), "translation failed: service unavailable");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("service unavailable"));
    }
}
