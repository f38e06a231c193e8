//! Distance computation and split-margin projection.
//!
//! The metric is recorded in the persisted index header, so each variant
//! carries a stable one-byte tag.

pub mod scalar;

pub use scalar::{
    angular_distance, cosine_similarity, dot_product, euclidean_distance, normalized_projection,
    squared_norm,
};

use serde::{Deserialize, Serialize};

/// Supported distance metrics for similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Angular distance: sqrt(2 * (1 - cosine_similarity(a, b)))
    /// Range [0, 2], insensitive to vector magnitude.
    #[default]
    Angular,
    /// Euclidean (L2) distance: sqrt(sum((a[i] - b[i])^2))
    Euclidean,
}

impl DistanceMetric {
    /// Compute the distance between two vectors using this metric.
    ///
    /// # Panics
    /// Panics if the vectors have different dimensions.
    #[inline]
    pub fn compute(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Angular => angular_distance(a, b),
            DistanceMetric::Euclidean => euclidean_distance(a, b),
        }
    }

    /// Signed position of `v` along a split normal.
    ///
    /// Under the angular metric only the direction of `v` matters, so the
    /// projection is divided by its norm (zero vectors sit at 0).
    #[inline]
    pub fn margin(&self, normal: &[f32], v: &[f32]) -> f32 {
        match self {
            DistanceMetric::Angular => normalized_projection(normal, v),
            DistanceMetric::Euclidean => dot_product(normal, v),
        }
    }

    /// One-byte tag written to the index header.
    pub fn tag(self) -> u8 {
        match self {
            DistanceMetric::Angular => 0,
            DistanceMetric::Euclidean => 1,
        }
    }

    /// Decode a header tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(DistanceMetric::Angular),
            1 => Some(DistanceMetric::Euclidean),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_metric_euclidean() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        let dist = DistanceMetric::Euclidean.compute(&a, &b);
        assert!((dist - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_distance_metric_angular() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 1.0];
        let dist = DistanceMetric::Angular.compute(&a, &b);
        let expected = (2.0f32 - 2.0 * std::f32::consts::FRAC_1_SQRT_2).sqrt();
        assert!((dist - expected).abs() < 1e-5);
    }

    #[test]
    fn test_angular_margin_is_scale_invariant() {
        let normal = vec![0.6, 0.8];
        let v = vec![3.0, 1.0];
        let scaled = vec![30.0, 10.0];
        let m1 = DistanceMetric::Angular.margin(&normal, &v);
        let m2 = DistanceMetric::Angular.margin(&normal, &scaled);
        assert!((m1 - m2).abs() < 1e-6);
        assert_eq!(DistanceMetric::Angular.margin(&normal, &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_euclidean_margin_is_raw_projection() {
        let normal = vec![1.0, 0.0];
        assert_eq!(DistanceMetric::Euclidean.margin(&normal, &[5.0, 2.0]), 5.0);
    }

    #[test]
    fn test_metric_tags() {
        for metric in [DistanceMetric::Angular, DistanceMetric::Euclidean] {
            assert_eq!(DistanceMetric::from_tag(metric.tag()), Some(metric));
        }
        assert_eq!(DistanceMetric::from_tag(7), None);
    }
}
