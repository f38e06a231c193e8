//! Scalar distance kernels.
//!
//! Every kernel accumulates left to right in a fixed order, so the same pair
//! of slices always yields bit-identical results. Build-time split margins and
//! query-time descent rely on that to route a stored vector and an identical
//! query vector down the same branch.
//!
//! The angular kernels accumulate in `f64`. Squared `f32` components can
//! neither overflow nor underflow there, which keeps normalization exact for
//! vectors of any finite magnitude.

/// Compute the dot product of two vectors.
///
/// Returns sum(a[i] * b[i])
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute the squared L2 norm of a vector.
#[inline]
pub fn squared_norm(a: &[f32]) -> f32 {
    a.iter().map(|x| x * x).sum()
}

/// Compute the Euclidean (L2) distance between two vectors.
///
/// Returns sqrt(sum((a[i] - b[i])^2))
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let sum: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum();

    sum.sqrt()
}

/// Compute the cosine similarity between two vectors.
///
/// Returns dot(a, b) / (||a|| * ||b||), clamped to [-1.0, 1.0]. Two zero
/// vectors have similarity 1.0; a zero vector against anything else has 0.0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 && norm_b == 0.0 {
        return 1.0;
    }
    let denom = (norm_a * norm_b).sqrt();
    if denom > 0.0 {
        (dot / denom).clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Projection of `v` onto `direction`, divided by the norm of `v`.
///
/// Returns 0.0 for a zero `v`.
#[inline]
pub fn normalized_projection(direction: &[f32], v: &[f32]) -> f32 {
    assert_eq!(direction.len(), v.len(), "Vector dimensions must match");

    let mut dot = 0.0f64;
    let mut norm = 0.0f64;
    for (&d, &x) in direction.iter().zip(v.iter()) {
        let x = f64::from(x);
        dot += f64::from(d) * x;
        norm += x * x;
    }

    if norm > 0.0 {
        (dot / norm.sqrt()) as f32
    } else {
        0.0
    }
}

/// Compute the angular distance between two vectors.
///
/// Returns sqrt(2 * (1 - cosine_similarity(a, b))).
///
/// Range: [0.0, 2.0]. Identical vectors give exactly 0.0; a zero vector is
/// sqrt(2) away from every non-zero vector.
#[inline]
pub fn angular_distance(a: &[f32], b: &[f32]) -> f32 {
    let cos = cosine_similarity(a, b);
    (2.0 - 2.0 * cos).max(0.0).sqrt()
}
