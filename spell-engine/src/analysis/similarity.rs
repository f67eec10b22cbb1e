//! Similarity scoring between normalized paths

use super::normalization::{NormalizedPath, RESAMPLE_POINTS};

/// Mean Euclidean distance between corresponding points
pub fn mean_distance(a: &NormalizedPath, b: &NormalizedPath) -> f64 {
    let total: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(p, q)| p.distance_to(q))
        .sum();
    total / RESAMPLE_POINTS as f64
}

/// Similarity in `[0, 1]`: `max(0, 1 - d / (0.5 * sqrt(2) * size))` where `d`
/// is the mean pointwise distance and `size` the side length both paths were
/// scaled to. Identical paths score 1.
pub fn similarity(a: &NormalizedPath, b: &NormalizedPath, size: f64) -> f64 {
    let half_diagonal = 0.5 * std::f64::consts::SQRT_2 * size;
    if half_diagonal <= 0.0 {
        return 0.0;
    }
    (1.0 - mean_distance(a, b) / half_diagonal).max(0.0)
}
