//! Single-Stroke Shape Normalization
//!
//! Reduces a drawn path to its shape alone so that two drawings can be
//! compared point by point regardless of where, how large, or at what angle
//! they were drawn. The canonical form is reached in four ordered stages:
//!
//! 1. resample to [`RESAMPLE_POINTS`] points evenly spaced by arc length
//! 2. rotate about the centroid so the first point lies at angle zero from it
//! 3. scale uniformly so the larger bounding-box side equals the reference size
//! 4. translate the centroid to the origin
//!
//! A coarser outline form (resample and scale into a `0..=100` box, no
//! rotation) serves the low-latency bounding-box strategy.

use crate::geometry::{centroid, path_length, BoundingBox, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of points in every normalized path
pub const RESAMPLE_POINTS: usize = 64;
/// Side length the rotation-invariant form is scaled to
pub const REFERENCE_SIZE: f64 = 250.0;
/// Side length of the bounding-box outline form
pub const OUTLINE_SIZE: f64 = 100.0;

/// A fixed-length path produced by [`ShapeNormalizer`]
///
/// Serialized as a list of `[x, y]` pairs; deserialization rejects any list
/// that is not exactly [`RESAMPLE_POINTS`] long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct NormalizedPath([Point; RESAMPLE_POINTS]);

/// A point list of the wrong length was offered as a normalized path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("normalized path must have {expected} points, found {found}")]
pub struct PathLengthError {
    pub expected: usize,
    pub found: usize,
}

impl NormalizedPath {
    pub fn points(&self) -> &[Point; RESAMPLE_POINTS] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.0.iter()
    }

    pub const fn len(&self) -> usize {
        RESAMPLE_POINTS
    }

    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl TryFrom<Vec<Point>> for NormalizedPath {
    type Error = PathLengthError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        let found = points.len();
        <[Point; RESAMPLE_POINTS]>::try_from(points)
            .map(NormalizedPath)
            .map_err(|_| PathLengthError {
                expected: RESAMPLE_POINTS,
                found,
            })
    }
}

impl From<NormalizedPath> for Vec<Point> {
    fn from(path: NormalizedPath) -> Self {
        path.0.to_vec()
    }
}

/// $1-style path normalizer
#[derive(Debug, Clone, Copy)]
pub struct ShapeNormalizer {
    /// Side length the larger bounding-box side is scaled to
    pub reference_size: f64,
}

impl ShapeNormalizer {
    pub fn new() -> Self {
        Self {
            reference_size: REFERENCE_SIZE,
        }
    }

    /// Create a normalizer with a custom reference size.
    ///
    /// Clamps the size to \[1.0, 10000.0\].
    pub fn with_reference_size(reference_size: f64) -> Self {
        Self {
            reference_size: reference_size.clamp(1.0, 10_000.0),
        }
    }

    /// Canonical rotation-invariant form of `path`.
    ///
    /// Returns `None` for fewer than two points, zero path length, or
    /// non-finite coordinates.
    pub fn normalize(&self, path: &[Point]) -> Option<NormalizedPath> {
        let mut points = resample(path)?;
        rotate_to_zero(&mut points);
        scale_to(&mut points, self.reference_size);
        translate_to_origin(&mut points);
        NormalizedPath::try_from(points).ok()
    }

    /// Outline form for the bounding-box strategy: resampled, unrotated,
    /// with the larger side scaled to [`OUTLINE_SIZE`] and the box anchored
    /// at the origin.
    pub fn outline(&self, path: &[Point]) -> Option<NormalizedPath> {
        let mut points = resample(path)?;
        let bbox = BoundingBox::of(&points)?;
        let side = bbox.max_side();
        let k = if side > 0.0 { OUTLINE_SIZE / side } else { 1.0 };
        for p in points.iter_mut() {
            *p = Point::new((p.x - bbox.min_x) * k, (p.y - bbox.min_y) * k);
        }
        NormalizedPath::try_from(points).ok()
    }
}

impl Default for ShapeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Resample `path` to [`RESAMPLE_POINTS`] points evenly spaced by arc length.
pub fn resample(path: &[Point]) -> Option<Vec<Point>> {
    if path.len() < 2 || !path.iter().all(Point::is_finite) {
        return None;
    }
    let total = path_length(path);
    if total <= 0.0 {
        return None;
    }

    let interval = total / (RESAMPLE_POINTS - 1) as f64;
    let mut out = Vec::with_capacity(RESAMPLE_POINTS);
    out.push(path[0]);

    let mut accumulated = 0.0;
    let mut prev = path[0];
    for next in &path[1..] {
        let mut d = prev.distance_to(next);
        // An emitted point becomes the start of the remaining segment
        while d > 0.0 && accumulated + d >= interval && out.len() < RESAMPLE_POINTS {
            let q = prev.lerp(next, (interval - accumulated) / d);
            out.push(q);
            prev = q;
            accumulated = 0.0;
            d = prev.distance_to(next);
        }
        accumulated += d;
        prev = *next;
    }

    // Rounding can leave the final point unemitted
    let last = path[path.len() - 1];
    out.resize(RESAMPLE_POINTS, last);
    Some(out)
}

/// Rotate about the centroid so the first-point-to-centroid vector has angle 0.
pub fn rotate_to_zero(points: &mut [Point]) {
    let (Some(c), Some(first)) = (centroid(points), points.first().copied()) else {
        return;
    };
    let theta = (c.y - first.y).atan2(c.x - first.x);
    let (sin, cos) = (-theta).sin_cos();
    for p in points.iter_mut() {
        *p = p.rotate_about(&c, cos, sin);
    }
}

/// Scale uniformly so the larger bounding-box side equals `size`.
///
/// A zero-size box is left unchanged.
pub fn scale_to(points: &mut [Point], size: f64) {
    let Some(bbox) = BoundingBox::of(points) else {
        return;
    };
    let side = bbox.max_side();
    if side <= 0.0 {
        return;
    }
    let k = size / side;
    for p in points.iter_mut() {
        *p = Point::new(p.x * k, p.y * k);
    }
}

/// Translate so the centroid sits at the origin.
pub fn translate_to_origin(points: &mut [Point]) {
    let Some(c) = centroid(points) else {
        return;
    };
    for p in points.iter_mut() {
        *p = Point::new(p.x - c.x, p.y - c.y);
    }
}
