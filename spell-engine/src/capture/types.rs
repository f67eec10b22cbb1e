//! Core types for tip capture
//!
//! Defines what the tracking collaborator hands the engine each tick and
//! what the tip selector hands back.

use crate::geometry::Point;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// One observed tip position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub t: Timestamp,
}

impl Sample {
    pub fn new(x: f64, y: f64, t: Timestamp) -> Self {
        Self { x, y, t }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A tracked landmark with its detector confidence
///
/// Coordinates are normalized to `[0, 1] x [0, 1]` when delivered by the
/// tracking source and in pixels after [`LandmarkFrame::to_pixels`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Visibility / confidence reported by the detector
    pub confidence: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Output surface the normalized coordinates are projected onto
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// All landmarks delivered for one tracking tick, indexed by landmark id.
///
/// An empty frame means nothing was detected this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// A frame with no detection
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Project normalized coordinates into viewport pixels.
    pub fn to_pixels(&self, viewport: Viewport) -> Vec<Landmark> {
        self.landmarks
            .iter()
            .map(|lm| Landmark {
                x: lm.x * viewport.width,
                y: lm.y * viewport.height,
                confidence: lm.confidence,
            })
            .collect()
    }
}

/// Result of choosing the drawing tip for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TipSelection {
    /// Accepted tip position, `None` when no candidate is trustworthy
    pub point: Option<Point>,
    /// Confidence of the reading (0 when not visible)
    pub confidence: f64,
    /// Landmark index the reading came from
    pub landmark: Option<usize>,
    /// True when the candidate jumped too far and the previous point was held
    pub held: bool,
}

impl TipSelection {
    /// No candidate cleared the confidence threshold
    pub fn not_visible() -> Self {
        Self {
            point: None,
            confidence: 0.0,
            landmark: None,
            held: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.point.is_some()
    }
}
