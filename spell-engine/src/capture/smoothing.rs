//! Jitter smoothing and velocity gating
//!
//! Hand-pose detectors wobble by a few pixels from frame to frame even when
//! the hand is still, and occasionally snap to a wrong hand or a reflection
//! for a single frame. The moving average removes the former; the velocity
//! gate rejects the latter.

use super::types::Sample;
use crate::geometry::Point;
use std::collections::VecDeque;

/// Smallest allowed smoothing window (pass-through)
pub const MIN_WINDOW: usize = 1;
/// Largest allowed smoothing window
pub const MAX_WINDOW: usize = 10;
/// Default smoothing window
pub const DEFAULT_WINDOW: usize = 5;
/// Default maximum tip movement per tick, in pixels
pub const DEFAULT_MAX_VELOCITY: f64 = 250.0;

/// Moving-average smoother over the last `window` raw positions
#[derive(Debug, Clone)]
pub struct PointSmoother {
    window: usize,
    buffer: VecDeque<Point>,
}

impl PointSmoother {
    /// Create a smoother. The window is clamped to \[1, 10\].
    pub fn new(window: usize) -> Self {
        let window = window.clamp(MIN_WINDOW, MAX_WINDOW);
        Self {
            window,
            buffer: VecDeque::with_capacity(window),
        }
    }

    /// Add a raw position and return the mean of the buffered positions.
    pub fn smooth(&mut self, raw: Point) -> Point {
        self.buffer.push_back(raw);
        while self.buffer.len() > self.window {
            self.buffer.pop_front();
        }

        let n = self.buffer.len() as f64;
        let (sx, sy) = self
            .buffer
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / n, sy / n)
    }

    /// Smooth a timestamped sample. Timestamps do not weight the average.
    pub fn smooth_sample(&mut self, sample: &Sample) -> Point {
        self.smooth(sample.point())
    }

    /// Forget history (tracking was lost)
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PointSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

/// Check whether moving from `last_accepted` to `candidate` is plausible.
///
/// Any movement is valid when there is no previously accepted point.
pub fn is_valid_movement(candidate: Point, last_accepted: Option<Point>, max_velocity: f64) -> bool {
    match last_accepted {
        Some(last) => candidate.distance_to(&last) <= max_velocity,
        None => true,
    }
}
