//! Drawing Tip Selection
//!
//! Picks the landmark that acts as the wand tip. The primary candidate is
//! the index fingertip; when the detector is unsure about it, other
//! fingertips stand in so a partly occluded hand keeps drawing. A candidate
//! that jumps implausibly far is not trusted: the previous tip is held with
//! reduced confidence instead. A position the hand keeps for several
//! readings in a row is not a spike, so the gate re-anchors on it.

use super::smoothing::{is_valid_movement, DEFAULT_MAX_VELOCITY};
use super::types::{Landmark, TipSelection};
use crate::geometry::Point;
use tracing::debug;

/// Hand landmark index of the thumb tip
pub const THUMB_TIP: usize = 4;
/// Hand landmark index of the index fingertip
pub const INDEX_FINGER_TIP: usize = 8;
/// Hand landmark index of the middle fingertip
pub const MIDDLE_FINGER_TIP: usize = 12;

/// Candidate order used when none is configured
pub const DEFAULT_TIP_PRIORITY: [usize; 3] = [INDEX_FINGER_TIP, MIDDLE_FINGER_TIP, THUMB_TIP];
/// Default minimum detector confidence
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;
/// Confidence multiplier applied when a jump is rejected
pub const DEFAULT_VELOCITY_PENALTY: f64 = 0.7;
/// Consecutive gate rejections after which the candidate is taken as the new anchor
pub const DEFAULT_REANCHOR_AFTER: u32 = 5;

/// Stateful tip selector with a velocity gate
#[derive(Debug, Clone)]
pub struct TipSelector {
    /// Landmark indices to try, most preferred first
    priority: Vec<usize>,
    /// Maximum distance the tip may move between accepted readings (pixels)
    max_velocity: f64,
    /// Confidence multiplier when holding the previous point
    velocity_penalty: f64,
    /// Rejections in a row that force a re-anchor
    reanchor_after: u32,
    /// Current run of consecutive rejections
    rejections: u32,
    /// Last reading that passed the velocity gate
    last_accepted: Option<Point>,
}

impl TipSelector {
    /// Create a selector with default candidates and thresholds
    pub fn new() -> Self {
        Self {
            priority: DEFAULT_TIP_PRIORITY.to_vec(),
            max_velocity: DEFAULT_MAX_VELOCITY,
            velocity_penalty: DEFAULT_VELOCITY_PENALTY,
            reanchor_after: DEFAULT_REANCHOR_AFTER,
            rejections: 0,
            last_accepted: None,
        }
    }

    /// Replace the candidate order. An empty list keeps the defaults.
    pub fn with_priority(mut self, priority: &[usize]) -> Self {
        if !priority.is_empty() {
            self.priority = priority.to_vec();
        }
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: f64) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    /// Set the confidence multiplier, clamped to \[0, 1\].
    pub fn with_velocity_penalty(mut self, penalty: f64) -> Self {
        self.velocity_penalty = penalty.clamp(0.0, 1.0);
        self
    }

    /// Re-anchor after `count` consecutive rejections (at least 1).
    pub fn with_reanchor_after(mut self, count: u32) -> Self {
        self.reanchor_after = count.max(1);
        self
    }

    /// Choose the tip among pixel-space `landmarks`.
    ///
    /// The first candidate (in priority order) whose confidence exceeds
    /// `confidence_threshold` decides the outcome; lower-priority candidates
    /// are not consulted once one clears the threshold.
    pub fn select_tip(&mut self, landmarks: &[Landmark], confidence_threshold: f64) -> TipSelection {
        let candidate = self
            .priority
            .iter()
            .filter_map(|&ix| landmarks.get(ix).map(|lm| (ix, lm)))
            .find(|(_, lm)| lm.confidence > confidence_threshold && lm.point().is_finite());

        let Some((ix, landmark)) = candidate else {
            return TipSelection::not_visible();
        };

        let point = landmark.point();
        if is_valid_movement(point, self.last_accepted, self.max_velocity) {
            return self.accept(ix, landmark, point);
        }

        self.rejections += 1;
        if self.rejections >= self.reanchor_after {
            debug!(
                landmark = ix,
                x = point.x,
                y = point.y,
                rejections = self.rejections,
                "Velocity gate re-anchored on persistent tip position"
            );
            return self.accept(ix, landmark, point);
        }

        debug!(
            landmark = ix,
            x = point.x,
            y = point.y,
            rejections = self.rejections,
            "Tip jump rejected by velocity gate"
        );
        TipSelection {
            point: self.last_accepted,
            confidence: landmark.confidence * self.velocity_penalty,
            landmark: Some(ix),
            held: true,
        }
    }

    fn accept(&mut self, ix: usize, landmark: &Landmark, point: Point) -> TipSelection {
        self.last_accepted = Some(point);
        self.rejections = 0;
        TipSelection {
            point: Some(point),
            confidence: landmark.confidence,
            landmark: Some(ix),
            held: false,
        }
    }

    /// Forget the last accepted point (tracking was lost)
    pub fn reset(&mut self) {
        self.last_accepted = None;
        self.rejections = 0;
    }

    pub fn last_accepted(&self) -> Option<Point> {
        self.last_accepted
    }

    pub fn priority(&self) -> &[usize] {
        &self.priority
    }
}

impl Default for TipSelector {
    fn default() -> Self {
        Self::new()
    }
}
