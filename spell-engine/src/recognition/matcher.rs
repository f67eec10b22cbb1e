//! Gesture Matching
//!
//! Scores a captured path against every template in a library and reports
//! the best one above the recognition threshold. Two strategies share one
//! scoring scheme:
//!
//! - rotation-invariant: full $1 normalization at the reference size, used
//!   for authoritative recognition
//! - bounding-box: resampled outline in a `0..=100` box without rotation,
//!   cheaper and orientation-sensitive, used for live feedback

use super::library::TemplateLibrary;
use super::template::GestureTemplate;
use crate::analysis::{similarity, NormalizedPath, ShapeNormalizer, OUTLINE_SIZE, REFERENCE_SIZE};
use crate::geometry::Point;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// Default minimum similarity for a match
pub const DEFAULT_THRESHOLD: f64 = 0.7;
/// Shortest path worth matching
pub const DEFAULT_MIN_POINTS: usize = 5;
/// Default quiet period after a successful match (ms)
pub const DEFAULT_COOLDOWN_MS: u64 = 2_000;
/// Default minimum spacing between match attempts (ms)
pub const DEFAULT_MATCH_INTERVAL_MS: u64 = 100;

/// Normalization and scoring strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Resample, rotate, scale to 250, center
    #[default]
    RotationInvariant,
    /// Resample, scale into a 100 box, no rotation
    BoundingBox,
}

impl MatchStrategy {
    /// Side length paths are scaled to under this strategy
    pub fn reference_size(&self) -> f64 {
        match self {
            MatchStrategy::RotationInvariant => REFERENCE_SIZE,
            MatchStrategy::BoundingBox => OUTLINE_SIZE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::RotationInvariant => "rotation_invariant",
            MatchStrategy::BoundingBox => "bounding_box",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStrategy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "rotation_invariant" => Ok(MatchStrategy::RotationInvariant),
            "bounding_box" => Ok(MatchStrategy::BoundingBox),
            other => Err(crate::Error::Config(format!(
                "unknown match strategy '{}' (expected rotation_invariant or bounding_box)",
                other
            ))),
        }
    }
}

/// A template and how well a path matched it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureMatch {
    pub name: String,
    /// Similarity in `[0, 1]`
    pub score: f64,
}

/// Template matcher
#[derive(Debug, Clone)]
pub struct GestureMatcher {
    normalizer: ShapeNormalizer,
    threshold: f64,
    strategy: MatchStrategy,
    min_points: usize,
}

impl GestureMatcher {
    pub fn new() -> Self {
        Self {
            normalizer: ShapeNormalizer::new(),
            threshold: DEFAULT_THRESHOLD,
            strategy: MatchStrategy::default(),
            min_points: DEFAULT_MIN_POINTS,
        }
    }

    /// Set the recognition threshold, clamped to \[0, 1\].
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Strategy used by [`GestureMatcher::match_path`] and [`GestureMatcher::rank`]
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the minimum path length (at least 2).
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points.max(2);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Authoritative rotation-invariant match.
    pub fn recognize(&self, path: &[Point], library: &TemplateLibrary) -> Option<GestureMatch> {
        self.match_with(path, library, MatchStrategy::RotationInvariant)
    }

    /// Match with the configured strategy.
    pub fn match_path(&self, path: &[Point], library: &TemplateLibrary) -> Option<GestureMatch> {
        self.match_with(path, library, self.strategy)
    }

    /// Best template whose score exceeds the threshold, if any.
    pub fn match_with(
        &self,
        path: &[Point],
        library: &TemplateLibrary,
        strategy: MatchStrategy,
    ) -> Option<GestureMatch> {
        let best = self.rank_with(path, library, strategy).into_iter().next()?;
        if best.score > self.threshold {
            debug!(name = %best.name, score = best.score, %strategy, "Gesture matched");
            Some(best)
        } else {
            trace!(name = %best.name, score = best.score, %strategy, "Best score below threshold");
            None
        }
    }

    /// Every template's score under the configured strategy, best first.
    pub fn rank(&self, path: &[Point], library: &TemplateLibrary) -> Vec<GestureMatch> {
        self.rank_with(path, library, self.strategy)
    }

    /// Every template's score, best first; ties keep name order.
    ///
    /// Empty when the path is too short or has no usable shape.
    pub fn rank_with(
        &self,
        path: &[Point],
        library: &TemplateLibrary,
        strategy: MatchStrategy,
    ) -> Vec<GestureMatch> {
        if path.len() < self.min_points {
            return Vec::new();
        }
        let Some(candidate) = self.prepare(path, strategy) else {
            return Vec::new();
        };

        let size = strategy.reference_size();
        let mut scores: Vec<GestureMatch> = library
            .iter()
            .filter_map(|template| {
                let reference = template_form(template, strategy)?;
                Some(GestureMatch {
                    name: template.name.clone(),
                    score: similarity(&candidate, reference, size),
                })
            })
            .collect();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores
    }

    fn prepare(&self, path: &[Point], strategy: MatchStrategy) -> Option<NormalizedPath> {
        match strategy {
            MatchStrategy::RotationInvariant => self.normalizer.normalize(path),
            MatchStrategy::BoundingBox => self.normalizer.outline(path),
        }
    }
}

impl Default for GestureMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn template_form(template: &GestureTemplate, strategy: MatchStrategy) -> Option<&NormalizedPath> {
    match strategy {
        MatchStrategy::RotationInvariant => Some(&template.path),
        MatchStrategy::BoundingBox => template.outline.as_ref(),
    }
}

/// Rate limiter for live matching
///
/// Attempts are spaced at least `interval_ms` apart, and no attempt is made
/// within `cooldown_ms` of a success so a held pose does not fire repeatedly.
#[derive(Debug, Clone)]
pub struct MatchCooldown {
    cooldown_ms: u64,
    interval_ms: u64,
    last_attempt: Option<Timestamp>,
    last_success: Option<Timestamp>,
}

impl MatchCooldown {
    pub fn new(cooldown_ms: u64, interval_ms: u64) -> Self {
        Self {
            cooldown_ms,
            interval_ms,
            last_attempt: None,
            last_success: None,
        }
    }

    /// Whether a match attempt is allowed at `now`
    pub fn ready(&self, now: Timestamp) -> bool {
        !self.in_cooldown(now)
            && self
                .last_attempt
                .map_or(true, |t| now.millis_since(t) >= self.interval_ms)
    }

    pub fn in_cooldown(&self, now: Timestamp) -> bool {
        self.last_success
            .is_some_and(|t| now.millis_since(t) < self.cooldown_ms)
    }

    pub fn record_attempt(&mut self, now: Timestamp) {
        self.last_attempt = Some(now);
    }

    pub fn record_success(&mut self, now: Timestamp) {
        self.last_attempt = Some(now);
        self.last_success = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_attempt = None;
        self.last_success = None;
    }
}

impl Default for MatchCooldown {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS, DEFAULT_MATCH_INTERVAL_MS)
    }
}
