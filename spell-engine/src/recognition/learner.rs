//! Gesture Learning
//!
//! Teaches a new spell by having the user draw it three times. The three
//! drawings must agree with each other before a template is written, which
//! keeps one sloppy attempt from becoming the reference.
//!
//! ```text
//! Idle ──start──▶ Capturing(1) ─▶ Capturing(2) ─▶ Capturing(3) ─▶ Validating
//!  ▲                   ▲                                              │
//!  │                   └──────────────── rejected ────────────────────┤
//!  └─────────────────────── committed / cancel ───────────────────────┘
//! ```

use super::library::TemplateLibrary;
use super::template::GestureTemplate;
use crate::analysis::{similarity, ShapeNormalizer, REFERENCE_SIZE};
use crate::geometry::Point;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Drawings needed per session
pub const REQUIRED_SAMPLES: usize = 3;
/// Default minimum mean pairwise similarity
pub const DEFAULT_CONSISTENCY_THRESHOLD: f64 = 0.7;
/// Shortest drawing accepted as a sample
pub const MIN_PATTERN_POINTS: usize = 5;

/// Diagnostic attached to a rejected session
pub const INCONSISTENT_REASON: &str = "patterns too inconsistent, retry";

/// Invalid learner invocation; never changes learner state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LearnError {
    #[error("gesture name must not be empty")]
    EmptyName,

    #[error("no learning session is active")]
    NotActive,

    #[error("pattern too short: {len} points, need at least {min}")]
    PatternTooShort { len: usize, min: usize },
}

/// Learner state as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LearnerState {
    #[default]
    Idle,
    /// Waiting for drawing number `step` (1-based)
    Capturing { step: usize },
    /// All drawings captured, checking consistency
    Validating,
}

/// An in-progress learning session
#[derive(Debug, Clone)]
pub struct LearningSession {
    target_name: String,
    captured: Vec<Vec<Point>>,
}

impl LearningSession {
    fn new(target_name: String) -> Self {
        Self {
            target_name,
            captured: Vec::with_capacity(REQUIRED_SAMPLES),
        }
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Drawings captured so far
    pub fn captured(&self) -> &[Vec<Point>] {
        &self.captured
    }

    /// 1-based number of the next drawing
    pub fn step(&self) -> usize {
        self.captured.len() + 1
    }
}

/// Result of a successful `capture_pattern` call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// Drawing stored; waiting for drawing number `step`
    Captured { step: usize, captured: usize },
    /// Drawings agreed and the template was written
    Committed { name: String, mean_similarity: f64 },
    /// Drawings disagreed; the session restarts at drawing 1
    Rejected { mean_similarity: f64, reason: String },
}

/// Snapshot of learning progress for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningProgress {
    pub state: LearnerState,
    pub target_name: Option<String>,
    pub step: usize,
    pub captured: usize,
    pub required: usize,
}

/// Multi-sample gesture learner
#[derive(Debug, Clone)]
pub struct GestureLearner {
    normalizer: ShapeNormalizer,
    consistency_threshold: f64,
    min_points: usize,
    session: Option<LearningSession>,
    state: LearnerState,
}

impl GestureLearner {
    pub fn new() -> Self {
        Self {
            normalizer: ShapeNormalizer::new(),
            consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD,
            min_points: MIN_PATTERN_POINTS,
            session: None,
            state: LearnerState::Idle,
        }
    }

    /// Set the consistency threshold, clamped to \[0, 1\].
    pub fn with_consistency_threshold(mut self, threshold: f64) -> Self {
        self.consistency_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points.max(2);
        self
    }

    /// Begin learning `name`. An active session is discarded first.
    pub fn start(&mut self, name: &str) -> Result<(), LearnError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LearnError::EmptyName);
        }
        if let Some(prior) = self.session.take() {
            debug!(name = %prior.target_name, "Discarding prior learning session");
        }
        self.session = Some(LearningSession::new(name.to_string()));
        self.state = LearnerState::Capturing { step: 1 };
        info!(name = %name, "Started learning session");
        Ok(())
    }

    /// Store one drawing; validates and commits after the third.
    pub fn capture_pattern(
        &mut self,
        raw: &[Point],
        library: &mut TemplateLibrary,
    ) -> Result<CaptureOutcome, LearnError> {
        let min = self.min_points;
        let session = self.session.as_mut().ok_or(LearnError::NotActive)?;
        if raw.len() < min {
            return Err(LearnError::PatternTooShort {
                len: raw.len(),
                min,
            });
        }

        session.captured.push(raw.to_vec());
        let captured = session.captured.len();
        debug!(name = %session.target_name, captured, "Captured learning sample");

        if captured < REQUIRED_SAMPLES {
            let step = session.step();
            self.state = LearnerState::Capturing { step };
            return Ok(CaptureOutcome::Captured { step, captured });
        }

        self.state = LearnerState::Validating;
        Ok(self.validate(library))
    }

    /// Discard the active session. Returns false if none was active.
    pub fn cancel(&mut self) -> bool {
        self.state = LearnerState::Idle;
        match self.session.take() {
            Some(session) => {
                info!(name = %session.target_name, "Cancelled learning session");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn state(&self) -> LearnerState {
        self.state
    }

    pub fn session(&self) -> Option<&LearningSession> {
        self.session.as_ref()
    }

    pub fn progress(&self) -> LearningProgress {
        let (target_name, step, captured) = match &self.session {
            Some(s) => (Some(s.target_name.clone()), s.step(), s.captured.len()),
            None => (None, 0, 0),
        };
        LearningProgress {
            state: self.state,
            target_name,
            step,
            captured,
            required: REQUIRED_SAMPLES,
        }
    }

    fn validate(&mut self, library: &mut TemplateLibrary) -> CaptureOutcome {
        let Some(session) = self.session.as_mut() else {
            self.state = LearnerState::Idle;
            return CaptureOutcome::Rejected {
                mean_similarity: 0.0,
                reason: LearnError::NotActive.to_string(),
            };
        };

        let normalized: Option<Vec<_>> = session
            .captured
            .iter()
            .map(|raw| self.normalizer.normalize(raw))
            .collect();

        let Some(normalized) = normalized else {
            session.captured.clear();
            self.state = LearnerState::Capturing { step: 1 };
            info!(name = %session.target_name, "Rejected learning samples: degenerate drawing");
            return CaptureOutcome::Rejected {
                mean_similarity: 0.0,
                reason: "a drawing has no usable shape, retry".to_string(),
            };
        };

        let mut total = 0.0;
        let mut pairs = 0;
        for i in 0..normalized.len() {
            for j in (i + 1)..normalized.len() {
                total += similarity(&normalized[i], &normalized[j], REFERENCE_SIZE);
                pairs += 1;
            }
        }
        let mean_similarity = if pairs > 0 { total / pairs as f64 } else { 0.0 };

        if mean_similarity > self.consistency_threshold {
            let name = session.target_name.clone();
            let template = GestureTemplate::new(name.clone(), normalized[0].clone())
                .with_outline(self.normalizer.outline(&session.captured[0]));
            let replaced = library.insert(template).is_some();
            self.session = None;
            self.state = LearnerState::Idle;
            info!(name = %name, mean_similarity, replaced, "Committed gesture template");
            CaptureOutcome::Committed {
                name,
                mean_similarity,
            }
        } else {
            session.captured.clear();
            self.state = LearnerState::Capturing { step: 1 };
            info!(
                name = %session.target_name,
                mean_similarity,
                threshold = self.consistency_threshold,
                "Rejected inconsistent learning samples"
            );
            CaptureOutcome::Rejected {
                mean_similarity,
                reason: INCONSISTENT_REASON.to_string(),
            }
        }
    }
}

impl Default for GestureLearner {
    fn default() -> Self {
        Self::new()
    }
}
