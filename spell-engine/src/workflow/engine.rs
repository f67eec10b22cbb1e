//! Gesture Engine
//!
//! Owns every piece of per-session state and drives the tick pipeline:
//!
//! 1. scale landmarks into viewport pixels and pick the tip
//! 2. smooth the tip and extend the trail
//! 3. append the gated raw tip to the capture window
//! 4. match the window against the library (rate limited, not while learning)
//!
//! Rendering is a separate entry point so the trail fades on the display
//! clock even when tracking stalls. Instances share nothing; several can run
//! side by side.

use crate::app::Config;
use crate::capture::{CaptureBuffer, LandmarkFrame, PointSmoother, TipSelector, Viewport};
use crate::geometry::Point;
use crate::recognition::{
    CaptureOutcome, GestureLearner, GestureMatch, GestureMatcher, GestureTemplate, ImportSummary,
    LearnError, LearningProgress, MatchCooldown, MatchStrategy, TemplateLibrary,
};
use crate::time::Timestamp;
use crate::trail::{TrailBuffer, TrailSegment};
use serde::Serialize;
use tracing::{debug, info, trace};

/// Tip indicator state for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TipReading {
    /// Smoothed tip position, kept through the loss grace window
    pub point: Option<Point>,
    /// Detector confidence of this tick's reading (0 when absent)
    pub confidence: f64,
    /// Whether the tip indicator should be drawn
    pub visible: bool,
}

impl TipReading {
    fn hidden() -> Self {
        Self {
            point: None,
            confidence: 0.0,
            visible: false,
        }
    }
}

/// Everything one tracking tick produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickOutput {
    pub tip: TipReading,
    /// Trail segments to draw this tick
    pub trail: Vec<TrailSegment>,
    /// Gesture recognized on this tick, if any
    pub recognized: Option<GestureMatch>,
}

/// Timing and threshold settings taken from [`Config`]
#[derive(Debug, Clone, Copy)]
struct Settings {
    confidence_threshold: f64,
    loss_grace_ms: u64,
    capture_reset_ms: u64,
    trail_ttl_ms: u64,
}

/// Tracking-loss bookkeeping
#[derive(Debug, Clone, Copy, Default)]
struct LossState {
    /// Last tick with a visible tip
    last_seen: Option<Timestamp>,
    /// Last smoothed tip position
    last_tip: Option<Point>,
    /// Selector and smoother were reset in this loss episode
    history_reset: bool,
    /// Capture window was cleared in this loss episode
    capture_cleared: bool,
}

/// Per-tick gesture pipeline
#[derive(Debug, Clone)]
pub struct GestureEngine {
    selector: TipSelector,
    smoother: PointSmoother,
    trail: TrailBuffer,
    capture: CaptureBuffer,
    matcher: GestureMatcher,
    cooldown: MatchCooldown,
    learner: GestureLearner,
    library: TemplateLibrary,
    settings: Settings,
    loss: LossState,
}

impl GestureEngine {
    /// Create an engine with default settings and an empty library
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create an engine from configuration with an empty library
    pub fn from_config(config: &Config) -> Self {
        let tracking = &config.tracking;
        let recognition = &config.recognition;
        Self {
            selector: TipSelector::new()
                .with_priority(&tracking.tip_priority)
                .with_max_velocity(tracking.max_velocity_px)
                .with_velocity_penalty(tracking.velocity_penalty)
                .with_reanchor_after(tracking.reanchor_after),
            smoother: PointSmoother::new(config.smoothing.window),
            trail: TrailBuffer::with_stroke_width(config.trail.stroke_width),
            capture: CaptureBuffer::with_capacity(recognition.capture_window),
            matcher: GestureMatcher::new()
                .with_threshold(recognition.threshold)
                .with_strategy(recognition.strategy)
                .with_min_points(recognition.min_points),
            cooldown: MatchCooldown::new(recognition.cooldown_ms, recognition.match_interval_ms),
            learner: GestureLearner::new()
                .with_consistency_threshold(config.learning.consistency_threshold)
                .with_min_points(recognition.min_points),
            library: TemplateLibrary::new(),
            settings: Settings {
                confidence_threshold: tracking.confidence_threshold,
                loss_grace_ms: tracking.loss_grace_ms,
                capture_reset_ms: tracking.capture_reset_ms.max(tracking.loss_grace_ms),
                trail_ttl_ms: config.trail.ttl_ms,
            },
            loss: LossState::default(),
        }
    }

    /// Use `library` as the template library
    pub fn with_library(mut self, library: TemplateLibrary) -> Self {
        self.library = library;
        self
    }

    /// Process one tracking tick.
    ///
    /// `frame` holds landmarks in normalized `[0, 1]` coordinates; an empty
    /// frame means nothing was detected.
    pub fn on_tracking_event(
        &mut self,
        frame: &LandmarkFrame,
        viewport: Viewport,
        now: Timestamp,
    ) -> TickOutput {
        let landmarks = frame.to_pixels(viewport);
        let selection = self
            .selector
            .select_tip(&landmarks, self.settings.confidence_threshold);

        let (tip, recognized) = match selection.point {
            Some(raw) => {
                let smoothed = self.smoother.smooth(raw);
                self.trail.push(smoothed.x, smoothed.y, now);
                self.loss = LossState {
                    last_seen: Some(now),
                    last_tip: Some(smoothed),
                    history_reset: false,
                    capture_cleared: false,
                };
                // A held reading repeats the last accepted point
                if !selection.held {
                    self.capture.push(raw);
                }
                let tip = TipReading {
                    point: Some(smoothed),
                    confidence: selection.confidence,
                    visible: true,
                };
                (tip, self.try_match(now))
            }
            None => (self.on_tip_lost(now), None),
        };

        TickOutput {
            tip,
            trail: self.render(now),
            recognized,
        }
    }

    fn try_match(&mut self, now: Timestamp) -> Option<GestureMatch> {
        if self.learner.is_active()
            || self.capture.len() < self.matcher.min_points()
            || !self.cooldown.ready(now)
        {
            return None;
        }

        self.cooldown.record_attempt(now);
        let hit = self.matcher.match_path(&self.capture.to_path(), &self.library)?;
        self.cooldown.record_success(now);
        self.capture.clear();
        info!(name = %hit.name, score = hit.score, "Gesture recognized");
        Some(hit)
    }

    fn on_tip_lost(&mut self, now: Timestamp) -> TipReading {
        let Some(last_seen) = self.loss.last_seen else {
            return TipReading::hidden();
        };
        let gone_ms = now.millis_since(last_seen);

        if gone_ms >= self.settings.loss_grace_ms && !self.loss.history_reset {
            self.selector.reset();
            self.smoother.reset();
            self.loss.history_reset = true;
            debug!(gone_ms, "Tracking lost; tip history reset");
        }
        if gone_ms >= self.settings.capture_reset_ms && !self.loss.capture_cleared {
            let dropped = self.capture.len();
            self.capture.clear();
            self.loss.capture_cleared = true;
            let stats = self.capture.stats();
            debug!(
                gone_ms,
                dropped,
                pushed = stats.points_pushed,
                evicted = stats.points_evicted,
                peak = stats.peak_occupancy,
                "Tracking lost; capture window cleared"
            );
        }

        if self.loss.history_reset {
            TipReading::hidden()
        } else {
            trace!(gone_ms, "Tip missing within grace window");
            TipReading {
                point: self.loss.last_tip,
                confidence: 0.0,
                visible: true,
            }
        }
    }

    /// Prune and render the trail; call once per display refresh.
    pub fn render(&mut self, now: Timestamp) -> Vec<TrailSegment> {
        self.trail.render(now, self.settings.trail_ttl_ms)
    }

    /// Empty the trail
    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }

    /// Authoritative rotation-invariant match of the current capture window.
    pub fn recognize(&self) -> Option<GestureMatch> {
        self.matcher.recognize(&self.capture.to_path(), &self.library)
    }

    /// Every template's score for the current capture window, best first.
    pub fn rank(&self, strategy: MatchStrategy) -> Vec<GestureMatch> {
        self.matcher
            .rank_with(&self.capture.to_path(), &self.library, strategy)
    }

    /// Begin learning `name`; the capture window starts empty.
    pub fn start_learning(&mut self, name: &str) -> Result<(), LearnError> {
        self.learner.start(name)?;
        self.capture.clear();
        Ok(())
    }

    /// Hand the current capture window to the learner as one drawing.
    ///
    /// Only the last `capture_window` points are kept, so the start of a
    /// drawing longer than the window is lost. The window is cleared when
    /// the drawing is accepted and kept when it is refused.
    pub fn capture_pattern(&mut self) -> Result<CaptureOutcome, LearnError> {
        let path = self.capture.to_path();
        let evicted = self.capture.evicted_since_clear();
        if evicted > 0 && self.learner.is_active() {
            debug!(
                evicted,
                kept = path.len(),
                "Drawing outgrew the capture window; its start was dropped"
            );
        }
        let outcome = self.learner.capture_pattern(&path, &mut self.library)?;
        self.capture.clear();
        Ok(outcome)
    }

    /// Discard the learning session. Returns false if none was active.
    pub fn cancel_learning(&mut self) -> bool {
        self.learner.cancel()
    }

    pub fn learning_progress(&self) -> LearningProgress {
        self.learner.progress()
    }

    pub fn is_learning(&self) -> bool {
        self.learner.is_active()
    }

    /// Names of all templates, sorted
    pub fn list_templates(&self) -> Vec<String> {
        self.library.names()
    }

    /// Remove a template. Returns false if it did not exist.
    pub fn delete_template(&mut self, name: &str) -> bool {
        self.library.remove(name).is_some()
    }

    /// Normalize and add a batch of raw drawings keyed by name
    pub fn import_templates<I>(&mut self, drawings: I) -> ImportSummary
    where
        I: IntoIterator<Item = (String, Vec<Point>)>,
    {
        self.library.import(drawings)
    }

    /// Add or replace a single template
    pub fn insert_template(&mut self, template: GestureTemplate) {
        self.library.insert(template);
    }

    /// Read access for persistence
    pub fn templates(&self) -> &TemplateLibrary {
        &self.library
    }

    /// Current capture window, oldest first
    pub fn capture_path(&self) -> Vec<Point> {
        self.capture.to_path()
    }

    /// Number of points in the trail
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new()
    }
}
