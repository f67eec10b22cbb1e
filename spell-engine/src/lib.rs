//! # Spell Engine
//!
//! Gesture capture, smoothing and recognition for wand-style drawing with a
//! tracked fingertip.
//!
//! ## Overview
//!
//! A hand-tracking collaborator delivers landmark frames; the engine picks a
//! trustworthy tip, smooths it, keeps a fading trail for display, and matches
//! the recent stroke against a library of named gesture templates ("spells").
//! New spells are taught by drawing them three times.
//!
//! ## Quick Start
//!
//! ```no_run
//! use spell_engine::{Config, GestureEngine, Timestamp};
//! use spell_engine::capture::{Landmark, LandmarkFrame, Viewport};
//!
//! let mut engine = GestureEngine::from_config(&Config::default());
//!
//! // One tracking tick: 21 hand landmarks in normalized [0, 1] coordinates
//! let frame = LandmarkFrame::new(vec![Landmark::new(0.5, 0.5, 0.95); 21]);
//! let out = engine.on_tracking_event(&frame, Viewport::default(), Timestamp::now());
//! if let Some(hit) = out.recognized {
//!     println!("cast {} ({:.2})", hit.name, hit.score);
//! }
//!
//! // Every display refresh, independently of tracking
//! let segments = engine.render(Timestamp::now());
//! # let _ = segments;
//! ```
//!
//! ## Architecture
//!
//! - [`time`]: millisecond timestamps
//! - [`geometry`]: points, centroids and bounding boxes
//! - [`capture`]: tip selection, velocity gate, smoothing and the capture window
//! - [`trail`]: the time-decaying trail
//! - [`analysis`]: shape normalization and similarity scoring
//! - [`recognition`]: templates, the template library, matcher and learner
//! - [`workflow`]: the per-tick engine and recorded tracking traces
//! - [`app`]: configuration and CLI definitions
//!
//! ## Tick Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Landmarks  │───▶│ TipSelector │───▶│  Smoother   │───▶│    Trail    │
//! │  (tracker)  │    │ (vel. gate) │    │ (mov. avg.) │    │  (render)   │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                           │
//!                           ▼
//!                    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!                    │   Capture   │───▶│ Normalizer  │───▶│  Matcher /  │
//!                    │   Window    │    │    ($1)     │    │   Learner   │
//!                    └─────────────┘    └─────────────┘    └─────────────┘
//! ```

pub mod analysis;
pub mod app;
pub mod capture;
pub mod geometry;
pub mod recognition;
pub mod time;
pub mod trail;
pub mod workflow;

// Re-export commonly used types
pub use analysis::{NormalizedPath, ShapeNormalizer};
pub use app::Config;
pub use geometry::Point;
pub use recognition::{
    GestureLearner, GestureMatch, GestureMatcher, GestureTemplate, LearnError, MatchStrategy,
    SharedTemplateLibrary, TemplateLibrary,
};
pub use time::Timestamp;
pub use workflow::{GestureEngine, TickOutput, TrackingTrace};

/// Result type alias for the spell engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the spell engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template library error: {0}")]
    Library(String),

    #[error("Tracking trace error: {0}")]
    Trace(String),

    #[error("Learning error: {0}")]
    Learn(#[from] LearnError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
