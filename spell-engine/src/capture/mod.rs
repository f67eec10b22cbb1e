//! Tip capture module
//!
//! Turns per-tick landmark frames into a stream of trustworthy, smoothed
//! tip positions and keeps the window the live matcher looks at.

pub mod capture_buffer;
pub mod smoothing;
pub mod tip_selector;
pub mod types;

pub use capture_buffer::{CaptureBuffer, CaptureStats, DEFAULT_CAPTURE_WINDOW};
pub use smoothing::{is_valid_movement, PointSmoother};
pub use tip_selector::TipSelector;
pub use types::*;
