//! Workflow Module
//!
//! The per-tick engine that ties capture, trail and recognition together,
//! and recorded tracking traces for offline replay.

pub mod engine;
pub mod recording;

pub use engine::{GestureEngine, TickOutput, TipReading};
pub use recording::{ReplayEvent, TraceMetadata, TrackingFrame, TrackingTrace};
