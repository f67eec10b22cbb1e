//! Trail rendering state
//!
//! A purely presentational, time-decaying record of where the tip has been.

pub mod trail_buffer;

pub use trail_buffer::{TrailBuffer, TrailPoint, TrailSegment, DEFAULT_STROKE_WIDTH, DEFAULT_TTL_MS};
