//! Timing module
//!
//! Millisecond timestamps shared by the capture, trail and recognition
//! pipeline. The caller's clock is authoritative.

pub mod clock;

pub use clock::Timestamp;
