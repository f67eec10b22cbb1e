//! Plane geometry shared by capture, trail and recognition
//!
//! Everything downstream of the tip selector works on plain `f64` points
//! in pixel space (or in a normalized gesture space once a path has been
//! through the shape normalizer).

pub mod point;

pub use point::{centroid, path_length, BoundingBox, Point};
