//! Shape analysis
//!
//! Canonicalizes drawn paths and scores how alike two canonical paths are.
//! Shared by live matching and by learning.

pub mod normalization;
pub mod similarity;

pub use normalization::{
    NormalizedPath, PathLengthError, ShapeNormalizer, OUTLINE_SIZE, REFERENCE_SIZE, RESAMPLE_POINTS,
};
pub use similarity::{mean_distance, similarity};
