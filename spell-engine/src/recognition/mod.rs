//! Gesture recognition
//!
//! Named templates, the library that holds them, matching a drawn path
//! against the library, and learning new templates from repeated drawings.

pub mod learner;
pub mod library;
pub mod matcher;
pub mod template;

pub use learner::{
    CaptureOutcome, GestureLearner, LearnError, LearnerState, LearningProgress, REQUIRED_SAMPLES,
};
pub use library::{ImportSummary, SharedTemplateLibrary, TemplateLibrary};
pub use matcher::{GestureMatch, GestureMatcher, MatchCooldown, MatchStrategy};
pub use template::GestureTemplate;
