//! Gesture Templates

use crate::analysis::{NormalizedPath, ShapeNormalizer};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// A named gesture in canonical form
///
/// The name is the identity: a library holds at most one template per name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureTemplate {
    /// Unique spell name
    pub name: String,
    /// Rotation-invariant normalized form
    pub path: NormalizedPath,
    /// Bounding-box outline form, used by the low-latency strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<NormalizedPath>,
}

impl GestureTemplate {
    pub fn new(name: impl Into<String>, path: NormalizedPath) -> Self {
        Self {
            name: name.into(),
            path,
            outline: None,
        }
    }

    pub fn with_outline(mut self, outline: Option<NormalizedPath>) -> Self {
        self.outline = outline;
        self
    }

    /// Build both normalized forms from one raw drawing.
    ///
    /// Returns `None` when the drawing has no usable shape.
    pub fn from_sample(name: impl Into<String>, raw: &[Point]) -> Option<Self> {
        Self::from_sample_with(&ShapeNormalizer::new(), name, raw)
    }

    pub fn from_sample_with(
        normalizer: &ShapeNormalizer,
        name: impl Into<String>,
        raw: &[Point],
    ) -> Option<Self> {
        let path = normalizer.normalize(raw)?;
        Some(Self::new(name, path).with_outline(normalizer.outline(raw)))
    }

    /// Whether the bounding-box strategy can score against this template
    pub fn has_outline(&self) -> bool {
        self.outline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sample() {
        let raw = vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 40.0),
            Point::new(60.0, 0.0),
        ];
        let template = GestureTemplate::from_sample("Wedge", &raw).unwrap();
        assert_eq!(template.name, "Wedge");
        assert!(template.has_outline());
    }

    #[test]
    fn test_from_degenerate_sample() {
        assert!(GestureTemplate::from_sample("Dot", &[Point::new(1.0, 1.0)]).is_none());
    }

    #[test]
    fn test_serialization_omits_missing_outline() {
        let raw = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let template = GestureTemplate::from_sample("Line", &raw).unwrap().with_outline(None);
        let json = serde_json::to_string(&template).unwrap();
        assert!(!json.contains("outline"));

        let loaded: GestureTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.name, "Line");
        assert!(loaded.outline.is_none());
        for (a, b) in loaded.path.iter().zip(template.path.iter()) {
            assert!(a.distance_to(b) < 1e-9);
        }
    }
}
