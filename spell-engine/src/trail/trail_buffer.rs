//! Decaying Trail
//!
//! Keeps the recently drawn tip positions and turns them into line segments
//! whose opacity fades linearly with age. Pruning and rendering are driven by
//! the render clock, not by tracking events, so the trail keeps fading even
//! when tracking stalls.

use crate::geometry::Point;
use crate::time::Timestamp;
use serde::Serialize;
use std::collections::VecDeque;

/// Default time-to-live of a trail point (ms)
pub const DEFAULT_TTL_MS: u64 = 4_000;
/// Shortest configurable time-to-live (ms)
pub const MIN_TTL_MS: u64 = 1_000;
/// Longest configurable time-to-live (ms)
pub const MAX_TTL_MS: u64 = 8_000;
/// Default stroke width at full opacity (pixels)
pub const DEFAULT_STROKE_WIDTH: f64 = 3.0;

/// One drawn position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub position: Point,
    pub created_at: Timestamp,
}

impl TrailPoint {
    pub fn new(position: Point, created_at: Timestamp) -> Self {
        Self {
            position,
            created_at,
        }
    }

    /// Milliseconds since the point was drawn (0 if `now` is earlier)
    pub fn age(&self, now: Timestamp) -> u64 {
        now.millis_since(self.created_at)
    }

    /// `max(0, 1 - age / ttl)`; a zero TTL means fully faded.
    pub fn opacity(&self, now: Timestamp, ttl_ms: u64) -> f64 {
        if ttl_ms == 0 {
            return 0.0;
        }
        (1.0 - self.age(now) as f64 / ttl_ms as f64).max(0.0)
    }
}

/// A segment between two consecutive trail points, ready to draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailSegment {
    pub from: Point,
    pub to: Point,
    /// Mean of the endpoint opacities
    pub opacity: f64,
    /// Stroke width tapered by opacity
    pub width: f64,
}

/// Time-ordered queue of trail points
#[derive(Debug, Clone)]
pub struct TrailBuffer {
    points: VecDeque<TrailPoint>,
    stroke_width: f64,
}

impl TrailBuffer {
    pub fn new() -> Self {
        Self::with_stroke_width(DEFAULT_STROKE_WIDTH)
    }

    /// Create a buffer whose full-opacity stroke is `stroke_width` pixels
    pub fn with_stroke_width(stroke_width: f64) -> Self {
        Self {
            points: VecDeque::new(),
            stroke_width: stroke_width.max(0.0),
        }
    }

    pub fn push(&mut self, x: f64, y: f64, now: Timestamp) {
        self.points.push_back(TrailPoint::new(Point::new(x, y), now));
    }

    /// Remove every point whose age is at least `ttl_ms`.
    ///
    /// Returns the number of points removed.
    pub fn prune(&mut self, now: Timestamp, ttl_ms: u64) -> usize {
        let before = self.points.len();
        self.points.retain(|p| p.age(now) < ttl_ms);
        before - self.points.len()
    }

    /// Prune, then emit one segment per consecutive pair of points.
    ///
    /// Segments touching a fully faded endpoint are omitted.
    pub fn render(&mut self, now: Timestamp, ttl_ms: u64) -> Vec<TrailSegment> {
        self.prune(now, ttl_ms);

        let mut segments = Vec::with_capacity(self.points.len().saturating_sub(1));
        for (a, b) in self.points.iter().zip(self.points.iter().skip(1)) {
            let oa = a.opacity(now, ttl_ms);
            let ob = b.opacity(now, ttl_ms);
            if oa <= 0.0 || ob <= 0.0 {
                continue;
            }
            let opacity = (oa + ob) / 2.0;
            segments.push(TrailSegment {
                from: a.position,
                to: b.position,
                opacity,
                width: self.stroke_width * opacity,
            });
        }
        segments
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }
}

impl Default for TrailBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_opacity_decays_linearly() {
        let p = TrailPoint::new(Point::ORIGIN, ts(1_000));
        assert_eq!(p.opacity(ts(1_000), 4_000), 1.0);
        assert!((p.opacity(ts(3_000), 4_000) - 0.5).abs() < 1e-9);
        assert_eq!(p.opacity(ts(5_000), 4_000), 0.0);
        assert_eq!(p.opacity(ts(9_000), 4_000), 0.0);
        assert_eq!(p.opacity(ts(1_000), 0), 0.0);
    }

    #[test]
    fn test_expired_point_is_absent() {
        let ttl = 2_000;
        let mut trail = TrailBuffer::new();
        trail.push(0.0, 0.0, ts(100));
        trail.push(10.0, 0.0, ts(100));

        let segments = trail.render(ts(100 + ttl + 1), ttl);
        assert!(segments.is_empty());
        assert!(trail.is_empty());
    }

    #[test]
    fn test_prune_removes_at_exact_ttl() {
        let mut trail = TrailBuffer::new();
        trail.push(0.0, 0.0, ts(0));
        trail.push(1.0, 0.0, ts(500));
        assert_eq!(trail.prune(ts(1_000), 1_000), 1);
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_half_life_opacity() {
        let ttl = 4_000;
        let mut trail = TrailBuffer::with_stroke_width(4.0);
        trail.push(0.0, 0.0, ts(0));
        trail.push(10.0, 10.0, ts(0));

        let segments = trail.render(ts(ttl / 2), ttl);
        assert_eq!(segments.len(), 1);
        assert!((segments[0].opacity - 0.5).abs() < 1e-9);
        assert!((segments[0].width - 2.0).abs() < 1e-9);
        assert_eq!(segments[0].from, Point::new(0.0, 0.0));
        assert_eq!(segments[0].to, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_segment_opacity_is_endpoint_mean() {
        let mut trail = TrailBuffer::new();
        trail.push(0.0, 0.0, ts(0));
        trail.push(5.0, 0.0, ts(1_000));
        trail.push(10.0, 0.0, ts(2_000));

        let segments = trail.render(ts(2_000), 4_000);
        assert_eq!(segments.len(), 2);
        // endpoint opacities 0.5, 0.75, 1.0
        assert!((segments[0].opacity - 0.625).abs() < 1e-9);
        assert!((segments[1].opacity - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_renders_nothing() {
        let mut trail = TrailBuffer::new();
        trail.push(3.0, 4.0, ts(0));
        assert!(trail.render(ts(10), 4_000).is_empty());
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut trail = TrailBuffer::new();
        trail.push(0.0, 0.0, ts(0));
        trail.push(1.0, 1.0, ts(1));
        trail.clear();
        assert!(trail.is_empty());
        assert!(trail.render(ts(2), 4_000).is_empty());
    }
}
