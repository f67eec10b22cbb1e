//! Bounded Capture Window
//!
//! Holds the most recent raw (velocity-gated) tip positions that the live
//! matcher scores and the learner consumes. The window slides: once full, every push evicts the oldest
//! point, so matching always looks at the latest stroke.

use crate::geometry::Point;
use std::collections::VecDeque;

/// Default window size (points)
pub const DEFAULT_CAPTURE_WINDOW: usize = 64;

/// Counters for monitoring the capture window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Total points pushed
    pub points_pushed: u64,
    /// Points dropped off the front of a full window
    pub points_evicted: u64,
    /// Times the window was cleared
    pub clears: u64,
    /// Peak occupancy
    pub peak_occupancy: usize,
}

/// Sliding window over the most recent tip positions
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    points: VecDeque<Point>,
    capacity: usize,
    stats: CaptureStats,
    /// `stats.points_evicted` at the last clear
    evicted_at_clear: u64,
}

impl CaptureBuffer {
    /// Create a window with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPTURE_WINDOW)
    }

    /// Create a window holding at most `capacity` points (at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
            stats: CaptureStats::default(),
            evicted_at_clear: 0,
        }
    }

    /// Append a point, evicting the oldest one when full
    #[inline]
    pub fn push(&mut self, point: Point) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
            self.stats.points_evicted += 1;
        }
        self.points.push_back(point);
        self.stats.points_pushed += 1;
        self.stats.peak_occupancy = self.stats.peak_occupancy.max(self.points.len());
    }

    /// Copy of the window, oldest first
    pub fn to_path(&self) -> Vec<Point> {
        self.points.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.stats.clears += 1;
        self.evicted_at_clear = self.stats.points_evicted;
        self.points.clear();
    }

    /// Points lost off the front since the window was last cleared
    pub fn evicted_since_clear(&self) -> u64 {
        self.stats.points_evicted - self.evicted_at_clear
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.points.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let buffer = CaptureBuffer::new();
        assert_eq!(buffer.capacity(), DEFAULT_CAPTURE_WINDOW);
        assert!(buffer.is_empty());
        assert_eq!(CaptureBuffer::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn test_window_slides() {
        let mut buffer = CaptureBuffer::with_capacity(3);
        for i in 0..5 {
            buffer.push(Point::new(i as f64, 0.0));
        }
        assert!(buffer.is_full());
        let xs: Vec<f64> = buffer.to_path().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);

        let stats = buffer.stats();
        assert_eq!(stats.points_pushed, 5);
        assert_eq!(stats.points_evicted, 2);
        assert_eq!(stats.peak_occupancy, 3);
    }

    #[test]
    fn test_evictions_counted_per_fill() {
        let mut buffer = CaptureBuffer::with_capacity(2);
        for i in 0..5 {
            buffer.push(Point::new(i as f64, 0.0));
        }
        assert_eq!(buffer.evicted_since_clear(), 3);

        buffer.clear();
        assert_eq!(buffer.evicted_since_clear(), 0);
        buffer.push(Point::new(1.0, 1.0));
        buffer.push(Point::new(2.0, 2.0));
        buffer.push(Point::new(3.0, 3.0));
        assert_eq!(buffer.evicted_since_clear(), 1);
        assert_eq!(buffer.stats().points_evicted, 4);
        assert_eq!(buffer.stats().clears, 1);
    }

    #[test]
    fn test_clear() {
        let mut buffer = CaptureBuffer::with_capacity(4);
        buffer.push(Point::new(1.0, 1.0));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.stats().points_pushed, 1);
    }
}
