//! Tracking Traces
//!
//! Recorded landmark streams that can be replayed through a
//! [`GestureEngine`] to reproduce recognition offline.

use super::engine::GestureEngine;
use crate::capture::{Landmark, LandmarkFrame, Viewport};
use crate::time::Timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Current trace format version
pub const TRACE_FORMAT_VERSION: &str = "1.0";

/// Trace metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceMetadata {
    /// Trace name
    pub name: String,
    /// Recording start time
    pub recorded_at: DateTime<Utc>,
    /// Viewport the landmarks are projected onto
    pub viewport: Viewport,
    /// Total frame count
    pub frame_count: usize,
    /// Version of the trace format
    pub format_version: String,
}

impl TraceMetadata {
    pub fn new(name: String, viewport: Viewport) -> Self {
        Self {
            name,
            recorded_at: Utc::now(),
            viewport,
            frame_count: 0,
            format_version: TRACE_FORMAT_VERSION.to_string(),
        }
    }
}

impl Default for TraceMetadata {
    fn default() -> Self {
        Self::new(String::new(), Viewport::default())
    }
}

/// One recorded tracking tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingFrame {
    /// Milliseconds since the start of the trace
    pub t_ms: u64,
    #[serde(flatten)]
    pub frame: LandmarkFrame,
}

/// A recognition observed during replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayEvent {
    pub t_ms: u64,
    pub name: String,
    pub score: f64,
}

/// A recorded tracking session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingTrace {
    /// Trace metadata
    pub metadata: TraceMetadata,
    /// Frames in non-decreasing time order
    pub frames: Vec<TrackingFrame>,
}

impl TrackingTrace {
    /// Create a new empty trace
    pub fn new(name: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            metadata: TraceMetadata::new(name.into(), viewport),
            frames: Vec::new(),
        }
    }

    /// Append a frame; its time must not precede the last frame.
    pub fn push_frame(&mut self, t_ms: u64, landmarks: Vec<Landmark>) -> crate::Result<()> {
        if let Some(last) = self.frames.last() {
            if t_ms < last.t_ms {
                return Err(crate::Error::Trace(format!(
                    "frame at {} ms precedes previous frame at {} ms",
                    t_ms, last.t_ms
                )));
            }
        }
        self.frames.push(TrackingFrame {
            t_ms,
            frame: LandmarkFrame::new(landmarks),
        });
        self.metadata.frame_count = self.frames.len();
        Ok(())
    }

    /// Check that frames are in non-decreasing time order
    pub fn validate(&self) -> crate::Result<()> {
        for (i, pair) in self.frames.windows(2).enumerate() {
            if pair[1].t_ms < pair[0].t_ms {
                return Err(crate::Error::Trace(format!(
                    "frame {} at {} ms precedes frame {} at {} ms",
                    i + 1,
                    pair[1].t_ms,
                    i,
                    pair[0].t_ms
                )));
            }
        }
        Ok(())
    }

    /// Save trace to a file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load trace from a file.
    ///
    /// Logs a warning if the trace was saved with an unknown format version,
    /// but still attempts to deserialize it. Out-of-order frames are an error.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut trace: TrackingTrace = serde_json::from_str(&content)?;
        if trace.metadata.format_version != TRACE_FORMAT_VERSION {
            warn!(
                name = %trace.metadata.name,
                found = %trace.metadata.format_version,
                expected = TRACE_FORMAT_VERSION,
                "Trace has different format version; some fields may use default values"
            );
        }
        trace.validate()?;
        trace.metadata.frame_count = trace.frames.len();
        Ok(trace)
    }

    /// Drive `engine` through every frame.
    ///
    /// Render ticks are interleaved every `render_every_ms` (0 disables them)
    /// so the trail ages as it would live. Returns every recognition.
    pub fn replay(&self, engine: &mut GestureEngine, render_every_ms: u64) -> Vec<ReplayEvent> {
        let viewport = self.metadata.viewport;
        let mut events = Vec::new();
        let mut next_render = self.frames.first().map(|f| f.t_ms).unwrap_or(0);

        for frame in &self.frames {
            if render_every_ms > 0 {
                while next_render < frame.t_ms {
                    engine.render(Timestamp::from_millis(next_render));
                    next_render += render_every_ms;
                }
            }
            let out = engine.on_tracking_event(&frame.frame, viewport, Timestamp::from_millis(frame.t_ms));
            if let Some(hit) = out.recognized {
                events.push(ReplayEvent {
                    t_ms: frame.t_ms,
                    name: hit.name,
                    score: hit.score,
                });
            }
        }

        debug!(
            name = %self.metadata.name,
            frames = self.frames.len(),
            recognized = events.len(),
            "Replayed tracking trace"
        );
        events
    }

    /// Time between the first and last frame
    ///
    /// Zero when the frames are out of order.
    pub fn duration_ms(&self) -> u64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.t_ms.saturating_sub(first.t_ms),
            _ => 0,
        }
    }

    /// Get the number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if trace is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Default for TrackingTrace {
    fn default() -> Self {
        Self::new("untitled", Viewport::default())
    }
}
