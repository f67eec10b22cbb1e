//! Engine Pipeline Tests
//!
//! Drives `GestureEngine` tick by tick the way a tracking loop would:
//! - teaching a spell through the learner sub-interface
//! - live recognition with cooldown
//! - tracking loss, trail fading and replay of recorded traces

use spell_engine::app::Config;
use spell_engine::capture::{Landmark, LandmarkFrame, Viewport};
use spell_engine::geometry::Point;
use spell_engine::recognition::{CaptureOutcome, GestureMatch, LearnerState, MatchStrategy};
use spell_engine::time::Timestamp;
use spell_engine::workflow::{GestureEngine, TrackingTrace};
use std::f64::consts::PI;

// ============================================================================
// Helper Functions
// ============================================================================

const VIEW: Viewport = Viewport {
    width: 1000.0,
    height: 1000.0,
};
const TICK_MS: u64 = 16;

fn jitter(i: usize, seed: u32, amp: f64) -> f64 {
    amp * (i as f64 * 12.9898 + seed as f64 * 78.233).sin()
}

/// Closed circle of 25 pixel positions
fn circle_px(seed: u32, r: f64, phase: f64, cx: f64, cy: f64) -> Vec<Point> {
    (0..25)
        .map(|i| {
            let a = phase + 2.0 * PI * i as f64 / 24.0;
            Point::new(
                cx + r * a.cos() + jitter(2 * i, seed, 2.0),
                cy + r * a.sin() + jitter(2 * i + 1, seed, 2.0),
            )
        })
        .collect()
}

fn line_px() -> Vec<Point> {
    (0..30)
        .map(|i| Point::new(200.0 + i as f64 * 20.0, 300.0 + jitter(i, 3, 2.0)))
        .collect()
}

/// A detected hand with the index fingertip (and every other landmark) at `p`
fn hand_at(p: Point) -> LandmarkFrame {
    LandmarkFrame::new(vec![
        Landmark::new(p.x / VIEW.width, p.y / VIEW.height, 0.95);
        21
    ])
}

/// Feed one frame per point starting at `start_ms`; returns the end time and
/// every recognition.
fn draw(engine: &mut GestureEngine, points: &[Point], start_ms: u64) -> (u64, Vec<GestureMatch>) {
    let mut hits = Vec::new();
    let mut t = start_ms;
    for p in points {
        let out = engine.on_tracking_event(&hand_at(*p), VIEW, Timestamp::from_millis(t));
        hits.extend(out.recognized);
        t += TICK_MS;
    }
    (t, hits)
}

/// Let tracking drop out long enough to reset tip history
fn lose_tracking(engine: &mut GestureEngine, t: u64) -> u64 {
    let t = t + 1_200;
    engine.on_tracking_event(&LandmarkFrame::empty(), VIEW, Timestamp::from_millis(t));
    t + 100
}

/// Teach "Circle" through the engine and return the next free timestamp
fn teach_circle(engine: &mut GestureEngine) -> u64 {
    engine.start_learning("Circle").unwrap();
    let mut t = 0;
    for k in 0..3u32 {
        let drawing = circle_px(k, 150.0 + 10.0 * k as f64, 0.2 * k as f64, 500.0, 400.0);
        let (end, hits) = draw(engine, &drawing, t);
        assert!(hits.is_empty(), "no live matching while learning");

        let outcome = engine.capture_pattern().unwrap();
        if k < 2 {
            assert_eq!(
                outcome,
                CaptureOutcome::Captured {
                    step: k as usize + 2,
                    captured: k as usize + 1
                }
            );
        } else {
            assert!(matches!(outcome, CaptureOutcome::Committed { .. }));
        }
        t = lose_tracking(engine, end);
    }
    t
}

// ============================================================================
// Learning Through The Engine
// ============================================================================

#[test]
fn test_teach_circle_through_engine() {
    let mut engine = GestureEngine::new();
    teach_circle(&mut engine);

    assert_eq!(engine.list_templates(), vec!["Circle".to_string()]);
    assert!(!engine.is_learning());
    assert_eq!(engine.learning_progress().state, LearnerState::Idle);
}

#[test]
fn test_learning_progress_reports_steps() {
    let mut engine = GestureEngine::new();
    engine.start_learning("Circle").unwrap();
    let (_, _) = draw(&mut engine, &circle_px(0, 150.0, 0.0, 500.0, 400.0), 0);
    engine.capture_pattern().unwrap();

    let progress = engine.learning_progress();
    assert_eq!(progress.state, LearnerState::Capturing { step: 2 });
    assert_eq!(progress.captured, 1);
    assert_eq!(progress.required, 3);
    assert_eq!(progress.target_name.as_deref(), Some("Circle"));
    assert!(engine.capture_path().is_empty());

    assert!(engine.cancel_learning());
    assert_eq!(engine.learning_progress().state, LearnerState::Idle);
    assert!(engine.list_templates().is_empty());
}

#[test]
fn test_learning_drawing_capped_by_capture_window() {
    let mut config = Config::default();
    config.recognition.capture_window = 10;
    let mut engine = GestureEngine::from_config(&config);
    engine.start_learning("Circle").unwrap();

    let drawing = circle_px(0, 150.0, 0.0, 500.0, 400.0);
    draw(&mut engine, &drawing, 0);

    // Only the tail of the drawing reaches the learner
    let path = engine.capture_path();
    assert_eq!(path.len(), 10);
    assert!(path[0].distance_to(&drawing[15]) < 1e-9);
    assert!(path[9].distance_to(&drawing[24]) < 1e-9);

    let outcome = engine.capture_pattern().unwrap();
    assert_eq!(outcome, CaptureOutcome::Captured { step: 2, captured: 1 });
    assert!(engine.capture_path().is_empty());
}

// ============================================================================
// Live Recognition
// ============================================================================

#[test]
fn test_live_recognition_fires_once() {
    let mut engine = GestureEngine::new();
    let t = teach_circle(&mut engine);

    let mut stroke = circle_px(5, 120.0, 0.3, 450.0, 450.0);
    let end = stroke[stroke.len() - 1];
    stroke.extend(std::iter::repeat(end).take(10));

    let (_, hits) = draw(&mut engine, &stroke, t);
    assert_eq!(hits.len(), 1, "cooldown suppresses repeats: {:?}", hits);
    assert_eq!(hits[0].name, "Circle");
    assert!(hits[0].score > 0.9);
    // A match empties the capture window
    assert!(engine.capture_path().len() < stroke.len());
}

#[test]
fn test_line_is_not_recognized() {
    let mut engine = GestureEngine::new();
    let t = teach_circle(&mut engine);

    let (_, hits) = draw(&mut engine, &line_px(), t);
    assert!(hits.is_empty());
    assert!(engine.recognize().is_none());
}

#[test]
fn test_authoritative_recognize_on_capture_window() {
    // One early attempt on a short arc, then no live matching for a minute
    let mut config = Config::default();
    config.recognition.match_interval_ms = 60_000;
    let mut engine = GestureEngine::from_config(&config);
    let t = teach_circle(&mut engine);

    let mut stroke = circle_px(5, 120.0, 0.3, 450.0, 450.0);
    let end = stroke[stroke.len() - 1];
    stroke.extend(std::iter::repeat(end).take(10));
    let (_, hits) = draw(&mut engine, &stroke, t);
    assert!(hits.is_empty());
    assert_eq!(engine.capture_path().len(), stroke.len());

    let hit = engine.recognize().expect("full circle in capture window");
    assert_eq!(hit.name, "Circle");
    assert!(hit.score > 0.9);

    let ranked = engine.rank(MatchStrategy::RotationInvariant);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].name, "Circle");
}

#[test]
fn test_engines_are_independent() {
    let mut taught = GestureEngine::new();
    let t = teach_circle(&mut taught);
    let mut fresh = GestureEngine::new();

    let mut stroke = circle_px(5, 120.0, 0.3, 450.0, 450.0);
    let end = stroke[stroke.len() - 1];
    stroke.extend(std::iter::repeat(end).take(10));

    let (_, fresh_hits) = draw(&mut fresh, &stroke, t);
    let (_, taught_hits) = draw(&mut taught, &stroke, t);
    assert!(fresh_hits.is_empty());
    assert_eq!(taught_hits.len(), 1);
    assert!(fresh.list_templates().is_empty());
}

// ============================================================================
// Tracking Loss And Trail
// ============================================================================

#[test]
fn test_velocity_gate_holds_tip() {
    let mut engine = GestureEngine::new();
    draw(&mut engine, &[Point::new(100.0, 100.0), Point::new(110.0, 100.0)], 0);

    // 800px jump in one tick is held at the previous point
    let out = engine.on_tracking_event(&hand_at(Point::new(910.0, 100.0)), VIEW, Timestamp::from_millis(32));
    assert!(out.tip.visible);
    assert!(out.tip.confidence < 0.95);
    assert_eq!(engine.capture_path().len(), 2);
}

#[test]
fn test_tip_follows_relocated_hand() {
    let mut engine = GestureEngine::new();
    let old = Point::new(100.0, 500.0);
    let new = Point::new(700.0, 500.0);
    engine.on_tracking_event(&hand_at(old), VIEW, Timestamp::from_millis(0));

    let mut t = 0;
    for _ in 0..4 {
        t += 33;
        let out = engine.on_tracking_event(&hand_at(new), VIEW, Timestamp::from_millis(t));
        assert!(out.tip.point.is_some_and(|p| p.distance_to(&old) < 1e-9));
        assert!((out.tip.confidence - 0.95 * 0.7).abs() < 1e-9);
    }

    // The hand stayed put, so the gate takes the new position as its anchor
    for _ in 0..20 {
        t += 33;
        engine.on_tracking_event(&hand_at(new), VIEW, Timestamp::from_millis(t));
    }
    let out = engine.on_tracking_event(&hand_at(new), VIEW, Timestamp::from_millis(t + 33));
    assert!((out.tip.confidence - 0.95).abs() < 1e-12);
    assert!(out.tip.point.is_some_and(|p| p.distance_to(&new) < 1e-9));

    let path = engine.capture_path();
    assert!(path[0].distance_to(&old) < 1e-9);
    assert!(path[1..].iter().all(|p| p.distance_to(&new) < 1e-9));
    assert_eq!(path.len(), 22);
}

#[test]
fn test_tracking_loss_resets_history_but_not_learning() {
    let mut engine = GestureEngine::new();
    engine.start_learning("Circle").unwrap();
    let (end, _) = draw(&mut engine, &circle_px(0, 150.0, 0.0, 500.0, 400.0), 0);
    assert_eq!(engine.capture_path().len(), 25);

    let t = lose_tracking(&mut engine, end);
    assert!(engine.capture_path().is_empty());
    assert!(engine.is_learning());

    // After the reset a far-away first reading is accepted
    let out = engine.on_tracking_event(&hand_at(Point::new(50.0, 900.0)), VIEW, Timestamp::from_millis(t));
    assert!((out.tip.confidence - 0.95).abs() < 1e-12);
    let path = engine.capture_path();
    assert_eq!(path.len(), 1);
    assert!(path[0].distance_to(&Point::new(50.0, 900.0)) < 1e-9);
}

#[test]
fn test_trail_fades_on_render_clock() {
    let config = Config::default();
    let ttl = config.trail.ttl_ms;
    let mut engine = GestureEngine::from_config(&config);

    let (end, _) = draw(&mut engine, &line_px()[..10], 0);
    let live = engine.render(Timestamp::from_millis(end));
    assert_eq!(live.len(), 9);
    assert!(live.iter().all(|s| s.opacity > 0.9 && s.width > 0.0));

    let half = engine.render(Timestamp::from_millis(ttl / 2));
    assert!((half[0].opacity - 0.5).abs() < 0.01);

    assert!(engine.render(Timestamp::from_millis(end + ttl)).is_empty());
    assert_eq!(engine.trail_len(), 0);
}

#[test]
fn test_clear_trail() {
    let mut engine = GestureEngine::new();
    draw(&mut engine, &line_px()[..5], 0);
    engine.clear_trail();
    assert!(engine.render(Timestamp::from_millis(100)).is_empty());
}

// ============================================================================
// Replay
// ============================================================================

#[test]
fn test_replay_recorded_trace() {
    let mut engine = GestureEngine::new();
    let t = teach_circle(&mut engine);

    let mut trace = TrackingTrace::new("circle", VIEW);
    let mut stroke = circle_px(5, 120.0, 0.3, 450.0, 450.0);
    let end = stroke[stroke.len() - 1];
    stroke.extend(std::iter::repeat(end).take(10));
    for (i, p) in stroke.iter().enumerate() {
        trace.push_frame(t + i as u64 * TICK_MS, hand_at(*p).landmarks).unwrap();
    }

    let events = trace.replay(&mut engine, 8);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "Circle");
    assert!(events[0].t_ms >= t);
}
