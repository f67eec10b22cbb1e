//! Configuration Management
//!
//! The tunable parameters of the engine as one TOML file. Every section is
//! optional so older or partial files keep loading with defaults.

use crate::capture::smoothing::{DEFAULT_MAX_VELOCITY, DEFAULT_WINDOW, MAX_WINDOW, MIN_WINDOW};
use crate::capture::tip_selector::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_REANCHOR_AFTER, DEFAULT_TIP_PRIORITY,
    DEFAULT_VELOCITY_PENALTY,
};
use crate::capture::DEFAULT_CAPTURE_WINDOW;
use crate::recognition::learner::DEFAULT_CONSISTENCY_THRESHOLD;
use crate::recognition::matcher::{
    DEFAULT_COOLDOWN_MS, DEFAULT_MATCH_INTERVAL_MS, DEFAULT_MIN_POINTS, DEFAULT_THRESHOLD,
};
use crate::recognition::MatchStrategy;
use crate::trail::trail_buffer::{DEFAULT_STROKE_WIDTH, DEFAULT_TTL_MS, MAX_TTL_MS, MIN_TTL_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-user data directory under `$HOME`
pub const DATA_DIR_NAME: &str = ".spellcast";
/// File name of the template library inside the data directory
pub const LIBRARY_FILE_NAME: &str = "templates.json";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tip selection and tracking-loss settings
    #[serde(default)]
    pub tracking: TrackingConfig,
    /// Moving-average settings
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    /// Trail rendering settings
    #[serde(default)]
    pub trail: TrailConfig,
    /// Live matching settings
    #[serde(default)]
    pub recognition: RecognitionConfig,
    /// Learning settings
    #[serde(default)]
    pub learning: LearningConfig,
    /// Template library location
    #[serde(default)]
    pub library: LibraryConfig,
}

/// Tip selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Minimum detector confidence for a tip candidate (exclusive)
    pub confidence_threshold: f64,
    /// Landmark indices to try as the tip, most preferred first
    pub tip_priority: Vec<usize>,
    /// Largest plausible tip movement between readings (pixels)
    pub max_velocity_px: f64,
    /// Confidence multiplier when a jump is rejected
    pub velocity_penalty: f64,
    /// Consecutive rejected readings before the gate accepts the new position
    pub reanchor_after: u32,
    /// Tip absence before selector and smoother history is dropped (ms)
    pub loss_grace_ms: u64,
    /// Tip absence before the capture window is cleared (ms)
    pub capture_reset_ms: u64,
}

/// Smoothing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Moving-average window (samples)
    pub window: usize,
}

/// Trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Time-to-live of a trail point (ms)
    pub ttl_ms: u64,
    /// Stroke width at full opacity (pixels)
    pub stroke_width: f64,
}

/// Recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Minimum similarity for a match (exclusive)
    pub threshold: f64,
    /// Strategy for live matching
    pub strategy: MatchStrategy,
    /// Quiet period after a match (ms)
    pub cooldown_ms: u64,
    /// Minimum spacing between match attempts (ms)
    pub match_interval_ms: u64,
    /// Points kept in the capture window
    pub capture_window: usize,
    /// Shortest path worth matching or learning
    pub min_points: usize,
}

/// Learning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Minimum mean pairwise similarity of the three drawings (exclusive)
    pub consistency_threshold: f64,
}

/// Template library configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Explicit library file; defaults to `~/.spellcast/templates.json`
    pub path: Option<PathBuf>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            tip_priority: DEFAULT_TIP_PRIORITY.to_vec(),
            max_velocity_px: DEFAULT_MAX_VELOCITY,
            velocity_penalty: DEFAULT_VELOCITY_PENALTY,
            reanchor_after: DEFAULT_REANCHOR_AFTER,
            loss_grace_ms: 500,
            capture_reset_ms: 1_000,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            strategy: MatchStrategy::default(),
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            match_interval_ms: DEFAULT_MATCH_INTERVAL_MS,
            capture_window: DEFAULT_CAPTURE_WINDOW,
            min_points: DEFAULT_MIN_POINTS,
        }
    }
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let t = &self.tracking;
        if !(0.0..=1.0).contains(&t.confidence_threshold) {
            return Err(crate::Error::Config(format!(
                "confidence_threshold must be in [0, 1], got {}",
                t.confidence_threshold
            )));
        }
        if t.tip_priority.is_empty() {
            return Err(crate::Error::Config(
                "tip_priority must list at least one landmark".to_string(),
            ));
        }
        if t.max_velocity_px.is_nan() || t.max_velocity_px <= 0.0 {
            return Err(crate::Error::Config(format!(
                "max_velocity_px must be > 0, got {}",
                t.max_velocity_px
            )));
        }
        if !(t.velocity_penalty > 0.0 && t.velocity_penalty <= 1.0) {
            return Err(crate::Error::Config(format!(
                "velocity_penalty must be in (0, 1], got {}",
                t.velocity_penalty
            )));
        }
        if t.reanchor_after == 0 {
            return Err(crate::Error::Config(
                "reanchor_after must be >= 1".to_string(),
            ));
        }
        if t.capture_reset_ms < t.loss_grace_ms {
            return Err(crate::Error::Config(format!(
                "capture_reset_ms ({}) must be >= loss_grace_ms ({})",
                t.capture_reset_ms, t.loss_grace_ms
            )));
        }
        if !(MIN_WINDOW..=MAX_WINDOW).contains(&self.smoothing.window) {
            return Err(crate::Error::Config(format!(
                "smoothing window must be in [{}, {}], got {}",
                MIN_WINDOW, MAX_WINDOW, self.smoothing.window
            )));
        }
        if !(MIN_TTL_MS..=MAX_TTL_MS).contains(&self.trail.ttl_ms) {
            return Err(crate::Error::Config(format!(
                "trail ttl_ms must be in [{}, {}], got {}",
                MIN_TTL_MS, MAX_TTL_MS, self.trail.ttl_ms
            )));
        }
        if self.trail.stroke_width.is_nan() || self.trail.stroke_width <= 0.0 {
            return Err(crate::Error::Config(format!(
                "stroke_width must be > 0, got {}",
                self.trail.stroke_width
            )));
        }
        let r = &self.recognition;
        if !(r.threshold > 0.0 && r.threshold <= 1.0) {
            return Err(crate::Error::Config(format!(
                "recognition threshold must be in (0, 1], got {}",
                r.threshold
            )));
        }
        if !(5..=1024).contains(&r.capture_window) {
            return Err(crate::Error::Config(format!(
                "capture_window must be in [5, 1024], got {}",
                r.capture_window
            )));
        }
        if r.min_points < 2 {
            return Err(crate::Error::Config(format!(
                "min_points must be >= 2, got {}",
                r.min_points
            )));
        }
        let c = self.learning.consistency_threshold;
        if !(c > 0.0 && c <= 1.0) {
            return Err(crate::Error::Config(format!(
                "consistency_threshold must be in (0, 1], got {}",
                c
            )));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Per-user data directory (`~/.spellcast`)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Template library file: `[library].path` or the data directory default
    pub fn library_path(&self) -> PathBuf {
        self.library
            .path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join(LIBRARY_FILE_NAME))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracking.confidence_threshold, 0.8);
        assert_eq!(config.tracking.tip_priority, vec![8, 12, 4]);
        assert_eq!(config.smoothing.window, 5);
        assert_eq!(config.trail.ttl_ms, 4_000);
        assert_eq!(config.recognition.threshold, 0.7);
        assert_eq!(config.recognition.strategy, MatchStrategy::RotationInvariant);
        assert_eq!(config.recognition.capture_window, 64);
        assert_eq!(config.learning.consistency_threshold, 0.7);
        assert!(config.library.path.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[tracking]"));
        assert!(toml.contains("[smoothing]"));
        assert!(toml.contains("[trail]"));
        assert!(toml.contains("[recognition]"));
        assert!(toml.contains("strategy = \"rotation_invariant\""));
    }

    #[test]
    fn test_default_path() {
        let path = Config::default_path();
        assert!(path.to_string_lossy().contains("config.toml"));
        assert!(path.to_string_lossy().contains(DATA_DIR_NAME));
    }

    #[test]
    fn test_library_path() {
        let mut config = Config::default();
        assert!(config.library_path().ends_with(LIBRARY_FILE_NAME));

        config.library.path = Some(PathBuf::from("/srv/spells.json"));
        assert_eq!(config.library_path(), PathBuf::from("/srv/spells.json"));
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = Config::default();
        original.smoothing.window = 3;
        original.trail.ttl_ms = 2_000;
        original.recognition.strategy = MatchStrategy::BoundingBox;
        original.library.path = Some(temp_dir.path().join("spells.json"));

        original.save(&config_path).expect("Failed to save config");
        assert!(config_path.exists());

        let loaded = Config::load(&config_path).expect("Failed to load config");
        assert_eq!(loaded.smoothing.window, 3);
        assert_eq!(loaded.trail.ttl_ms, 2_000);
        assert_eq!(loaded.recognition.strategy, MatchStrategy::BoundingBox);
        assert_eq!(loaded.library.path, original.library.path);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load(&temp_dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[smoothing]
window = 2

[recognition]
strategy = "bounding_box"
"#;
        let config: Config = toml::from_str(partial).expect("Partial config should deserialize");
        assert_eq!(config.smoothing.window, 2);
        assert_eq!(config.recognition.strategy, MatchStrategy::BoundingBox);
        assert_eq!(config.recognition.threshold, 0.7);
        assert_eq!(config.trail.ttl_ms, 4_000);
        assert_eq!(config.tracking.tip_priority, vec![8, 12, 4]);
    }

    #[test]
    fn test_invalid_toml_parsing() {
        let result: Result<Config, _> = toml::from_str("this is not valid toml {{{}}}");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result: Result<Config, _> = toml::from_str("[recognition]\nstrategy = \"nearest\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_smoothing_window_range() {
        let mut config = Config::default();
        config.smoothing.window = 0;
        assert!(config.validate().is_err());
        config.smoothing.window = 11;
        assert!(config.validate().is_err());
        config.smoothing.window = 1;
        assert!(config.validate().is_ok());
        config.smoothing.window = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_trail_ttl_range() {
        let mut config = Config::default();
        config.trail.ttl_ms = 999;
        assert!(config.validate().is_err());
        config.trail.ttl_ms = 8_001;
        assert!(config.validate().is_err());
        config.trail.ttl_ms = 1_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_thresholds() {
        let mut config = Config::default();
        config.recognition.threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tracking.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.learning.consistency_threshold = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tracking.velocity_penalty = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tracking.reanchor_after = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_loss_windows() {
        let mut config = Config::default();
        config.tracking.loss_grace_ms = 1_500;
        config.tracking.capture_reset_ms = 1_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_tip_priority_non_empty() {
        let mut config = Config::default();
        config.tracking.tip_priority.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_capture_window() {
        let mut config = Config::default();
        config.recognition.capture_window = 4;
        assert!(config.validate().is_err());
        config.recognition.capture_window = 1_024;
        assert!(config.validate().is_ok());
        config.recognition.min_points = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_invalid_values() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("bad_config.toml");
        std::fs::write(&config_path, "[trail]\nttl_ms = 20000\n").expect("Failed to write config");
        assert!(matches!(Config::load(&config_path), Err(crate::Error::Config(_))));
    }
}
