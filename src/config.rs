//! Configuration management for the skeleton overlay pipeline

use crate::constants::{DEFAULT_FPS, DEFAULT_VERTICAL_BIAS, OUTPUT_HEIGHT, OUTPUT_WIDTH};
use crate::detector::DetectorConfig;
use crate::filters::stabilizer::StabilizerConfig;
use crate::render::RenderConfig;
use crate::validity::ValidityThresholds;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted output surface edge
pub const MAX_OUTPUT_EDGE: u32 = 8192;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output surface and pipeline selection
    pub output: OutputConfig,

    /// Detector parameters (changes trigger a debounced rebuild)
    pub detector: DetectorConfig,

    /// Temporal stabilizer parameters
    pub stabilizer: StabilizerConfig,

    /// Per-landmark visibility thresholds
    pub validity: ValidityThresholds,

    /// Skeleton rendering parameters
    pub render: RenderConfig,
}

/// Output surface configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Surface width in pixels
    pub width: u32,

    /// Surface height in pixels
    pub height: u32,

    /// Crop position for sources taller than the output (0.0 top, 1.0 bottom)
    pub vertical_bias: f32,

    /// Per-slot filter ("stabilized" or "none")
    pub filter: String,

    /// Frame rate assumed for image sequences
    pub fps: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: OUTPUT_WIDTH,
            height: OUTPUT_HEIGHT,
            vertical_bias: DEFAULT_VERTICAL_BIAS,
            filter: "stabilized".to_string(),
            fps: DEFAULT_FPS,
        }
    }
}

impl OutputConfig {
    /// Validate surface size, bias, filter name and frame rate
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 || value > MAX_OUTPUT_EDGE {
                return Err(Error::ConfigError(format!(
                    "Output {name} must be between 1 and {MAX_OUTPUT_EDGE}, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.vertical_bias) {
            return Err(Error::ConfigError(format!(
                "Vertical bias must be between 0.0 and 1.0, got {}",
                self.vertical_bias
            )));
        }
        if !matches!(
            self.filter.to_lowercase().as_str(),
            "none" | "nofilter" | "raw" | "stabilized" | "stabilizer"
        ) {
            return Err(Error::ConfigError(format!("Unknown filter type: {}", self.filter)));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(Error::ConfigError(format!("FPS must be positive, got {}", self.fps)));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error from the first section that fails validation.
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.detector.validate()?;
        self.stabilizer.validate()?;
        self.validity.validate()?;
        self.render.validate()?;

        if let Some(font) = &self.render.label_font {
            if self.render.draw_ids && !font.exists() {
                return Err(Error::ConfigError(format!("Label font not found: {}", font.display())));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Skeleton Overlay Configuration

# Output surface (9:16 portrait)
output:
  width: 1080
  height: 1920
  vertical_bias: 0.5
  filter: "stabilized"
  fps: 30.0

# Detector parameters; changes are applied after a quiet period
detector:
  max_poses: 1
  min_detection_confidence: 0.5
  min_tracking_confidence: 0.5
  min_presence_confidence: null
  rebuild_debounce_ms: 300

# Temporal stabilizer
stabilizer:
  base_smoothing: 0.6
  lower_factor: 0.6
  cap_lower: 0.6
  cap_upper: 0.9
  grace_frames: 10
  confidence_decay: 0.9
  extrapolation_decay: 0.75
  extrapolate: true

# Visibility thresholds (foot <= lower_body <= default)
validity:
  foot: 0.1
  lower_body: 0.25
  default: 0.4

# Rendering
render:
  trails: true
  trail_fade: 0.85
  draw_alpha: 0.9
  velocity_color: false
  velocity_max: 120.0
  bone_color: [255, 0, 0]
  face_color: [255, 255, 255]
  bone_width: 2
  joint_radius: 4
  draw_face: true
  draw_ids: false
  label_font: null
  label_size: 18.0
  scanlines: false
  scanline_strength: 0.25
  scanline_band: 1
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = Config::from_yaml("render:\n  scanlines: true\n").unwrap();
        assert!(config.render.scanlines);
        assert_eq!(config.stabilizer, StabilizerConfig::default());
        assert_eq!(config.output.width, OUTPUT_WIDTH);
    }

    #[test]
    fn test_rejects_unknown_filter() {
        let mut config = Config::default();
        config.output.filter = "kalman".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_label_font() {
        let mut config = Config::default();
        config.render.draw_ids = true;
        config.render.label_font = Some("/nonexistent/label.ttf".into());
        assert!(config.validate().is_err());
    }
}
