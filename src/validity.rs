//! Per-landmark confidence gate.
//!
//! Legs and feet are the least confidently detected region, so they are
//! gated with lower thresholds than the upper body and face.

use crate::constants::{DEFAULT_FOOT_THRESHOLD, DEFAULT_LOWER_BODY_THRESHOLD, DEFAULT_VISIBILITY_THRESHOLD};
use crate::landmarks::{Landmark, FOOT_LANDMARKS, LOWER_BODY_LANDMARKS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Graduated visibility thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityThresholds {
    /// Heels and foot tips
    pub foot: f32,
    /// Hips through ankles
    pub lower_body: f32,
    /// Upper body and face
    pub default: f32,
}

impl Default for ValidityThresholds {
    fn default() -> Self {
        Self {
            foot: DEFAULT_FOOT_THRESHOLD,
            lower_body: DEFAULT_LOWER_BODY_THRESHOLD,
            default: DEFAULT_VISIBILITY_THRESHOLD,
        }
    }
}

impl ValidityThresholds {
    /// Check ranges and ordering
    ///
    /// # Errors
    ///
    /// Returns an error if a threshold is outside `[0, 1]` or the thresholds
    /// are not ordered `foot <= lower_body <= default`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("foot", self.foot),
            ("lower_body", self.lower_body),
            ("default", self.default),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!(
                    "Validity threshold '{name}' must be between 0.0 and 1.0, got {value}"
                )));
            }
        }
        if self.foot > self.lower_body || self.lower_body > self.default {
            return Err(Error::ConfigError(
                "Validity thresholds must satisfy foot <= lower_body <= default".to_string(),
            ));
        }
        Ok(())
    }

    /// Threshold applied to the landmark at `index`
    #[must_use]
    pub fn threshold_for(&self, index: usize) -> f32 {
        if FOOT_LANDMARKS.contains(&index) {
            self.foot
        } else if LOWER_BODY_LANDMARKS.contains(&index) {
            self.lower_body
        } else {
            self.default
        }
    }

    /// Whether the landmark is confident enough to be drawn and filtered
    #[must_use]
    pub fn is_valid(&self, landmark: &Landmark, index: usize) -> bool {
        match landmark.visibility {
            Some(v) if v.is_finite() => v > self.threshold_for(index),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_confidence_is_invalid() {
        let thresholds = ValidityThresholds::default();
        for i in 0..33 {
            assert!(!thresholds.is_valid(&Landmark::unknown(0.5, 0.5), i));
        }
    }

    #[test]
    fn test_graduated_thresholds() {
        let thresholds = ValidityThresholds::default();
        let lm = Landmark::new(0.5, 0.5, 0.2);
        assert!(thresholds.is_valid(&lm, 31)); // foot
        assert!(!thresholds.is_valid(&lm, 25)); // knee
        assert!(!thresholds.is_valid(&lm, 11)); // shoulder

        let lm = Landmark::new(0.5, 0.5, 0.3);
        assert!(thresholds.is_valid(&lm, 27)); // ankle
        assert!(!thresholds.is_valid(&lm, 0)); // nose
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let thresholds = ValidityThresholds::default();
        let at_threshold = Landmark::new(0.5, 0.5, thresholds.default);
        assert!(!thresholds.is_valid(&at_threshold, 0));
    }

    #[test]
    fn test_nan_confidence_is_invalid() {
        let thresholds = ValidityThresholds::default();
        assert!(!thresholds.is_valid(&Landmark::new(0.5, 0.5, f32::NAN), 0));
    }

    #[test]
    fn test_out_of_range_index_uses_default() {
        let thresholds = ValidityThresholds::default();
        assert_eq!(thresholds.threshold_for(99), thresholds.default);
    }

    #[test]
    fn test_validate() {
        assert!(ValidityThresholds::default().validate().is_ok());
        let bad = ValidityThresholds {
            foot: 0.5,
            lower_body: 0.2,
            default: 0.4,
        };
        assert!(bad.validate().is_err());
        let bad = ValidityThresholds {
            foot: -0.1,
            ..ValidityThresholds::default()
        };
        assert!(bad.validate().is_err());
    }
}
