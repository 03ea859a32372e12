use super::exponential::{blend, JointSmoothing};
use super::occlusion::{recover, LandmarkPhase, OcclusionTracker};
use super::PoseFilter;
use crate::constants::{
    DEFAULT_BASE_SMOOTHING, DEFAULT_CAP_LOWER, DEFAULT_CAP_UPPER, DEFAULT_CONFIDENCE_DECAY,
    DEFAULT_EXTRAPOLATION_DECAY, DEFAULT_GRACE_FRAMES, DEFAULT_LOWER_FACTOR, NUM_LANDMARKS,
};
use crate::landmarks::{Landmark, Pose};
use crate::validity::ValidityThresholds;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Temporal stabilizer parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Weight on the previous value for upper-body joints, in [0, 1)
    pub base_smoothing: f32,
    /// Multiplier applied to `base_smoothing` for knees and below
    pub lower_factor: f32,
    /// Upper bound on the lower-limb blend weight
    pub cap_lower: f32,
    /// Upper bound on the upper-body blend weight
    pub cap_upper: f32,
    /// Consecutive invalid frames tolerated before a landmark is frozen
    pub grace_frames: u32,
    /// Confidence multiplier per frame once frozen
    pub confidence_decay: f32,
    /// Fraction of the last displacement continued while extrapolating
    pub extrapolation_decay: f32,
    /// Bridge short ankle/foot occlusions by linear extrapolation
    pub extrapolate: bool,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            base_smoothing: DEFAULT_BASE_SMOOTHING,
            lower_factor: DEFAULT_LOWER_FACTOR,
            cap_lower: DEFAULT_CAP_LOWER,
            cap_upper: DEFAULT_CAP_UPPER,
            grace_frames: DEFAULT_GRACE_FRAMES,
            confidence_decay: DEFAULT_CONFIDENCE_DECAY,
            extrapolation_decay: DEFAULT_EXTRAPOLATION_DECAY,
            extrapolate: true,
        }
    }
}

impl StabilizerConfig {
    /// Validate parameter ranges
    ///
    /// # Errors
    ///
    /// Returns an error naming the first parameter that is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.base_smoothing) {
            return Err(Error::ConfigError(format!(
                "Base smoothing must be in [0, 1), got {}",
                self.base_smoothing
            )));
        }
        if !(0.0..=1.0).contains(&self.lower_factor) {
            return Err(Error::ConfigError(format!(
                "Lower factor must be between 0.0 and 1.0, got {}",
                self.lower_factor
            )));
        }
        if !(0.0..1.0).contains(&self.cap_lower) || !(0.0..1.0).contains(&self.cap_upper) {
            return Err(Error::ConfigError("Smoothing caps must be in [0, 1)".to_string()));
        }
        if !(self.confidence_decay > 0.0 && self.confidence_decay < 1.0) {
            return Err(Error::ConfigError(format!(
                "Confidence decay must be in (0, 1), got {}",
                self.confidence_decay
            )));
        }
        if !(0.0..=1.0).contains(&self.extrapolation_decay) {
            return Err(Error::ConfigError(format!(
                "Extrapolation decay must be between 0.0 and 1.0, got {}",
                self.extrapolation_decay
            )));
        }
        Ok(())
    }
}

/// Stabilize one raw pose against the slot's history.
///
/// Each landmark is filtered independently. Without a previous pose the raw
/// observation is returned unchanged. Miss counters and phases in `occlusion`
/// are updated in place.
#[must_use]
pub fn smooth(
    current: &Pose,
    prev: Option<&Pose>,
    prev_prev: Option<&Pose>,
    occlusion: &mut OcclusionTracker,
    config: &StabilizerConfig,
    thresholds: &ValidityThresholds,
) -> Pose {
    let Some(prev) = prev else {
        for (i, lm) in current.iter().enumerate() {
            occlusion.record(i, thresholds.is_valid(lm, i));
            occlusion.set_phase(i, LandmarkPhase::Bootstrapped);
        }
        return current.clone();
    };

    let smoothing = JointSmoothing::from_config(config);
    let mut out = current.clone();

    for i in 0..NUM_LANDMARKS {
        let raw = &current[i];
        let last = &prev[i];

        if thresholds.is_valid(raw, i) {
            occlusion.record(i, true);
            let alpha = smoothing.alpha_for(i);
            out[i] = Landmark {
                x: blend(last.x, raw.x, alpha),
                y: blend(last.y, raw.y, alpha),
                visibility: raw.visibility,
            };
            occlusion.set_phase(i, LandmarkPhase::Tracked);
        } else {
            let misses = occlusion.record(i, false);
            let (recovered, phase) = recover(i, misses, last, prev_prev.map(|p| &p[i]), config);
            out[i] = recovered;
            occlusion.set_phase(i, phase);
        }
    }

    out
}

/// Stabilized pose state of one tracked pose slot
#[derive(Debug, Clone)]
pub struct PoseStabilizer {
    config: StabilizerConfig,
    thresholds: ValidityThresholds,
    prev: Option<Pose>,
    prev_prev: Option<Pose>,
    occlusion: OcclusionTracker,
}

impl PoseStabilizer {
    #[must_use]
    pub fn new(config: StabilizerConfig, thresholds: ValidityThresholds) -> Self {
        Self {
            config,
            thresholds,
            prev: None,
            prev_prev: None,
            occlusion: OcclusionTracker::new(),
        }
    }

    #[must_use]
    pub const fn prev_prev(&self) -> Option<&Pose> {
        self.prev_prev.as_ref()
    }

    /// Consecutive invalid frames for the landmark at `index`
    #[must_use]
    pub fn miss_count(&self, index: usize) -> u32 {
        self.occlusion.misses(index)
    }

    #[must_use]
    pub fn phase(&self, index: usize) -> LandmarkPhase {
        self.occlusion.phase(index)
    }

    #[must_use]
    pub const fn config(&self) -> &StabilizerConfig {
        &self.config
    }
}

impl PoseFilter for PoseStabilizer {
    fn apply(&mut self, pose: &Pose) -> Pose {
        let stabilized = smooth(
            pose,
            self.prev.as_ref(),
            self.prev_prev.as_ref(),
            &mut self.occlusion,
            &self.config,
            &self.thresholds,
        );
        self.prev_prev = self.prev.replace(stabilized.clone());
        stabilized
    }

    fn reset(&mut self) {
        self.prev = None;
        self.prev_prev = None;
        self.occlusion.reset();
    }

    fn name(&self) -> &str {
        "PoseStabilizer"
    }

    fn previous(&self) -> Option<&Pose> {
        self.prev.as_ref()
    }

    fn configure(&mut self, config: &StabilizerConfig, thresholds: &ValidityThresholds) {
        self.config = *config;
        self.thresholds = *thresholds;
    }
}
