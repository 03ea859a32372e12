//! Temporal filtering of raw detector poses.
//!
//! The stabilizer combines per-joint exponential smoothing with an occlusion
//! memory that holds, extrapolates and finally fades landmarks the detector
//! stops seeing.

/// Per-joint exponential blend weights
pub mod exponential;

/// Miss counting, hold, extrapolation and freeze of occluded landmarks
pub mod occlusion;

/// The pose stabilizer combining both
pub mod stabilizer;

use crate::landmarks::Pose;
use crate::validity::ValidityThresholds;
use crate::Result;
use stabilizer::{PoseStabilizer, StabilizerConfig};

/// Trait for filters owning the state of one pose slot
pub trait PoseFilter: Send + Sync {
    /// Filter the raw pose of the current frame
    fn apply(&mut self, pose: &Pose) -> Pose;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;

    /// Most recent filtered pose, if any
    fn previous(&self) -> Option<&Pose>;

    /// Apply new parameters without discarding state
    fn configure(&mut self, _config: &StabilizerConfig, _thresholds: &ValidityThresholds) {}
}

/// No-op filter that passes poses through unchanged
#[derive(Debug, Default)]
pub struct NoFilter {
    last: Option<Pose>,
}

impl PoseFilter for NoFilter {
    fn apply(&mut self, pose: &Pose) -> Pose {
        self.last = Some(pose.clone());
        pose.clone()
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "NoFilter"
    }

    fn previous(&self) -> Option<&Pose> {
        self.last.as_ref()
    }
}

/// Create a pose filter by type name
///
/// # Errors
///
/// Returns an error for unknown filter names or invalid parameters.
pub fn create_filter(
    filter_type: &str,
    config: &StabilizerConfig,
    thresholds: &ValidityThresholds,
) -> Result<Box<dyn PoseFilter>> {
    match filter_type.to_lowercase().as_str() {
        "none" | "nofilter" | "raw" => Ok(Box::new(NoFilter::default())),
        "stabilized" | "stabilizer" => {
            config.validate()?;
            thresholds.validate()?;
            Ok(Box::new(PoseStabilizer::new(*config, *thresholds)))
        }
        _ => Err(crate::Error::FilterError(format!("Unknown filter type: {filter_type}"))),
    }
}
