//! Occlusion memory for individual landmarks.
//!
//! A landmark that fails the validity gate is held, briefly extrapolated
//! (ankles and feet), and after the grace period frozen with a decaying
//! confidence so it fades out of the skeleton instead of sticking forever.

use super::stabilizer::StabilizerConfig;
use crate::constants::NUM_LANDMARKS;
use crate::landmarks::{Landmark, EXTRAPOLATION_LANDMARKS};

/// Filter state of one landmark after the latest update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LandmarkPhase {
    /// First observation of the slot, emitted unfiltered
    #[default]
    Bootstrapped,
    /// Valid observation blended with the previous value
    Tracked,
    /// Within the grace period, continuing the last motion
    OccludedPredicting,
    /// Within the grace period, holding the previous value
    OccludedHolding,
    /// Past the grace period, frozen with decaying confidence
    OccludedFrozen,
}

impl LandmarkPhase {
    #[must_use]
    pub const fn is_occluded(self) -> bool {
        matches!(
            self,
            Self::OccludedPredicting | Self::OccludedHolding | Self::OccludedFrozen
        )
    }
}

/// Consecutive-miss counters and phases for the 33 landmarks of one pose slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcclusionTracker {
    misses: [u32; NUM_LANDMARKS],
    phases: [LandmarkPhase; NUM_LANDMARKS],
}

impl Default for OcclusionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl OcclusionTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            misses: [0; NUM_LANDMARKS],
            phases: [LandmarkPhase::Bootstrapped; NUM_LANDMARKS],
        }
    }

    /// Record one observation; returns the updated miss count
    pub fn record(&mut self, index: usize, valid: bool) -> u32 {
        let misses = &mut self.misses[index];
        *misses = if valid { 0 } else { misses.saturating_add(1) };
        *misses
    }

    #[must_use]
    pub fn misses(&self, index: usize) -> u32 {
        self.misses.get(index).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn phase(&self, index: usize) -> LandmarkPhase {
        self.phases.get(index).copied().unwrap_or_default()
    }

    pub(crate) fn set_phase(&mut self, index: usize, phase: LandmarkPhase) {
        self.phases[index] = phase;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Replacement for an invalid observation given its miss count
#[must_use]
pub fn recover(
    index: usize,
    misses: u32,
    prev: &Landmark,
    prev_prev: Option<&Landmark>,
    config: &StabilizerConfig,
) -> (Landmark, LandmarkPhase) {
    if misses > config.grace_frames {
        let frozen = Landmark {
            x: prev.x,
            y: prev.y,
            visibility: prev.visibility.map(|c| c * config.confidence_decay),
        };
        return (frozen, LandmarkPhase::OccludedFrozen);
    }

    if config.extrapolate && EXTRAPOLATION_LANDMARKS.contains(&index) {
        if let Some(pp) = prev_prev {
            let predicted = Landmark {
                x: (prev.x - pp.x).mul_add(config.extrapolation_decay, prev.x),
                y: (prev.y - pp.y).mul_add(config.extrapolation_decay, prev.y),
                visibility: prev.visibility,
            };
            return (predicted, LandmarkPhase::OccludedPredicting);
        }
    }

    (*prev, LandmarkPhase::OccludedHolding)
}
