use super::stabilizer::StabilizerConfig;
use crate::landmarks::FAST_LIMB_LANDMARKS;

/// Exponential blend weights chosen per joint
///
/// `alpha` is the weight kept on the previous stabilized value. Fast limbs
/// get a reduced alpha so the skeleton does not lag behind kicks and steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSmoothing {
    base: f32,
    lower_factor: f32,
    cap_lower: f32,
    cap_upper: f32,
}

impl JointSmoothing {
    #[must_use]
    pub const fn new(base: f32, lower_factor: f32, cap_lower: f32, cap_upper: f32) -> Self {
        Self {
            base,
            lower_factor,
            cap_lower,
            cap_upper,
        }
    }

    #[must_use]
    pub const fn from_config(config: &StabilizerConfig) -> Self {
        Self::new(
            config.base_smoothing,
            config.lower_factor,
            config.cap_lower,
            config.cap_upper,
        )
    }

    /// Weight on the previous value for the landmark at `index`
    #[must_use]
    pub fn alpha_for(&self, index: usize) -> f32 {
        if FAST_LIMB_LANDMARKS.contains(&index) {
            self.cap_lower.min(self.base * self.lower_factor)
        } else {
            self.cap_upper.min(self.base)
        }
    }
}

/// `alpha * prev + (1 - alpha) * current`, written so equal inputs return exactly `current`
#[must_use]
pub fn blend(prev: f32, current: f32, alpha: f32) -> f32 {
    alpha.mul_add(prev - current, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend() {
        assert_eq!(blend(10.0, 20.0, 0.5), 15.0);
        assert_eq!(blend(10.0, 20.0, 0.0), 20.0);
        assert_eq!(blend(10.0, 20.0, 1.0), 10.0);
    }

    #[test]
    fn test_blend_no_drift_on_constant_input() {
        let mut value = 0.123_456_7_f32;
        for _ in 0..1000 {
            value = blend(value, 0.123_456_7, 0.87);
        }
        assert_eq!(value, 0.123_456_7);
    }

    #[test]
    fn test_alpha_bounds() {
        // High base = heavy smoothing on the upper body, capped
        let smoothing = JointSmoothing::new(0.95, 0.6, 0.6, 0.9);
        assert!((smoothing.alpha_for(0) - 0.9).abs() < 1e-6);
        assert!((smoothing.alpha_for(31) - 0.57).abs() < 1e-6);

        // Low base = light smoothing everywhere, legs lighter still
        let smoothing = JointSmoothing::new(0.2, 0.5, 0.6, 0.9);
        assert!((smoothing.alpha_for(11) - 0.2).abs() < 1e-6);
        assert!((smoothing.alpha_for(25) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_fast_limbs_never_smoother_than_upper_body() {
        let smoothing = JointSmoothing::from_config(&StabilizerConfig::default());
        for leg in FAST_LIMB_LANDMARKS {
            assert!(smoothing.alpha_for(leg) <= smoothing.alpha_for(0));
        }
    }
}
