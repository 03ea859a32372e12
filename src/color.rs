//! Speed to color ramp (red → green → blue) used to visualize joint velocity.

use crate::constants::DEFAULT_VELOCITY_MAX;
use crate::utils::safe_cast::unit_to_u8;
use crate::{Error, Result};
use image::Rgb;

/// Maps an inter-frame displacement magnitude onto the color ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityColorMap {
    v_max: f32,
}

impl Default for VelocityColorMap {
    fn default() -> Self {
        Self {
            v_max: DEFAULT_VELOCITY_MAX,
        }
    }
}

impl VelocityColorMap {
    /// Create a map saturating at `v_max`
    ///
    /// # Errors
    ///
    /// Returns an error if `v_max` is not positive and finite.
    pub fn new(v_max: f32) -> Result<Self> {
        if !(v_max.is_finite() && v_max > 0.0) {
            return Err(Error::InvalidInput(format!(
                "Reference speed must be positive, got {v_max}"
            )));
        }
        Ok(Self { v_max })
    }

    #[must_use]
    pub const fn v_max(&self) -> f32 {
        self.v_max
    }

    /// Ramp position of `speed` in [0, 1]; NaN maps to 0
    #[must_use]
    pub fn normalize(&self, speed: f32) -> f32 {
        let t = speed / self.v_max;
        if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, 1.0)
        }
    }

    /// Pure red at rest, pure green at `v_max / 2`, pure blue at `v_max` and above
    #[must_use]
    pub fn velocity_to_color(&self, speed: f32) -> Rgb<u8> {
        let t = self.normalize(speed);
        if t < 0.5 {
            let a = t * 2.0;
            Rgb([unit_to_u8(1.0 - a), unit_to_u8(a), 0])
        } else {
            let a = (t - 0.5) * 2.0;
            Rgb([0, unit_to_u8(1.0 - a), unit_to_u8(a)])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints() {
        let map = VelocityColorMap::new(800.0).unwrap();
        assert_eq!(map.velocity_to_color(0.0), Rgb([255, 0, 0]));
        assert_eq!(map.velocity_to_color(400.0), Rgb([0, 255, 0]));
        assert_eq!(map.velocity_to_color(800.0), Rgb([0, 0, 255]));
        assert_eq!(map.velocity_to_color(5000.0), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_continuity_around_midpoint() {
        let map = VelocityColorMap::default();
        let half = map.v_max() / 2.0;
        let below = map.velocity_to_color(half - 0.01);
        let above = map.velocity_to_color(half + 0.01);
        for c in 0..3 {
            assert!((i32::from(below[c]) - i32::from(above[c])).abs() <= 1);
        }
    }

    #[test]
    fn test_degenerate_speeds_clamp_to_red() {
        let map = VelocityColorMap::default();
        assert_eq!(map.velocity_to_color(-10.0), Rgb([255, 0, 0]));
        assert_eq!(map.velocity_to_color(f32::NAN), Rgb([255, 0, 0]));
        assert_eq!(map.velocity_to_color(f32::INFINITY), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_rejects_non_positive_reference() {
        assert!(VelocityColorMap::new(0.0).is_err());
        assert!(VelocityColorMap::new(-1.0).is_err());
        assert!(VelocityColorMap::new(f32::NAN).is_err());
    }
}
