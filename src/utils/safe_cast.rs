//! Safe casting utilities for pixel coordinates and channel values

use crate::{Error, Result};

/// Largest integer that `f32` represents exactly
const F32_EXACT_INT_MAX: u32 = 1 << 24;

/// Convert an image dimension to `f32` without precision loss
///
/// # Errors
///
/// Returns an error if the value is zero or too large to be represented exactly
#[allow(clippy::cast_precision_loss)] // Bounds check guarantees exactness
pub fn dimension_to_f32(value: u32) -> Result<f32> {
    if value == 0 || value > F32_EXACT_INT_MAX {
        return Err(Error::InvalidInput(format!(
            "Dimension {value} cannot be used as a frame extent"
        )));
    }
    Ok(value as f32)
}

/// Clamp and convert f32 to i32 for pixel coordinates
#[must_use]
#[allow(clippy::cast_precision_loss)] // Acceptable for clamping bounds
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f32_to_i32_clamp(value: f32, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.round().clamp(min as f32, max as f32);

    let result = clamped as i32;
    result.clamp(min, max)
}

/// Keep a canvas coordinate within one extent of the surface on either side.
///
/// Keeps joint discs far outside the frame cheap to rasterize. Non-finite
/// values yield `None`.
#[must_use]
pub fn clamp_canvas_coord(value: f32, extent: f32) -> Option<f32> {
    if value.is_finite() {
        Some(value.clamp(-extent, 2.0 * extent))
    } else {
        None
    }
}

/// Scale a unit-interval value to a channel byte
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped to [0, 255]
pub fn unit_to_u8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dimension_to_f32() {
        assert_eq!(dimension_to_f32(1080).unwrap(), 1080.0);
        assert_eq!(dimension_to_f32(1 << 24).unwrap(), 16_777_216.0);
        assert!(dimension_to_f32(0).is_err());
        assert!(dimension_to_f32((1 << 24) + 1).is_err());
    }

    #[test]
    fn test_f32_to_i32_clamp() {
        assert_eq!(f32_to_i32_clamp(50.0, 0, 100), 50);
        assert_eq!(f32_to_i32_clamp(49.6, 0, 100), 50);
        assert_eq!(f32_to_i32_clamp(-10.0, 0, 100), 0);
        assert_eq!(f32_to_i32_clamp(150.0, 0, 100), 100);
        assert_eq!(f32_to_i32_clamp(f32::NAN, 0, 100), 0);
        assert_eq!(f32_to_i32_clamp(50.0, 100, 0), 50);
    }

    #[test]
    fn test_clamp_canvas_coord() {
        assert_eq!(clamp_canvas_coord(10.0, 100.0), Some(10.0));
        assert_eq!(clamp_canvas_coord(-1e9, 100.0), Some(-100.0));
        assert_eq!(clamp_canvas_coord(1e9, 100.0), Some(200.0));
        assert_eq!(clamp_canvas_coord(f32::NAN, 100.0), None);
        assert_eq!(clamp_canvas_coord(f32::INFINITY, 100.0), None);
    }

    #[test]
    fn test_unit_to_u8() {
        assert_eq!(unit_to_u8(0.0), 0);
        assert_eq!(unit_to_u8(1.0), 255);
        assert_eq!(unit_to_u8(0.5), 128);
        assert_eq!(unit_to_u8(2.0), 255);
        assert_eq!(unit_to_u8(-1.0), 0);
        assert_eq!(unit_to_u8(f32::NAN), 0);
    }

    proptest! {
        #[test]
        fn prop_f32_to_i32_clamp_always_within_bounds(
            value in any::<f32>(),
            min in any::<i32>(),
            max in any::<i32>()
        ) {
            let (min, max) = if min <= max { (min, max) } else { (max, min) };
            let result = f32_to_i32_clamp(value, min, max);
            prop_assert!(result >= min);
            prop_assert!(result <= max);
        }

        #[test]
        fn prop_clamp_canvas_coord_bounded(value in any::<f32>(), extent in 1.0f32..4096.0) {
            if let Some(v) = clamp_canvas_coord(value, extent) {
                prop_assert!(v >= -extent && v <= 2.0 * extent);
            }
        }
    }
}
