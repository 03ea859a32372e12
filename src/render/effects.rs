//! Post-process effects applied to the finished display layer.

use image::RgbaImage;

/// Darken alternating horizontal bands of `band` rows by `strength`.
///
/// Rows `y` with `(y / band)` even are scaled by `1 - strength`; the overlay
/// is fixed per row and independent of content. Alpha is left untouched.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn apply_scanlines(display: &mut RgbaImage, strength: f32, band: u32) {
    let band = band.max(1);
    let keep = 1.0 - strength.clamp(0.0, 1.0);
    for (y, row) in display.enumerate_rows_mut() {
        if (y / band) % 2 != 0 {
            continue;
        }
        for (_, _, pixel) in row {
            for c in 0..3 {
                pixel[c] = (f32::from(pixel[c]) * keep).round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_single_row_bands() {
        let mut display = RgbaImage::from_pixel(3, 4, Rgba([200, 100, 50, 255]));
        apply_scanlines(&mut display, 0.5, 1);
        assert_eq!(display.get_pixel(0, 0), &Rgba([100, 50, 25, 255]));
        assert_eq!(display.get_pixel(1, 1), &Rgba([200, 100, 50, 255]));
        assert_eq!(display.get_pixel(2, 2), &Rgba([100, 50, 25, 255]));
        assert_eq!(display.get_pixel(0, 3), &Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_wider_bands() {
        let mut display = RgbaImage::from_pixel(1, 8, Rgba([100, 100, 100, 255]));
        apply_scanlines(&mut display, 1.0, 2);
        let dark: Vec<bool> = (0..8).map(|y| display.get_pixel(0, y)[0] == 0).collect();
        assert_eq!(dark, vec![true, true, false, false, true, true, false, false]);
    }

    #[test]
    fn test_zero_strength_is_noop() {
        let original = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let mut display = original.clone();
        apply_scanlines(&mut display, 0.0, 1);
        assert_eq!(display, original);
    }
}
