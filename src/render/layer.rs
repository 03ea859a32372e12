//! Persistent trail layer.
//!
//! Strokes accumulate here across frames. Each frame the whole layer is
//! attenuated by multiplying its alpha channel, so old strokes fade into an
//! afterimage instead of being redrawn.

use crate::utils::safe_cast::{clamp_canvas_coord, f32_to_i32_clamp};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, Blend};

/// Transparent RGBA buffer owned by the renderer
#[derive(Debug, Clone)]
pub struct TrailLayer {
    image: RgbaImage,
}

impl TrailLayer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    #[must_use]
    pub const fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Multiply every pixel's alpha by `factor`, rounding down so strokes reach zero
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn fade(&mut self, factor: f32) {
        let factor = factor.clamp(0.0, 1.0);
        for pixel in self.image.pixels_mut() {
            pixel[3] = (f32::from(pixel[3]) * factor) as u8;
        }
    }

    /// Make the layer fully transparent
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// Alpha-composite the layer over `display`
    pub fn composite_onto(&self, display: &mut RgbaImage) {
        imageops::overlay(display, &self.image, 0, 0);
    }

    /// Blend a segment of `width` pixels between two canvas points
    #[allow(clippy::cast_precision_loss)]
    pub fn stroke_segment(&mut self, start: (f32, f32), end: (f32, f32), width: u32, color: Rgba<u8>) {
        let (w, h) = self.extent();
        let Some(((x1, y1), (x2, y2))) = clip_segment(start, end, (-w, -h), (2.0 * w, 2.0 * h)) else {
            return;
        };

        let (dx, dy) = (x2 - x1, y2 - y1);
        let len = dx.hypot(dy);
        let (nx, ny) = if len > f32::EPSILON { (-dy / len, dx / len) } else { (0.0, 0.0) };

        let mut canvas = Blend(std::mem::replace(&mut self.image, RgbaImage::new(0, 0)));
        let width = width.max(1);
        let center = (width - 1) as f32 / 2.0;
        for k in 0..width {
            let offset = k as f32 - center;
            draw_line_segment_mut(
                &mut canvas,
                (x1 + nx * offset, y1 + ny * offset),
                (x2 + nx * offset, y2 + ny * offset),
                color,
            );
        }
        self.image = canvas.0;
    }

    /// Blend a filled disc centered on a canvas point
    pub fn stamp_disc(&mut self, center: (f32, f32), radius: i32, color: Rgba<u8>) {
        let (w, h) = self.extent();
        let (Some(x), Some(y)) = (clamp_canvas_coord(center.0, w), clamp_canvas_coord(center.1, h)) else {
            return;
        };
        let cx = f32_to_i32_clamp(x, i32::MIN, i32::MAX);
        let cy = f32_to_i32_clamp(y, i32::MIN, i32::MAX);

        let mut canvas = Blend(std::mem::replace(&mut self.image, RgbaImage::new(0, 0)));
        draw_filled_circle_mut(&mut canvas, (cx, cy), radius.max(1), color);
        self.image = canvas.0;
    }

    #[allow(clippy::cast_precision_loss)]
    fn extent(&self) -> (f32, f32) {
        let (w, h) = self.image.dimensions();
        (w as f32, h as f32)
    }
}

/// Liang–Barsky clip of a segment to an axis-aligned rectangle.
///
/// Both endpoints move along the original line. Returns `None` when the
/// segment misses the rectangle or has a non-finite coordinate. Computed in
/// `f64` so far off-canvas endpoints keep their precision.
#[allow(clippy::cast_possible_truncation)]
fn clip_segment(
    start: (f32, f32),
    end: (f32, f32),
    min: (f32, f32),
    max: (f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
    if ![start.0, start.1, end.0, end.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (sx, sy) = (f64::from(start.0), f64::from(start.1));
    let (dx, dy) = (f64::from(end.0) - sx, f64::from(end.1) - sy);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    let edges = [
        (-dx, sx - f64::from(min.0)),
        (dx, f64::from(max.0) - sx),
        (-dy, sy - f64::from(min.1)),
        (dy, f64::from(max.1) - sy),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| (dx.mul_add(t, sx) as f32, dy.mul_add(t, sy) as f32);
    Some((at(t0), at(t1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_multiplies_alpha() {
        let mut layer = TrailLayer::new(4, 4);
        layer.stamp_disc((2.0, 2.0), 1, Rgba([255, 0, 0, 255]));
        assert_eq!(layer.image().get_pixel(2, 2)[3], 255);

        layer.fade(0.5);
        assert_eq!(layer.image().get_pixel(2, 2)[3], 127);
        assert_eq!(layer.image().get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_repeated_fade_reaches_transparent() {
        let mut layer = TrailLayer::new(2, 2);
        layer.stamp_disc((1.0, 1.0), 1, Rgba([0, 255, 0, 255]));
        for _ in 0..60 {
            layer.fade(0.85);
        }
        assert!(layer.image().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_clear() {
        let mut layer = TrailLayer::new(8, 8);
        layer.stroke_segment((0.0, 0.0), (7.0, 7.0), 2, Rgba([255, 255, 255, 255]));
        assert!(layer.image().pixels().any(|p| p[3] > 0));
        layer.clear();
        assert!(layer.image().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_composite_over_display() {
        let mut layer = TrailLayer::new(4, 4);
        layer.stamp_disc((1.0, 1.0), 1, Rgba([255, 0, 0, 255]));
        let mut display = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        layer.composite_onto(&mut display);
        assert_eq!(display.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
        assert_eq!(display.get_pixel(3, 3), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_far_off_canvas_stroke_is_clipped() {
        let mut layer = TrailLayer::new(16, 16);
        layer.stroke_segment((-1e12, 8.0), (1e12, 8.0), 1, Rgba([255, 255, 255, 255]));
        assert!(layer.image().get_pixel(8, 8)[3] > 0);
        layer.stroke_segment((f32::NAN, 0.0), (4.0, 4.0), 1, Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_off_canvas_stroke_keeps_its_slope() {
        let mut layer = TrailLayer::new(200, 200);
        layer.stroke_segment((-3000.0, 0.0), (100.0, 100.0), 1, Rgba([255, 255, 255, 255]));
        // the line crosses x = 0 at y = 100 * 3000 / 3100
        let lit: Vec<u32> = (0..200).filter(|&y| layer.image().get_pixel(0, y)[3] > 0).collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&y| (95..=98).contains(&y)), "lit rows {lit:?}");
    }

    #[test]
    fn test_clip_segment_moves_along_line() {
        let ((x1, y1), (x2, y2)) = clip_segment((-10.0, -5.0), (10.0, 15.0), (0.0, 0.0), (10.0, 10.0)).unwrap();
        assert!(x1.abs() < 1e-5 && (y1 - 5.0).abs() < 1e-5);
        assert!((x2 - 5.0).abs() < 1e-5 && (y2 - 10.0).abs() < 1e-5);

        let inside = clip_segment((1.0, 2.0), (3.0, 4.0), (0.0, 0.0), (10.0, 10.0)).unwrap();
        assert_eq!(inside, ((1.0, 2.0), (3.0, 4.0)));

        assert!(clip_segment((-10.0, -10.0), (-1.0, -1.0), (0.0, 0.0), (5.0, 5.0)).is_none());
        assert!(clip_segment((1.0, 1.0), (1.0, f32::INFINITY), (0.0, 0.0), (5.0, 5.0)).is_none());
    }
}
