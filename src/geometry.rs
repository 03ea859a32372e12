//! Aspect-fit geometry between the source frame and the fixed output surface.
//!
//! The same [`FitTransform`] drives both the frame blit and the landmark
//! mapping. Computing either one separately produces overlays that drift off
//! the body whenever the source aspect differs from 9:16.

use crate::landmarks::Landmark;
use crate::{Error, Result};
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

/// Crop rectangle in source pixels plus the output extent it is scaled to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub source_w: f32,
    pub source_h: f32,
    pub crop_x: f32,
    pub crop_y: f32,
    pub crop_w: f32,
    pub crop_h: f32,
    pub out_w: f32,
    pub out_h: f32,
}

fn check_dimension(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("{name} must be positive and finite, got {value}")))
    }
}

/// Compute the crop that fills `out_w × out_h` from a `source_w × source_h` frame.
///
/// A relatively wider source is cropped horizontally and centered. A
/// relatively taller source is cropped vertically, positioned by
/// `vertical_bias` (0.5 centers, smaller values keep more of the top).
///
/// # Errors
///
/// Returns an error if any dimension is not positive and finite, or if the
/// bias lies outside `[0, 1]`.
pub fn compute_fit(source_w: f32, source_h: f32, out_w: f32, out_h: f32, vertical_bias: f32) -> Result<FitTransform> {
    check_dimension("source width", source_w)?;
    check_dimension("source height", source_h)?;
    check_dimension("output width", out_w)?;
    check_dimension("output height", out_h)?;
    if !(0.0..=1.0).contains(&vertical_bias) {
        return Err(Error::InvalidInput(format!(
            "Vertical bias must be between 0.0 and 1.0, got {vertical_bias}"
        )));
    }

    let target_aspect = out_w / out_h;
    let source_aspect = source_w / source_h;

    let (crop_x, crop_y, crop_w, crop_h) = if source_aspect > target_aspect {
        let crop_w = (source_h * target_aspect).min(source_w);
        ((source_w - crop_w) / 2.0, 0.0, crop_w, source_h)
    } else {
        let crop_h = (source_w / target_aspect).min(source_h);
        (0.0, (source_h - crop_h) * vertical_bias, source_w, crop_h)
    };

    Ok(FitTransform {
        source_w,
        source_h,
        crop_x,
        crop_y,
        crop_w,
        crop_h,
        out_w,
        out_h,
    })
}

impl FitTransform {
    /// Map normalized source coordinates into output pixels
    #[must_use]
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        let px = x * self.source_w;
        let py = y * self.source_h;
        let nx = (px - self.crop_x) / self.crop_w;
        let ny = (py - self.crop_y) / self.crop_h;
        (nx * self.out_w, ny * self.out_h)
    }

    #[must_use]
    pub fn map_landmark(&self, landmark: &Landmark) -> (f32, f32) {
        self.map_point(landmark.x, landmark.y)
    }

    /// Row-major 3×3 matrix taking source pixels to output pixels
    #[must_use]
    pub fn projection_matrix(&self) -> [f32; 9] {
        let sx = self.out_w / self.crop_w;
        let sy = self.out_h / self.crop_h;
        [sx, 0.0, -self.crop_x * sx, 0.0, sy, -self.crop_y * sy, 0.0, 0.0, 1.0]
    }

    /// Draw the cropped source into `display`, scaled to fill it.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform is degenerate or the display does not
    /// match the output extent.
    #[allow(clippy::cast_precision_loss)]
    pub fn blit(&self, source: &RgbaImage, display: &mut RgbaImage) -> Result<()> {
        let (dw, dh) = display.dimensions();
        if (dw as f32 - self.out_w).abs() > 0.5 || (dh as f32 - self.out_h).abs() > 0.5 {
            return Err(Error::InvalidInput(format!(
                "Display {dw}x{dh} does not match fit output {}x{}",
                self.out_w, self.out_h
            )));
        }
        let projection = Projection::from_matrix(self.projection_matrix())
            .ok_or_else(|| Error::InvalidInput("Fit transform is not invertible".to_string()))?;
        warp_into(
            source,
            &projection,
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 255]),
            display,
        );
        Ok(())
    }
}

/// Maps landmarks into canvas space using the transform of the current frame
#[derive(Debug, Clone)]
pub struct CanvasMapper {
    out_w: f32,
    out_h: f32,
    fit: Option<FitTransform>,
}

impl CanvasMapper {
    #[must_use]
    pub const fn new(out_w: f32, out_h: f32) -> Self {
        Self { out_w, out_h, fit: None }
    }

    /// Install the transform computed for the frame being drawn
    pub fn update(&mut self, fit: FitTransform) {
        self.fit = Some(fit);
    }

    /// Forget the transform, e.g. when a new video is loaded
    pub fn reset(&mut self) {
        self.fit = None;
    }

    #[must_use]
    pub const fn fit(&self) -> Option<&FitTransform> {
        self.fit.as_ref()
    }

    /// Map a landmark; without a transform the output is a plain stretch
    #[must_use]
    pub fn map(&self, landmark: &Landmark) -> (f32, f32) {
        match &self.fit {
            Some(fit) => fit.map_landmark(landmark),
            None => (landmark.x * self.out_w, landmark.y * self.out_h),
        }
    }
}
