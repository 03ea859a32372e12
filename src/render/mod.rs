//! Skeleton rendering and compositing onto the output surface.
//!
//! Bones and joints are drawn into a persistent [`layer::TrailLayer`] that
//! fades every frame, then composited over the fitted video frame. Landmark
//! labels go straight onto the display layer so they never leave trails.

/// Persistent fading trail buffer
pub mod layer;

/// Post-process effects (scanlines)
pub mod effects;

/// Per-frame skeleton drawing
pub mod skeleton;

pub use skeleton::{FrameRenderStats, SkeletonRenderer, SlotRender};

use crate::constants::{
    DEFAULT_BONE_WIDTH, DEFAULT_DRAW_ALPHA, DEFAULT_JOINT_RADIUS, DEFAULT_LABEL_SIZE, DEFAULT_SCANLINE_BAND,
    DEFAULT_SCANLINE_STRENGTH, DEFAULT_TRAIL_FADE, DEFAULT_VELOCITY_MAX,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Renderer settings; all of them apply from the next frame on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Keep a fading afterimage of previous strokes
    pub trails: bool,
    /// Alpha multiplier applied to the trail layer every frame
    pub trail_fade: f32,
    /// Opacity of this frame's strokes
    pub draw_alpha: f32,
    /// Color bones and joints by speed instead of the fixed colors
    pub velocity_color: bool,
    /// Speed (canvas pixels per frame) mapped to the end of the color ramp
    pub velocity_max: f32,
    /// Fixed bone and joint color (RGB)
    pub bone_color: [u8; 3],
    /// Face stroke color (RGB)
    pub face_color: [u8; 3],
    /// Bone stroke width in pixels
    pub bone_width: u32,
    /// Joint disc radius in pixels
    pub joint_radius: i32,
    /// Draw the short nose-to-eye strokes
    pub draw_face: bool,
    /// Label each valid joint with its landmark index
    pub draw_ids: bool,
    /// TrueType/OpenType font used for labels
    pub label_font: Option<PathBuf>,
    /// Label height in pixels
    pub label_size: f32,
    /// Darken alternating row bands
    pub scanlines: bool,
    /// Fraction of brightness removed from darkened rows
    pub scanline_strength: f32,
    /// Height of each scanline band in rows
    pub scanline_band: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            trails: true,
            trail_fade: DEFAULT_TRAIL_FADE,
            draw_alpha: DEFAULT_DRAW_ALPHA,
            velocity_color: false,
            velocity_max: DEFAULT_VELOCITY_MAX,
            bone_color: [255, 0, 0],
            face_color: [255, 255, 255],
            bone_width: DEFAULT_BONE_WIDTH,
            joint_radius: DEFAULT_JOINT_RADIUS,
            draw_face: true,
            draw_ids: false,
            label_font: None,
            label_size: DEFAULT_LABEL_SIZE,
            scanlines: false,
            scanline_strength: DEFAULT_SCANLINE_STRENGTH,
            scanline_band: DEFAULT_SCANLINE_BAND,
        }
    }
}

impl RenderConfig {
    /// Validate parameter ranges
    ///
    /// # Errors
    ///
    /// Returns an error naming the first parameter that is out of range.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("trail_fade", self.trail_fade),
            ("draw_alpha", self.draw_alpha),
            ("scanline_strength", self.scanline_strength),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!(
                    "Render parameter '{name}' must be between 0.0 and 1.0, got {value}"
                )));
            }
        }
        if !(self.velocity_max.is_finite() && self.velocity_max > 0.0) {
            return Err(Error::ConfigError(format!(
                "Velocity max must be positive, got {}",
                self.velocity_max
            )));
        }
        if self.bone_width == 0 || self.bone_width > 32 {
            return Err(Error::ConfigError(format!(
                "Bone width must be between 1 and 32, got {}",
                self.bone_width
            )));
        }
        if self.joint_radius < 1 || self.joint_radius > 64 {
            return Err(Error::ConfigError(format!(
                "Joint radius must be between 1 and 64, got {}",
                self.joint_radius
            )));
        }
        if !(self.label_size.is_finite() && self.label_size > 0.0) {
            return Err(Error::ConfigError(format!(
                "Label size must be positive, got {}",
                self.label_size
            )));
        }
        if !(1..=4).contains(&self.scanline_band) {
            return Err(Error::ConfigError(format!(
                "Scanline band must be between 1 and 4 rows, got {}",
                self.scanline_band
            )));
        }
        Ok(())
    }
}
