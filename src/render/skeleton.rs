use super::effects::apply_scanlines;
use super::layer::TrailLayer;
use super::RenderConfig;
use crate::color::VelocityColorMap;
use crate::constants::{LABEL_OFFSET_X, LABEL_OFFSET_Y, NUM_LANDMARKS};
use crate::geometry::CanvasMapper;
use crate::landmarks::{Pose, FACE_CONNECTIONS, POSE_CONNECTIONS};
use crate::utils::safe_cast::{f32_to_i32_clamp, unit_to_u8};
use crate::validity::ValidityThresholds;
use crate::{Error, Result};
use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use log::{debug, info, warn};

/// Label color, slightly translucent white
const LABEL_COLOR: Rgba<u8> = Rgba([230, 230, 230, 255]);

/// One pose slot to draw: its stabilized pose and the one before it
#[derive(Debug, Clone, Copy)]
pub struct SlotRender<'a> {
    pub pose: &'a Pose,
    pub previous: Option<&'a Pose>,
}

/// Counts of what was drawn in one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameRenderStats {
    pub bones: usize,
    pub joints: usize,
    pub labels: usize,
}

/// Draws skeletons into the trail layer and composites the result
pub struct SkeletonRenderer {
    config: RenderConfig,
    trail: TrailLayer,
    colors: VelocityColorMap,
    font: Option<FontVec>,
}

fn load_label_font(config: &RenderConfig) -> Option<FontVec> {
    if !config.draw_ids {
        return None;
    }
    let Some(path) = &config.label_font else {
        warn!("Landmark labels requested but no label font configured; labels disabled");
        return None;
    };
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read label font {}: {}. Labels disabled", path.display(), e);
            return None;
        }
    };
    match FontVec::try_from_vec(bytes) {
        Ok(font) => {
            info!("Loaded label font {}", path.display());
            Some(font)
        }
        Err(e) => {
            warn!("Invalid label font {}: {}. Labels disabled", path.display(), e);
            None
        }
    }
}

impl SkeletonRenderer {
    /// Create a renderer for a `width × height` surface
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is empty or the configuration is
    /// invalid. A missing or unreadable label font only disables labels.
    pub fn new(width: u32, height: u32, config: RenderConfig) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::RenderError(format!("Empty render surface {width}x{height}")));
        }
        config.validate()?;
        let colors = VelocityColorMap::new(config.velocity_max)?;
        let font = load_label_font(&config);
        Ok(Self {
            config,
            trail: TrailLayer::new(width, height),
            colors,
            font,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[must_use]
    pub const fn trail(&self) -> &TrailLayer {
        &self.trail
    }

    /// Whether joint labels will actually be drawn
    #[must_use]
    pub const fn labels_enabled(&self) -> bool {
        self.config.draw_ids && self.font.is_some()
    }

    /// Replace the configuration; takes effect on the next frame
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid; the old one stays active.
    pub fn set_config(&mut self, config: RenderConfig) -> Result<()> {
        config.validate()?;
        self.colors = VelocityColorMap::new(config.velocity_max)?;
        if config.draw_ids != self.config.draw_ids || config.label_font != self.config.label_font {
            self.font = load_label_font(&config);
        }
        if !config.trails {
            self.trail.clear();
        }
        self.config = config;
        Ok(())
    }

    /// Drop all accumulated trails
    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }

    fn stroke_color(&self, speed: f32, alpha: u8) -> Rgba<u8> {
        let rgb = if self.config.velocity_color {
            self.colors.velocity_to_color(speed).0
        } else {
            self.config.bone_color
        };
        Rgba([rgb[0], rgb[1], rgb[2], alpha])
    }

    /// Draw all slots and composite them onto `display`.
    ///
    /// `display` must already hold the fitted video frame. Never fails:
    /// landmarks that cannot be drawn are skipped.
    pub fn render(
        &mut self,
        display: &mut RgbaImage,
        slots: &[SlotRender<'_>],
        mapper: &CanvasMapper,
        thresholds: &ValidityThresholds,
    ) -> FrameRenderStats {
        if self.config.trails {
            self.trail.fade(self.config.trail_fade);
        } else {
            self.trail.clear();
        }

        let alpha = unit_to_u8(self.config.draw_alpha);
        let (w, h) = display.dimensions();
        let (w, h) = (i32::try_from(w).unwrap_or(i32::MAX), i32::try_from(h).unwrap_or(i32::MAX));
        let mut stats = FrameRenderStats::default();

        for slot in slots {
            let mapped: Vec<(f32, f32)> = slot.pose.iter().map(|lm| mapper.map(lm)).collect();
            let valid: Vec<bool> = slot
                .pose
                .iter()
                .enumerate()
                .map(|(i, lm)| thresholds.is_valid(lm, i))
                .collect();
            let speeds: Vec<f32> = match slot.previous {
                Some(prev) => prev
                    .iter()
                    .zip(&mapped)
                    .map(|(p, &(x, y))| {
                        let (px, py) = mapper.map(p);
                        (x - px).hypot(y - py)
                    })
                    .collect(),
                None => vec![0.0; NUM_LANDMARKS],
            };

            for &(a, b) in &POSE_CONNECTIONS {
                if !(valid[a] && valid[b]) {
                    continue;
                }
                let color = self.stroke_color(speeds[a].max(speeds[b]), alpha);
                self.trail.stroke_segment(mapped[a], mapped[b], self.config.bone_width, color);
                stats.bones += 1;
            }

            if self.config.draw_face {
                let [r, g, b] = self.config.face_color;
                for &(a, bb) in &FACE_CONNECTIONS {
                    if valid[a] && valid[bb] {
                        self.trail
                            .stroke_segment(mapped[a], mapped[bb], self.config.bone_width, Rgba([r, g, b, alpha]));
                        stats.bones += 1;
                    }
                }
            }

            for i in (0..NUM_LANDMARKS).filter(|&i| valid[i]) {
                let color = self.stroke_color(speeds[i], alpha);
                self.trail.stamp_disc(mapped[i], self.config.joint_radius, color);
                stats.joints += 1;
            }

            if let Some(font) = self.font.as_ref().filter(|_| self.config.draw_ids) {
                let size = self.config.label_size;
                let rise = f32_to_i32_clamp(size, 0, i32::MAX);
                for i in (0..NUM_LANDMARKS).filter(|&i| valid[i]) {
                    let x = f32_to_i32_clamp(mapped[i].0, -w, w.saturating_mul(2)) + LABEL_OFFSET_X;
                    let y = f32_to_i32_clamp(mapped[i].1, -h, h.saturating_mul(2)) + LABEL_OFFSET_Y - rise;
                    draw_text_mut(display, LABEL_COLOR, x, y, PxScale::from(size), font, &i.to_string());
                    stats.labels += 1;
                }
            }
        }

        self.trail.composite_onto(display);

        if self.config.scanlines {
            apply_scanlines(display, self.config.scanline_strength, self.config.scanline_band);
        }

        debug!(
            "Rendered {} slots: {} bones, {} joints, {} labels",
            slots.len(),
            stats.bones,
            stats.joints,
            stats.labels
        );
        stats
    }
}
