//! Frame driver: the per-session pipeline from decoded frame to output surface.

use crate::{
    config::{Config, OutputConfig},
    debounce::Debouncer,
    detector::{DetectorConfig, DetectorFactory, PoseDetector},
    error::Result,
    filters::{create_filter, stabilizer::StabilizerConfig, PoseFilter},
    geometry::{compute_fit, CanvasMapper},
    landmarks::Pose,
    media::{Frame, FrameSink, FrameSource},
    render::{FrameRenderStats, RenderConfig, SkeletonRenderer, SlotRender},
    utils::safe_cast::dimension_to_f32,
    validity::ValidityThresholds,
};
use image::RgbaImage;
use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

/// Lifecycle of the current video session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No frames processed since the video was loaded
    #[default]
    Idle,
    /// Frames are being pulled from a source
    Running,
    /// The source was exhausted
    Finished,
    /// Processing stopped on an error
    Failed(String),
}

/// Counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    /// Frames fully processed
    pub frames: u64,
    /// Frames in which the detector reported at least one pose
    pub frames_with_poses: u64,
    /// Detector calls that failed and were rendered without overlays
    pub detector_failures: u64,
    /// Detector rebuilds applied
    pub rebuilds: u64,
    /// Largest number of simultaneously tracked slots
    pub peak_slots: usize,
    /// Wall time spent in `run`
    pub elapsed: Duration,
}

impl RunStats {
    /// Average processing rate, 0 when nothing was timed
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Owns every piece of per-session state: configuration, the active detector
/// and its factory, one filter per pose slot, the canvas mapper, the renderer
/// with its trail layer, and the pending detector rebuild.
///
/// Slots are matched to detections by position: slot `i` always receives the
/// detector's `i`-th pose.
pub struct FrameDriver {
    output: OutputConfig,
    detector_config: DetectorConfig,
    stabilizer_config: StabilizerConfig,
    thresholds: ValidityThresholds,
    detector: Box<dyn PoseDetector>,
    factory: Box<dyn DetectorFactory>,
    rebuilds: Debouncer<DetectorConfig>,
    slots: Vec<Box<dyn PoseFilter>>,
    mapper: CanvasMapper,
    renderer: SkeletonRenderer,
    display: RgbaImage,
    last_timestamp: Option<u64>,
    status: SessionStatus,
    stats: RunStats,
}

impl FrameDriver {
    /// Create a driver, building the initial detector from `factory`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the detector cannot be built.
    pub fn new(config: &Config, factory: Box<dyn DetectorFactory>) -> Result<Self> {
        info!("Initializing skeleton overlay pipeline");
        config.validate()?;

        let out_w = dimension_to_f32(config.output.width)?;
        let out_h = dimension_to_f32(config.output.height)?;
        let detector = factory.build(&config.detector)?;
        info!(
            "Detector {} ready (max poses {}, detection {:.2}, tracking {:.2})",
            detector.name(),
            config.detector.max_poses,
            config.detector.min_detection_confidence,
            config.detector.min_tracking_confidence
        );

        let renderer = SkeletonRenderer::new(config.output.width, config.output.height, config.render.clone())?;

        Ok(Self {
            output: config.output.clone(),
            detector_config: config.detector.clone(),
            stabilizer_config: config.stabilizer,
            thresholds: config.validity,
            detector,
            factory,
            rebuilds: Debouncer::from_millis(config.detector.rebuild_debounce_ms),
            slots: Vec::new(),
            mapper: CanvasMapper::new(out_w, out_h),
            renderer,
            display: RgbaImage::new(config.output.width, config.output.height),
            last_timestamp: None,
            status: SessionStatus::Idle,
            stats: RunStats::default(),
        })
    }

    #[must_use]
    pub const fn status(&self) -> &SessionStatus {
        &self.status
    }

    #[must_use]
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    #[must_use]
    pub const fn display(&self) -> &RgbaImage {
        &self.display
    }

    #[must_use]
    pub const fn renderer(&self) -> &SkeletonRenderer {
        &self.renderer
    }

    #[must_use]
    pub const fn mapper(&self) -> &CanvasMapper {
        &self.mapper
    }

    #[must_use]
    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    /// Configuration of the detector currently in use
    #[must_use]
    pub const fn detector_config(&self) -> &DetectorConfig {
        &self.detector_config
    }

    #[must_use]
    pub const fn has_pending_rebuild(&self) -> bool {
        self.rebuilds.is_pending()
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Filter state of slot `index`
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&dyn PoseFilter> {
        self.slots.get(index).map(|slot| &**slot)
    }

    /// Schedule a detector rebuild once no new request arrives for the quiet period
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid; nothing is scheduled then.
    pub fn request_detector_config(&mut self, config: DetectorConfig, now_micros: u64) -> Result<()> {
        config.validate()?;
        self.rebuilds
            .set_quiet_period_micros(config.rebuild_debounce_ms.saturating_mul(1000));
        debug!("Detector rebuild requested at {now_micros}us");
        self.rebuilds.submit(config, now_micros);
        Ok(())
    }

    /// Apply new stabilizer parameters to every slot without resetting history
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn set_stabilizer_config(&mut self, config: StabilizerConfig) -> Result<()> {
        config.validate()?;
        self.stabilizer_config = config;
        for slot in &mut self.slots {
            slot.configure(&self.stabilizer_config, &self.thresholds);
        }
        Ok(())
    }

    /// Replace the visibility thresholds used by filters and renderer
    ///
    /// # Errors
    ///
    /// Returns an error if `thresholds` are invalid.
    pub fn set_validity_thresholds(&mut self, thresholds: ValidityThresholds) -> Result<()> {
        thresholds.validate()?;
        self.thresholds = thresholds;
        for slot in &mut self.slots {
            slot.configure(&self.stabilizer_config, &self.thresholds);
        }
        Ok(())
    }

    /// Replace the render parameters, effective from the next frame
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn set_render_config(&mut self, config: RenderConfig) -> Result<()> {
        self.renderer.set_config(config)
    }

    /// Start a new video: build a fresh detector and forget all per-video state.
    ///
    /// A pending rebuild request is applied immediately to the new detector.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector cannot be built; the session is then `Failed`.
    pub fn load_video(&mut self, factory: Box<dyn DetectorFactory>) -> Result<()> {
        let config = self.rebuilds.cancel().unwrap_or_else(|| self.detector_config.clone());
        let detector = match factory.build(&config) {
            Ok(detector) => detector,
            Err(e) => {
                error!("Failed to build detector for new video: {e}");
                self.status = SessionStatus::Failed(e.to_string());
                return Err(e);
            }
        };
        info!("Loaded new video with detector {}", detector.name());

        self.detector = detector;
        self.factory = factory;
        self.detector_config = config;
        self.slots.clear();
        self.renderer.clear_trail();
        self.mapper.reset();
        self.last_timestamp = None;
        self.status = SessionStatus::Idle;
        self.stats = RunStats::default();
        Ok(())
    }

    fn next_timestamp(&mut self, timestamp_micros: u64) -> u64 {
        let timestamp = match self.last_timestamp {
            Some(last) if timestamp_micros <= last => {
                debug!("Non-increasing frame timestamp {timestamp_micros}us after {last}us, bumped");
                last.saturating_add(1)
            }
            _ => timestamp_micros,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    fn apply_pending_rebuild(&mut self, now_micros: u64) {
        let Some(config) = self.rebuilds.poll(now_micros) else {
            return;
        };
        match self.factory.build(&config) {
            Ok(detector) => {
                info!(
                    "Rebuilt detector {} (max poses {}, detection {:.2}, tracking {:.2})",
                    detector.name(),
                    config.max_poses,
                    config.min_detection_confidence,
                    config.min_tracking_confidence
                );
                self.detector = detector;
                self.detector_config = config;
                self.slots.clear();
                self.stats.rebuilds += 1;
            }
            Err(e) => {
                error!("Detector rebuild failed, keeping previous detector: {e}");
            }
        }
    }

    fn resize_slots(&mut self, count: usize) -> Result<()> {
        if count < self.slots.len() {
            debug!("Pose count dropped from {} to {}", self.slots.len(), count);
            self.slots.truncate(count);
        }
        while self.slots.len() < count {
            let filter = create_filter(&self.output.filter, &self.stabilizer_config, &self.thresholds)?;
            debug!("Tracking new pose slot {} with {}", self.slots.len(), filter.name());
            self.slots.push(filter);
        }
        self.stats.peak_slots = self.stats.peak_slots.max(self.slots.len());
        Ok(())
    }

    fn detect(&mut self, frame: &RgbaImage, timestamp_micros: u64) -> Vec<Pose> {
        match self.detector.detect(frame, timestamp_micros) {
            Ok(mut poses) => {
                poses.truncate(self.detector_config.max_poses);
                poses
            }
            Err(e) => {
                warn!("Detector {} failed at {}us: {}", self.detector.name(), timestamp_micros, e);
                self.stats.detector_failures += 1;
                Vec::new()
            }
        }
    }

    /// Process one frame and return the finished output surface
    ///
    /// # Errors
    ///
    /// Returns an error if the frame has unusable dimensions or a new slot
    /// filter cannot be created. Detector failures are not errors: the frame
    /// is rendered without overlays.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<&RgbaImage> {
        let timestamp = self.next_timestamp(frame.timestamp_micros);
        self.apply_pending_rebuild(timestamp);

        let (src_w, src_h) = frame.image.dimensions();
        let fit = compute_fit(
            dimension_to_f32(src_w)?,
            dimension_to_f32(src_h)?,
            dimension_to_f32(self.output.width)?,
            dimension_to_f32(self.output.height)?,
            self.output.vertical_bias,
        )?;
        fit.blit(&frame.image, &mut self.display)?;
        self.mapper.update(fit);

        let poses = self.detect(&frame.image, timestamp);
        if !poses.is_empty() {
            self.stats.frames_with_poses += 1;
        }
        self.resize_slots(poses.len())?;

        let mut previous = Vec::with_capacity(poses.len());
        let mut stabilized = Vec::with_capacity(poses.len());
        for (slot, raw) in self.slots.iter_mut().zip(&poses) {
            previous.push(slot.previous().cloned());
            stabilized.push(slot.apply(raw));
        }
        let render_slots: Vec<SlotRender<'_>> = stabilized
            .iter()
            .zip(&previous)
            .map(|(pose, prev)| SlotRender {
                pose,
                previous: prev.as_ref(),
            })
            .collect();

        let drawn: FrameRenderStats =
            self.renderer
                .render(&mut self.display, &render_slots, &self.mapper, &self.thresholds);
        debug!(
            "Frame at {}us: {} poses, {} bones, {} joints",
            timestamp,
            poses.len(),
            drawn.bones,
            drawn.joints
        );

        self.stats.frames += 1;
        Ok(&self.display)
    }

    /// Pull frames from `source` until it is exhausted, handing each finished
    /// surface to `sink` before requesting the next frame.
    ///
    /// # Errors
    ///
    /// Returns the first source, processing or sink error; the session status
    /// is set to `Failed` with its message.
    pub fn run(&mut self, source: &mut dyn FrameSource, sink: &mut dyn FrameSink) -> Result<RunStats> {
        info!("Starting frame loop");
        self.status = SessionStatus::Running;

        let start_time = Instant::now();
        let mut last_fps_update = Instant::now();
        let mut frames_at_update = self.stats.frames;
        let mut index = 0u64;

        loop {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => return Err(self.fail(e)),
            };

            if let Err(e) = self
                .process_frame(&frame)
                .and_then(|surface| sink.consume(surface, index))
            {
                return Err(self.fail(e));
            }
            index += 1;

            if last_fps_update.elapsed() >= Duration::from_secs(1) {
                #[allow(clippy::cast_precision_loss)]
                let fps = (self.stats.frames - frames_at_update) as f64 / last_fps_update.elapsed().as_secs_f64();
                info!("Processed {} frames ({:.1} fps)", self.stats.frames, fps);
                last_fps_update = Instant::now();
                frames_at_update = self.stats.frames;
            }
        }

        self.stats.elapsed += start_time.elapsed();
        self.status = SessionStatus::Finished;
        info!(
            "Finished: {} frames in {:.2?} ({:.1} fps), {} detector failures, {} rebuilds",
            self.stats.frames,
            self.stats.elapsed,
            self.stats.fps(),
            self.stats.detector_failures,
            self.stats.rebuilds
        );
        Ok(self.stats)
    }

    fn fail(&mut self, e: crate::Error) -> crate::Error {
        error!("Processing failed: {e}");
        self.status = SessionStatus::Failed(e.to_string());
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::RecordedDetector;
    use crate::Error;

    struct EmptyFactory;

    impl DetectorFactory for EmptyFactory {
        fn build(&self, config: &DetectorConfig) -> Result<Box<dyn PoseDetector>> {
            Ok(Box::new(RecordedDetector::new(Vec::new(), config)?))
        }
    }

    struct FailingFactory;

    impl DetectorFactory for FailingFactory {
        fn build(&self, _config: &DetectorConfig) -> Result<Box<dyn PoseDetector>> {
            Err(Error::DetectorError("model missing".to_string()))
        }
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.output.width = 90;
        config.output.height = 160;
        config
    }

    #[test]
    fn test_timestamps_are_bumped() {
        let mut driver = FrameDriver::new(&small_config(), Box::new(EmptyFactory)).unwrap();
        assert_eq!(driver.next_timestamp(100), 100);
        assert_eq!(driver.next_timestamp(100), 101);
        assert_eq!(driver.next_timestamp(50), 102);
        assert_eq!(driver.next_timestamp(500), 500);
    }

    #[test]
    fn test_empty_frame_is_error() {
        let mut driver = FrameDriver::new(&small_config(), Box::new(EmptyFactory)).unwrap();
        let frame = Frame::new(RgbaImage::new(0, 0), 0);
        assert!(driver.process_frame(&frame).is_err());
    }

    #[test]
    fn test_initial_build_failure_is_error() {
        assert!(FrameDriver::new(&small_config(), Box::new(FailingFactory)).is_err());
    }

    #[test]
    fn test_load_video_failure_sets_status() {
        let mut driver = FrameDriver::new(&small_config(), Box::new(EmptyFactory)).unwrap();
        assert!(driver.load_video(Box::new(FailingFactory)).is_err());
        assert!(matches!(driver.status(), SessionStatus::Failed(_)));
        assert_eq!(driver.detector_name(), "RecordedDetector");
    }

    #[test]
    fn test_invalid_request_is_not_scheduled() {
        let mut driver = FrameDriver::new(&small_config(), Box::new(EmptyFactory)).unwrap();
        let bad = DetectorConfig {
            max_poses: 0,
            ..DetectorConfig::default()
        };
        assert!(driver.request_detector_config(bad, 0).is_err());
        assert!(!driver.has_pending_rebuild());
    }
}
