//! Stabilized skeleton overlay for vertical video.
//!
//! This library turns a stream of decoded video frames plus per-frame body
//! landmarks into a 1080×1920 portrait surface with a temporally smoothed
//! skeleton drawn on top:
//! - Cover-style fitting of any source aspect ratio onto the 9:16 surface
//! - Per-landmark visibility gating with looser thresholds for legs and feet
//! - Exponential smoothing with occlusion hold, extrapolation and freeze
//! - Trail rendering with optional velocity coloring, labels and scanlines
//!
//! The processing pipeline for each frame is:
//! 1. Fit the frame onto the output surface (crop to fill, no distortion)
//! 2. Detect poses through a [`detector::PoseDetector`]
//! 3. Stabilize each pose slot with a [`filters::PoseFilter`]
//! 4. Draw bones and joints into the fading trail layer and composite
//!
//! # Examples
//!
//! ## Processing an Image Sequence
//!
//! ```no_run
//! use skeleton_overlay::{
//!     app::FrameDriver,
//!     config::Config,
//!     detector::RecordedDetectorFactory,
//!     media::{ImageSequenceSource, PngSequenceSink},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let factory = RecordedDetectorFactory::new("landmarks.jsonl");
//! let mut driver = FrameDriver::new(&config, Box::new(factory))?;
//!
//! let mut source = ImageSequenceSource::open("frames/", config.output.fps)?;
//! let mut sink = PngSequenceSink::new("out/")?;
//! let stats = driver.run(&mut source, &mut sink)?;
//! println!("{} frames at {:.1} fps", stats.frames, stats.fps());
//! # Ok(())
//! # }
//! ```
//!
//! ## Stabilizing Poses Directly
//!
//! ```no_run
//! use skeleton_overlay::{
//!     filters::{create_filter, stabilizer::StabilizerConfig},
//!     landmarks::Pose,
//!     validity::ValidityThresholds,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("stabilized", &StabilizerConfig::default(), &ValidityThresholds::default())?;
//!
//! let first = filter.apply(&Pose::uniform(0.5, 0.5, 0.9));
//! let second = filter.apply(&Pose::uniform(0.6, 0.5, 0.9));
//! println!("Nose moved from {:.3} to {:.3}", first[0].x, second[0].x);
//!
//! filter.reset();
//! # Ok(())
//! # }
//! ```
//!
//! ## Fitting a Landscape Frame
//!
//! ```no_run
//! use skeleton_overlay::geometry::compute_fit;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fit = compute_fit(1920.0, 1080.0, 1080.0, 1920.0, 0.5)?;
//! let (x, y) = fit.map_point(0.5, 0.5);
//! println!("Source center lands at ({x}, {y})");
//! # Ok(())
//! # }
//! ```

/// Landmark data model and body topology
pub mod landmarks;

/// Source-to-surface fit transform
pub mod geometry;

/// Per-landmark visibility gate
pub mod validity;

/// Temporal pose filters
pub mod filters;

/// Speed to color mapping
pub mod color;

/// Trail layer, skeleton drawing and effects
pub mod render;

/// Pose detector interface and recorded tracks
pub mod detector;

/// Frame sources and sinks
pub mod media;

/// Timestamp-driven debouncer
pub mod debounce;

/// Utility functions for numeric conversions
pub mod utils;

/// Error types and result handling
pub mod error;

/// Frame driver owning the session state
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
