//! Frame sources and sinks.
//!
//! Decoding video containers is left to external tools; the driver consumes
//! frames through [`FrameSource`] and hands each finished surface to a
//! [`FrameSink`]. The bundled implementations read and write numbered image
//! sequences.

use crate::{Error, Result};
use image::RgbaImage;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// A decoded source frame and its presentation time
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbaImage,
    pub timestamp_micros: u64,
}

impl Frame {
    #[must_use]
    pub const fn new(image: RgbaImage, timestamp_micros: u64) -> Self {
        Self {
            image,
            timestamp_micros,
        }
    }
}

/// Pull-based frame producer
pub trait FrameSource {
    /// Next frame in presentation order, `None` once the source is exhausted
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be read or decoded.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Consumer of finished output surfaces
pub trait FrameSink {
    /// Take the rendered surface for output frame `index`
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written.
    fn consume(&mut self, surface: &RgbaImage, index: u64) -> Result<()>;
}

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Reads a directory of still images as a video, in file name order
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
    fps: f64,
}

impl ImageSequenceSource {
    /// Open a directory of png/jpg/jpeg/bmp frames played back at `fps`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed, holds no images,
    /// or `fps` is not positive.
    pub fn open<P: AsRef<Path>>(dir: P, fps: f64) -> Result<Self> {
        let dir = dir.as_ref();
        if !(fps.is_finite() && fps > 0.0) {
            return Err(Error::InvalidInput(format!("Frame rate must be positive, got {fps}")));
        }
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::MediaError(format!("Cannot read frame directory {}: {}", dir.display(), e)))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if is_image_file(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(Error::MediaError(format!("No image frames found in {}", dir.display())));
        }
        paths.sort();
        info!("Opened {} frames from {} at {:.2} fps", paths.len(), dir.display(), fps);
        Ok(Self { paths, next: 0, fps })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[must_use]
    pub const fn fps(&self) -> f64 {
        self.fps
    }

    /// Presentation time of frame `index`
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn timestamp_for(&self, index: usize) -> u64 {
        (index as f64 * 1_000_000.0 / self.fps).round() as u64
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let image = image::open(path)
            .map_err(|e| Error::MediaError(format!("Failed to decode {}: {}", path.display(), e)))?
            .to_rgba8();
        let timestamp = self.timestamp_for(self.next);
        debug!("Decoded {} at {}us", path.display(), timestamp);
        self.next += 1;
        Ok(Some(Frame::new(image, timestamp)))
    }
}

/// Writes each surface as `frame_NNNNNN.png` into a directory
#[derive(Debug, Clone)]
pub struct PngSequenceSink {
    dir: PathBuf,
    written: u64,
}

impl PngSequenceSink {
    /// Create the sink, creating `dir` if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, written: 0 })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    #[must_use]
    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl FrameSink for PngSequenceSink {
    fn consume(&mut self, surface: &RgbaImage, index: u64) -> Result<()> {
        let path = self.path_for(index);
        surface.save(&path)?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_sequence_is_sorted_and_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        for (name, shade) in [("b.png", 20u8), ("a.png", 10), ("c.bmp", 30)] {
            RgbaImage::from_pixel(2, 2, Rgba([shade, shade, shade, 255]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), 25.0).unwrap();
        assert_eq!(source.len(), 3);
        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.image.get_pixel(0, 0)[0], 10);
        assert_eq!(first.timestamp_micros, 0);
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.timestamp_micros, 40_000);
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_empty_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageSequenceSource::open(dir.path(), 30.0),
            Err(Error::MediaError(_))
        ));
    }

    #[test]
    fn test_rejects_bad_fps() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequenceSource::open(dir.path(), 0.0).is_err());
    }

    #[test]
    fn test_png_sink_writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PngSequenceSink::new(dir.path().join("out")).unwrap();
        sink.consume(&RgbaImage::new(3, 5), 7).unwrap();
        assert_eq!(sink.written(), 1);
        assert!(sink.path_for(7).starts_with(sink.dir()));
        let written = image::open(sink.path_for(7)).unwrap();
        assert_eq!((written.width(), written.height()), (3, 5));
    }
}
