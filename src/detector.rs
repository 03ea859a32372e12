//! Pose landmark detector interface and the recorded-track adapter.
//!
//! The real landmark model lives outside this crate. Anything that can turn
//! a frame into zero or more 33-point poses implements [`PoseDetector`]; a
//! [`DetectorFactory`] builds one from a [`DetectorConfig`] whenever the
//! detection parameters change.

use crate::constants::{
    DEFAULT_DETECTION_CONFIDENCE, DEFAULT_MAX_POSES, DEFAULT_REBUILD_DEBOUNCE_MS, DEFAULT_TRACKING_CONFIDENCE,
};
use crate::landmarks::Pose;
use crate::{Error, Result};
use image::RgbaImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Upper bound on simultaneously tracked poses
pub const MAX_SUPPORTED_POSES: usize = 16;

/// Parameters that require a detector rebuild when changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Maximum number of poses reported per frame
    pub max_poses: usize,
    /// Minimum confidence for a new pose detection (0.0-1.0)
    pub min_detection_confidence: f32,
    /// Minimum confidence to keep tracking a pose (0.0-1.0)
    pub min_tracking_confidence: f32,
    /// Minimum pose presence score, detector default when unset
    pub min_presence_confidence: Option<f32>,
    /// Quiet period before a requested rebuild is applied
    pub rebuild_debounce_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_poses: DEFAULT_MAX_POSES,
            min_detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
            min_tracking_confidence: DEFAULT_TRACKING_CONFIDENCE,
            min_presence_confidence: None,
            rebuild_debounce_ms: DEFAULT_REBUILD_DEBOUNCE_MS,
        }
    }
}

impl DetectorConfig {
    /// Validate parameter ranges
    ///
    /// # Errors
    ///
    /// Returns an error if the pose count or any confidence is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.max_poses == 0 || self.max_poses > MAX_SUPPORTED_POSES {
            return Err(Error::ConfigError(format!(
                "Max poses must be between 1 and {MAX_SUPPORTED_POSES}, got {}",
                self.max_poses
            )));
        }
        let confidences = [
            ("min_detection_confidence", Some(self.min_detection_confidence)),
            ("min_tracking_confidence", Some(self.min_tracking_confidence)),
            ("min_presence_confidence", self.min_presence_confidence),
        ];
        for (name, value) in confidences {
            if let Some(value) = value {
                if !(0.0..=1.0).contains(&value) {
                    return Err(Error::ConfigError(format!(
                        "Detector parameter '{name}' must be between 0.0 and 1.0, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A landmark detector running in video mode
pub trait PoseDetector: Send {
    /// Detect poses in `frame`; timestamps must strictly increase across calls
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails for this frame.
    fn detect(&mut self, frame: &RgbaImage, timestamp_micros: u64) -> Result<Vec<Pose>>;

    /// Get detector name
    fn name(&self) -> &str;
}

/// Builds detectors for a given configuration
pub trait DetectorFactory {
    /// Build a detector
    ///
    /// # Errors
    ///
    /// Returns an error if the detector cannot be created.
    fn build(&self, config: &DetectorConfig) -> Result<Box<dyn PoseDetector>>;
}

/// One line of a recorded landmark track
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_micros: Option<u64>,
    #[serde(default)]
    pub poses: Vec<Pose>,
}

/// Replays landmarks recorded from an earlier detector run.
///
/// A track whose records all carry `timestamp_micros` is matched against
/// frame timestamps: each call returns the latest record at or before the
/// frame time that has not been returned yet, so a rebuilt detector picks
/// up where the video is. A track without timestamps is replayed one record
/// per call. Either way, an exhausted track yields no poses.
///
/// Detectors built by one [`RecordedDetectorFactory`] share the replay
/// position, so a rebuild in the middle of a video continues from the
/// current record.
#[derive(Debug)]
pub struct RecordedDetector {
    records: Vec<TrackRecord>,
    timed: bool,
    cursor: Arc<AtomicUsize>,
    max_poses: usize,
}

impl RecordedDetector {
    /// Create a detector over already parsed records
    ///
    /// # Errors
    ///
    /// Returns an error if only some records carry timestamps, or timestamps decrease.
    pub fn new(records: Vec<TrackRecord>, config: &DetectorConfig) -> Result<Self> {
        config.validate()?;
        let timed_count = records.iter().filter(|r| r.timestamp_micros.is_some()).count();
        if timed_count != 0 && timed_count != records.len() {
            return Err(Error::DetectorError(format!(
                "Track mixes timed and untimed records ({timed_count} of {} timed)",
                records.len()
            )));
        }
        let timed = timed_count != 0;
        if timed
            && records
                .windows(2)
                .any(|w| w[1].timestamp_micros < w[0].timestamp_micros)
        {
            return Err(Error::DetectorError("Track timestamps must not decrease".to_string()));
        }
        Ok(Self {
            records,
            timed,
            cursor: Arc::new(AtomicUsize::new(0)),
            max_poses: config.max_poses,
        })
    }

    /// Parse a JSON-lines track; blank lines are skipped
    ///
    /// # Errors
    ///
    /// Returns an error naming the first line that fails to parse.
    pub fn from_reader<R: BufRead>(reader: R, config: &DetectorConfig) -> Result<Self> {
        let mut records = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: TrackRecord = serde_json::from_str(&line)
                .map_err(|e| Error::DetectorError(format!("Track line {}: {}", line_no + 1, e)))?;
            records.push(record);
        }
        Self::new(records, config)
    }

    /// Load a JSON-lines track from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P, config: &DetectorConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::DetectorError(format!("Failed to open track {}: {}", path.display(), e)))?;
        let detector = Self::from_reader(BufReader::new(file), config)?;
        info!(
            "Loaded landmark track {} ({} records, {})",
            path.display(),
            detector.records.len(),
            if detector.timed { "timed" } else { "frame-ordered" }
        );
        Ok(detector)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records not yet replayed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.records.len().saturating_sub(self.cursor.load(Ordering::Relaxed))
    }

    /// Continue from the replay position held by `cursor`
    fn with_cursor(mut self, cursor: Arc<AtomicUsize>) -> Self {
        self.cursor = cursor;
        self
    }

    fn next_record(&self, timestamp_micros: u64) -> Option<&TrackRecord> {
        let mut cursor = self.cursor.load(Ordering::Relaxed);
        let found = if self.timed {
            let mut found = None;
            while let Some(record) = self.records.get(cursor) {
                if record.timestamp_micros.is_some_and(|ts| ts > timestamp_micros) {
                    break;
                }
                found = Some(cursor);
                cursor += 1;
            }
            found
        } else if cursor < self.records.len() {
            cursor += 1;
            Some(cursor - 1)
        } else {
            None
        };
        self.cursor.store(cursor, Ordering::Relaxed);
        found.and_then(|i| self.records.get(i))
    }
}

impl PoseDetector for RecordedDetector {
    fn detect(&mut self, _frame: &RgbaImage, timestamp_micros: u64) -> Result<Vec<Pose>> {
        let max_poses = self.max_poses;
        let Some(record) = self.next_record(timestamp_micros) else {
            debug!("No recorded poses at {timestamp_micros}us");
            return Ok(Vec::new());
        };
        Ok(record.poses.iter().take(max_poses).cloned().collect())
    }

    fn name(&self) -> &str {
        "RecordedDetector"
    }
}

/// Rebuilds a [`RecordedDetector`] from its track file.
///
/// One factory serves one video: every detector it builds resumes at the
/// shared replay position.
#[derive(Debug)]
pub struct RecordedDetectorFactory {
    path: PathBuf,
    cursor: Arc<AtomicUsize>,
}

impl RecordedDetectorFactory {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the next record to replay
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}

impl DetectorFactory for RecordedDetectorFactory {
    fn build(&self, config: &DetectorConfig) -> Result<Box<dyn PoseDetector>> {
        let detector = RecordedDetector::from_file(&self.path, config)?.with_cursor(Arc::clone(&self.cursor));
        debug!("Resuming landmark track at record {}", self.position());
        Ok(Box::new(detector))
    }
}
