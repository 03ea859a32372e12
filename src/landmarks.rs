//! Landmark data model and body topology.
//!
//! A [`Pose`] is the fixed-length sequence of 33 body landmarks produced by
//! the external detector. Positions are normalized to the source frame, and a
//! landmark whose visibility is missing is kept as a distinct unknown state
//! rather than being coerced to zero.

use crate::constants::NUM_LANDMARKS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A single tracked body point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Normalized X coordinate (0.0-1.0 across the source width)
    pub x: f32,
    /// Normalized Y coordinate (0.0-1.0 across the source height)
    pub y: f32,
    /// Detector confidence, `None` when the detector did not report one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    /// Create a landmark with a known confidence
    #[must_use]
    pub const fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            visibility: Some(visibility),
        }
    }

    /// Create a landmark whose confidence is unknown
    #[must_use]
    pub const fn unknown(x: f32, y: f32) -> Self {
        Self { x, y, visibility: None }
    }

    /// Confidence, if known
    #[must_use]
    pub const fn confidence(&self) -> Option<f32> {
        self.visibility
    }
}

/// Anatomical landmark indices shared with the detector output schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = NUM_LANDMARKS;

    const ALL: [Self; NUM_LANDMARKS] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Snake-case name as used by the detector schema
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEyeInner => "left_eye_inner",
            Self::LeftEye => "left_eye",
            Self::LeftEyeOuter => "left_eye_outer",
            Self::RightEyeInner => "right_eye_inner",
            Self::RightEye => "right_eye",
            Self::RightEyeOuter => "right_eye_outer",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::MouthLeft => "mouth_left",
            Self::MouthRight => "mouth_right",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
        }
    }
}

/// Body bones (arms, torso, legs, feet)
pub const POSE_CONNECTIONS: [(usize, usize); 16] = [
    (11, 12),
    (11, 13),
    (13, 15),
    (12, 14),
    (14, 16),
    (11, 23),
    (12, 24),
    (23, 24),
    (23, 25),
    (25, 27),
    (24, 26),
    (26, 28),
    (27, 29),
    (29, 31),
    (28, 30),
    (30, 32),
];

/// Short face strokes from the nose to the inner left eye and left eye
pub const FACE_CONNECTIONS: [(usize, usize); 2] = [(0, 1), (0, 2)];

/// Heels and foot tips: most often self-occluded, lowest validity threshold
pub const FOOT_LANDMARKS: [usize; 4] = [29, 30, 31, 32];

/// Hips through ankles: mid validity threshold
pub const LOWER_BODY_LANDMARKS: [usize; 6] = [23, 24, 25, 26, 27, 28];

/// Knees and below: smoothed less so fast leg motion is not lagged
pub const FAST_LIMB_LANDMARKS: [usize; 8] = [25, 26, 27, 28, 29, 30, 31, 32];

/// Ankles and feet: bridged by linear extrapolation during short occlusions
pub const EXTRAPOLATION_LANDMARKS: [usize; 6] = [27, 28, 29, 30, 31, 32];

/// Ordered set of 33 landmarks for one tracked person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct Pose {
    landmarks: [Landmark; NUM_LANDMARKS],
}

impl Pose {
    #[must_use]
    pub const fn new(landmarks: [Landmark; NUM_LANDMARKS]) -> Self {
        Self { landmarks }
    }

    /// Pose with every landmark at the same position and confidence
    #[must_use]
    pub fn uniform(x: f32, y: f32, visibility: f32) -> Self {
        Self::new([Landmark::new(x, y, visibility); NUM_LANDMARKS])
    }

    #[must_use]
    pub const fn landmarks(&self) -> &[Landmark; NUM_LANDMARKS] {
        &self.landmarks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Landmark> {
        self.landmarks.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }
}

impl TryFrom<Vec<Landmark>> for Pose {
    type Error = Error;

    fn try_from(landmarks: Vec<Landmark>) -> Result<Self> {
        let len = landmarks.len();
        let landmarks: [Landmark; NUM_LANDMARKS] = landmarks.try_into().map_err(|_| {
            Error::InvalidInput(format!("Pose must have {NUM_LANDMARKS} landmarks, got {len}"))
        })?;
        Ok(Self::new(landmarks))
    }
}

impl From<Pose> for Vec<Landmark> {
    fn from(pose: Pose) -> Self {
        pose.landmarks.to_vec()
    }
}

impl Index<usize> for Pose {
    type Output = Landmark;

    fn index(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }
}

impl IndexMut<usize> for Pose {
    fn index_mut(&mut self, index: usize) -> &mut Landmark {
        &mut self.landmarks[index]
    }
}

impl Index<LandmarkIndex> for Pose {
    type Output = Landmark;

    fn index(&self, index: LandmarkIndex) -> &Landmark {
        &self.landmarks[index.index()]
    }
}

impl IndexMut<LandmarkIndex> for Pose {
    fn index_mut(&mut self, index: LandmarkIndex) -> &mut Landmark {
        &mut self.landmarks[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_index_roundtrip() {
        for i in 0..LandmarkIndex::COUNT {
            let idx = LandmarkIndex::from_index(i).unwrap();
            assert_eq!(idx.index(), i);
        }
        assert!(LandmarkIndex::from_index(33).is_none());
        assert_eq!(LandmarkIndex::LeftFootIndex.name(), "left_foot_index");
    }

    #[test]
    fn test_pose_from_vec_length_checked() {
        assert!(Pose::try_from(vec![Landmark::default(); 33]).is_ok());
        assert!(Pose::try_from(vec![Landmark::default(); 17]).is_err());
        assert!(Pose::try_from(Vec::new()).is_err());
    }

    #[test]
    fn test_missing_visibility_deserializes_as_unknown() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.5,"y":0.25}"#).unwrap();
        assert_eq!(lm, Landmark::unknown(0.5, 0.25));

        let lm: Landmark = serde_json::from_str(r#"{"x":0.5,"y":0.25,"visibility":0.8}"#).unwrap();
        assert_eq!(lm.confidence(), Some(0.8));
    }

    #[test]
    fn test_pose_deserialize_rejects_short_sequence() {
        let short = serde_json::to_string(&vec![Landmark::new(0.1, 0.1, 1.0); 5]).unwrap();
        assert!(serde_json::from_str::<Pose>(&short).is_err());
    }

    #[test]
    fn test_connections_reference_valid_indices() {
        for (a, b) in POSE_CONNECTIONS.iter().chain(FACE_CONNECTIONS.iter()) {
            assert!(*a < NUM_LANDMARKS && *b < NUM_LANDMARKS);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_index_by_anatomical_name() {
        let mut pose = Pose::uniform(0.5, 0.5, 1.0);
        pose[LandmarkIndex::Nose].x = 0.1;
        assert_eq!(pose[0].x, 0.1);
    }
}
