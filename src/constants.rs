//! Constants used throughout the library

/// Number of landmarks in a pose
pub const NUM_LANDMARKS: usize = 33;

/// Fixed output surface width (9:16 vertical)
pub const OUTPUT_WIDTH: u32 = 1080;

/// Fixed output surface height (9:16 vertical)
pub const OUTPUT_HEIGHT: u32 = 1920;

/// Default vertical crop bias (0.5 centers the crop)
pub const DEFAULT_VERTICAL_BIAS: f32 = 0.5;

/// Default validity thresholds
pub const DEFAULT_FOOT_THRESHOLD: f32 = 0.1;
pub const DEFAULT_LOWER_BODY_THRESHOLD: f32 = 0.25;
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.4;

/// Default stabilizer parameters
pub const DEFAULT_BASE_SMOOTHING: f32 = 0.6;
pub const DEFAULT_LOWER_FACTOR: f32 = 0.6;
pub const DEFAULT_CAP_LOWER: f32 = 0.6;
pub const DEFAULT_CAP_UPPER: f32 = 0.9;
pub const DEFAULT_GRACE_FRAMES: u32 = 10;
pub const DEFAULT_CONFIDENCE_DECAY: f32 = 0.9;
pub const DEFAULT_EXTRAPOLATION_DECAY: f32 = 0.75;

/// Reference speed (canvas pixels per frame) mapped to pure blue
pub const DEFAULT_VELOCITY_MAX: f32 = 120.0;

/// Default renderer parameters
pub const DEFAULT_TRAIL_FADE: f32 = 0.85;
pub const DEFAULT_DRAW_ALPHA: f32 = 0.9;
pub const DEFAULT_BONE_WIDTH: u32 = 2;
pub const DEFAULT_JOINT_RADIUS: i32 = 4;
pub const DEFAULT_LABEL_SIZE: f32 = 18.0;
pub const DEFAULT_SCANLINE_STRENGTH: f32 = 0.25;
pub const DEFAULT_SCANLINE_BAND: u32 = 1;

/// Label placement offset from the joint center, in pixels
pub const LABEL_OFFSET_X: i32 = 5;
pub const LABEL_OFFSET_Y: i32 = -5;

/// Default detector parameters
pub const DEFAULT_MAX_POSES: usize = 1;
pub const DEFAULT_DETECTION_CONFIDENCE: f32 = 0.5;
pub const DEFAULT_TRACKING_CONFIDENCE: f32 = 0.5;
pub const DEFAULT_REBUILD_DEBOUNCE_MS: u64 = 300;

/// Default frames per second assumption for image sequences
pub const DEFAULT_FPS: f64 = 30.0;

