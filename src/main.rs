//! Renders a stabilized skeleton overlay onto a sequence of video frames.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use skeleton_overlay::{
    app::FrameDriver,
    config::{Config, EXAMPLE_CONFIG},
    detector::RecordedDetectorFactory,
    media::{ImageSequenceSource, PngSequenceSink},
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of decoded frames (png, jpg, bmp), processed in name order
    #[arg(required_unless_present = "print_config")]
    frames: Option<PathBuf>,

    /// Recorded landmark track (JSON lines, one record per frame)
    #[arg(short, long, required_unless_present = "print_config")]
    landmarks: Option<PathBuf>,

    /// Directory for the rendered 1080x1920 frames
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Frame rate of the input sequence
    #[arg(long)]
    fps: Option<f64>,

    /// Pose filter (stabilized, none)
    #[arg(short, long)]
    filter: Option<String>,

    /// Maximum number of poses to track
    #[arg(long)]
    max_poses: Option<usize>,

    /// Base smoothing weight on the previous frame (0.0-1.0)
    #[arg(short, long)]
    smoothing: Option<f32>,

    /// Vertical crop position for tall sources (0.0 top, 1.0 bottom)
    #[arg(long)]
    vertical_bias: Option<f32>,

    /// Disable motion trails
    #[arg(long)]
    no_trails: bool,

    /// Color bones by joint speed
    #[arg(long)]
    velocity_color: bool,

    /// Darken alternating rows
    #[arg(long)]
    scanlines: bool,

    /// Draw landmark indices using this TrueType font
    #[arg(long)]
    label_font: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn apply_overrides(args: &Args, config: &mut Config) {
    if let Some(fps) = args.fps {
        config.output.fps = fps;
    }
    if let Some(filter) = &args.filter {
        config.output.filter.clone_from(filter);
    }
    if let Some(bias) = args.vertical_bias {
        config.output.vertical_bias = bias;
    }
    if let Some(max_poses) = args.max_poses {
        config.detector.max_poses = max_poses;
    }
    if let Some(smoothing) = args.smoothing {
        config.stabilizer.base_smoothing = smoothing;
    }
    if args.no_trails {
        config.render.trails = false;
    }
    if args.velocity_color {
        config.render.velocity_color = true;
    }
    if args.scanlines {
        config.render.scanlines = true;
    }
    if let Some(font) = &args.label_font {
        config.render.draw_ids = true;
        config.render.label_font = Some(font.clone());
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Skeleton Overlay");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };
    apply_overrides(&args, &mut config);
    config.validate().context("invalid configuration")?;

    let (Some(frames), Some(landmarks)) = (&args.frames, &args.landmarks) else {
        anyhow::bail!("both a frame directory and a landmark track are required");
    };
    if config.render.draw_ids && config.render.label_font.is_none() {
        warn!("Labels requested without a font; they will not be drawn");
    }

    let factory = RecordedDetectorFactory::new(landmarks);
    let mut driver = FrameDriver::new(&config, Box::new(factory))?;
    let mut source = ImageSequenceSource::open(frames, config.output.fps)?;
    let mut sink = PngSequenceSink::new(&args.output)?;

    let stats = driver.run(&mut source, &mut sink)?;
    info!(
        "Wrote {} frames to {} ({} with poses)",
        stats.frames,
        args.output.display(),
        stats.frames_with_poses
    );

    Ok(())
}
