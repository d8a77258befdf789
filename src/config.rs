//! Configuration parsing and validation

use crate::constants::{gate, sensor, smoothing, ui, volume};
use crate::error::{AppError, AppResult};
use crate::gate::GatePolicy;
use crate::landmarks::LostHandPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments for the pinchvol application
#[derive(Parser)]
#[command(name = "pinchvol")]
#[command(about = "Set the system volume with a thumb and index finger pinch")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Track the hand and control the volume until interrupted
    Run(RunArgs),
    /// List audio output sinks and pick one
    Sinks(SinksArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Landmark trace to replay ("-" for stdin); a synthetic hand is used if omitted
    #[arg(long)]
    pub trace: Option<String>,

    /// Sensor frame rate
    #[arg(long, default_value_t = sensor::DEFAULT_FPS)]
    pub fps: u32,

    /// Frame width in pixels, used to scale landmark coordinates
    #[arg(long, default_value_t = sensor::DEFAULT_FRAME_WIDTH)]
    pub frame_width: u32,

    /// Frame height in pixels, used to scale landmark coordinates
    #[arg(long, default_value_t = sensor::DEFAULT_FRAME_HEIGHT)]
    pub frame_height: u32,

    /// Fingertip distance in pixels that maps to 100%
    #[arg(long, default_value_t = volume::DEFAULT_MAX_DISTANCE)]
    pub max_distance: f32,

    /// Multiplier applied to the fingertip distance
    #[arg(long, default_value_t = volume::DEFAULT_SENSITIVITY)]
    pub sensitivity: f32,

    /// Distance smoothing factor, weight of the newest sample
    #[arg(long, default_value_t = smoothing::DISTANCE_SMOOTHING_FACTOR)]
    pub alpha: f32,

    /// Volume smoothing factor, fraction of the way to the target per update
    #[arg(long, default_value_t = smoothing::VOLUME_SMOOTHING_FACTOR)]
    pub beta: f32,

    /// Minimum time between volume updates in milliseconds
    #[arg(long, default_value_t = gate::DEFAULT_MIN_INTERVAL_MS)]
    pub min_interval_ms: u64,

    /// Minimum volume change in percentage points
    #[arg(long, default_value_t = gate::DEFAULT_THRESHOLD)]
    pub threshold: u8,

    /// Conditions an update must meet
    #[arg(long, value_enum, default_value_t = GatePolicy::Both)]
    pub gate: GatePolicy,

    /// What to do while no hand is visible
    #[arg(long, value_enum, default_value_t = LostHandPolicy::Sticky)]
    pub lost_hand: LostHandPolicy,

    /// How long the overlay stays up after the last update, in milliseconds
    #[arg(long, default_value_t = ui::DEFAULT_HIDE_DELAY_MS)]
    pub hide_delay_ms: u64,

    /// Pending UI commands kept before the oldest are dropped
    #[arg(long, default_value_t = ui::DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Audio sink to control (see `pinchvol sinks`)
    #[arg(long, default_value = volume::DEFAULT_SINK)]
    pub sink: String,

    /// Log volume changes instead of applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Log overlay changes instead of drawing in the terminal
    #[arg(long)]
    pub headless: bool,

    /// Write log output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SinksArgs {}

/// Application configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct Config {
    pub trace: Option<String>,
    pub fps: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub max_distance: f32,
    pub sensitivity: f32,
    pub alpha: f32,
    pub beta: f32,
    pub min_interval: Duration,
    pub threshold: u8,
    pub gate: GatePolicy,
    pub lost_hand: LostHandPolicy,
    pub hide_delay: Duration,
    pub channel_capacity: usize,
    pub sink: String,
    pub dry_run: bool,
    pub headless: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trace: None,
            fps: sensor::DEFAULT_FPS,
            frame_width: sensor::DEFAULT_FRAME_WIDTH,
            frame_height: sensor::DEFAULT_FRAME_HEIGHT,
            max_distance: volume::DEFAULT_MAX_DISTANCE,
            sensitivity: volume::DEFAULT_SENSITIVITY,
            alpha: smoothing::DISTANCE_SMOOTHING_FACTOR,
            beta: smoothing::VOLUME_SMOOTHING_FACTOR,
            min_interval: Duration::from_millis(gate::DEFAULT_MIN_INTERVAL_MS),
            threshold: gate::DEFAULT_THRESHOLD,
            gate: GatePolicy::default(),
            lost_hand: LostHandPolicy::default(),
            hide_delay: Duration::from_millis(ui::DEFAULT_HIDE_DELAY_MS),
            channel_capacity: ui::DEFAULT_CHANNEL_CAPACITY,
            sink: volume::DEFAULT_SINK.to_string(),
            dry_run: false,
            headless: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Create configuration from run arguments
    pub fn from_run_args(args: RunArgs) -> AppResult<Self> {
        let invalid = |msg: String| -> AppResult<Self> { Err(AppError::Config(msg)) };

        if !(args.alpha > 0.0 && args.alpha <= 1.0) {
            return invalid(format!("Alpha must be in (0, 1], got {}", args.alpha));
        }
        if !(args.beta > 0.0 && args.beta <= 1.0) {
            return invalid(format!("Beta must be in (0, 1], got {}", args.beta));
        }
        if !(args.max_distance > 0.0 && args.max_distance.is_finite()) {
            return invalid(format!(
                "Maximum distance must be positive, got {}",
                args.max_distance
            ));
        }
        if !(args.sensitivity > 0.0 && args.sensitivity.is_finite()) {
            return invalid(format!(
                "Sensitivity must be positive, got {}",
                args.sensitivity
            ));
        }
        if args.fps == 0 || args.fps > 240 {
            return invalid(format!("FPS must be between 1 and 240, got {}", args.fps));
        }
        if args.frame_width == 0 || args.frame_height == 0 {
            return invalid("Frame dimensions must be non-zero".to_string());
        }
        if args.threshold > 100 {
            return invalid(format!(
                "Threshold must be between 0 and 100, got {}",
                args.threshold
            ));
        }
        if args.hide_delay_ms == 0 {
            return invalid("Hide delay must be positive".to_string());
        }
        if args.channel_capacity == 0 || args.channel_capacity > ui::MAX_CHANNEL_CAPACITY {
            return invalid(format!(
                "Channel capacity must be between 1 and {}, got {}",
                ui::MAX_CHANNEL_CAPACITY,
                args.channel_capacity
            ));
        }
        if args.sink.trim().is_empty() {
            return invalid("Sink name must not be empty".to_string());
        }

        Ok(Config {
            trace: args.trace,
            fps: args.fps,
            frame_width: args.frame_width,
            frame_height: args.frame_height,
            max_distance: args.max_distance,
            sensitivity: args.sensitivity,
            alpha: args.alpha,
            beta: args.beta,
            min_interval: Duration::from_millis(args.min_interval_ms),
            threshold: args.threshold,
            gate: args.gate,
            lost_hand: args.lost_hand,
            hide_delay: Duration::from_millis(args.hide_delay_ms),
            channel_capacity: args.channel_capacity,
            sink: args.sink,
            dry_run: args.dry_run,
            headless: args.headless,
            log_file: args.log_file,
        })
    }
}
