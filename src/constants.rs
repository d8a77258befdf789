//! Application constants and default tuning values

/// Hand landmark numbering (21 points per hand)
pub mod landmarks {
    /// Thumb tip
    pub const THUMB_TIP: usize = 4;
    /// Index finger tip
    pub const INDEX_TIP: usize = 8;
    /// Highest landmark index a detector reports
    pub const MAX_INDEX: usize = 20;
}

/// Sensor defaults
pub mod sensor {
    /// Default frame width in pixels
    pub const DEFAULT_FRAME_WIDTH: u32 = 640;
    /// Default frame height in pixels
    pub const DEFAULT_FRAME_HEIGHT: u32 = 480;
    /// Default frame rate of the sensor
    pub const DEFAULT_FPS: u32 = 30;
    /// How long to wait for the acquisition loop after the UI has stopped
    pub const STOP_GRACE_MS: u64 = 500;
}

/// Smoothing algorithm constants
pub mod smoothing {
    /// First stage distance smoothing factor (higher = more responsive)
    pub const DISTANCE_SMOOTHING_FACTOR: f32 = 0.7;
    /// Second stage volume smoothing factor
    pub const VOLUME_SMOOTHING_FACTOR: f32 = 0.8;
    /// Number of smoothed distances retained for diagnostics
    pub const HISTORY_LEN: usize = 5;
}

/// Distance to volume mapping
pub mod volume {
    /// Fingertip distance (pixels) that maps to 100%
    pub const DEFAULT_MAX_DISTANCE: f32 = 300.0;
    /// Multiplier applied to the distance before mapping
    pub const DEFAULT_SENSITIVITY: f32 = 1.0;
    /// Sink used when none is given
    pub const DEFAULT_SINK: &str = "@DEFAULT_SINK@";
}

/// Rate limiter constants
pub mod gate {
    /// Minimum time between two emitted volume updates
    pub const DEFAULT_MIN_INTERVAL_MS: u64 = 300;
    /// Minimum change in percentage points for an update to pass
    pub const DEFAULT_THRESHOLD: u8 = 5;
}

/// UI display constants
pub mod ui {
    /// UI update interval in milliseconds
    pub const UPDATE_INTERVAL_MS: u64 = 10;
    /// Delay before the volume overlay hides itself
    pub const DEFAULT_HIDE_DELAY_MS: u64 = 1000;
    /// Capacity of the command channel before the oldest commands are dropped
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
    pub const MAX_CHANNEL_CAPACITY: usize = 65536;
    /// Bar width calculation accounts for borders
    pub const BAR_BORDER_WIDTH: usize = 2;
    /// Overlay box size in terminal cells
    pub const OVERLAY_WIDTH: u16 = 30;
    pub const OVERLAY_HEIGHT: u16 = 5;
}
