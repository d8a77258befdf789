//! Distance to volume mapping and the system volume actuator

use crate::error::{AppError, AppResult};
use crate::smoothing::ease_towards;
use log::{debug, info, warn};
use std::fmt;
use std::process::Command;

/// A volume percentage, always within `0..=100`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct VolumeLevel(u8);

impl VolumeLevel {
    pub const MAX: u8 = 100;

    /// Build a level, clamping to 100
    pub fn new(percent: u8) -> Self {
        Self(percent.min(Self::MAX))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    /// Absolute difference in percentage points
    pub fn abs_diff(&self, other: VolumeLevel) -> u8 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Rescales smoothed fingertip distances into volume levels
#[derive(Debug, Clone)]
pub struct VolumeMapper {
    max_distance: f32,
    sensitivity: f32,
    beta: f32,
}

impl VolumeMapper {
    pub fn new(max_distance: f32, sensitivity: f32, beta: f32) -> Self {
        Self {
            max_distance,
            sensitivity,
            beta,
        }
    }

    /// Target percentage for a distance, clamped to `[0, 100]`
    pub fn target(&self, distance: f32) -> f32 {
        let target = distance * self.sensitivity / self.max_distance * 100.0;
        if target.is_nan() {
            return 0.0;
        }
        target.clamp(0.0, VolumeLevel::MAX as f32)
    }

    /// Map a distance to a level, easing from the last emitted level
    pub fn map(&self, distance: f32, last_emitted: VolumeLevel) -> VolumeLevel {
        let target = self.target(distance);
        let eased = ease_towards(last_emitted.percent() as f32, target, self.beta);
        VolumeLevel::new(eased.clamp(0.0, VolumeLevel::MAX as f32) as u8)
    }
}

/// Something that can set the system output volume.
///
/// Calls are fire-and-forget: implementations log failures and move on.
pub trait VolumeActuator: Send {
    fn set_volume(&mut self, level: VolumeLevel);
}

impl<A: VolumeActuator + ?Sized> VolumeActuator for Box<A> {
    fn set_volume(&mut self, level: VolumeLevel) {
        (**self).set_volume(level)
    }
}

/// Sets the volume of a PulseAudio/PipeWire sink through `pactl`
pub struct PactlActuator {
    sink: String,
}

impl PactlActuator {
    pub fn new(sink: impl Into<String>) -> Self {
        Self { sink: sink.into() }
    }

    fn run(&self, level: VolumeLevel) -> AppResult<()> {
        let status = Command::new("pactl")
            .args(["set-sink-volume", &self.sink, &level.to_string()])
            .status()
            .map_err(|e| AppError::Actuator(format!("failed to run pactl: {}", e)))?;

        if !status.success() {
            return Err(AppError::Actuator(format!("pactl exited with {}", status)));
        }
        Ok(())
    }
}

impl VolumeActuator for PactlActuator {
    fn set_volume(&mut self, level: VolumeLevel) {
        match self.run(level) {
            Ok(()) => debug!("Set {} to {}", self.sink, level),
            Err(e) => warn!("Volume update to {} dropped: {}", level, e),
        }
    }
}

/// Only logs the volume it would set (`--dry-run`)
#[derive(Default)]
pub struct LogActuator;

impl VolumeActuator for LogActuator {
    fn set_volume(&mut self, level: VolumeLevel) {
        info!("Volume -> {}", level);
    }
}

/// List sinks known to the sound server as `(name, description)` pairs
pub fn list_sinks() -> AppResult<Vec<(String, String)>> {
    let output = Command::new("pactl")
        .args(["list", "short", "sinks"])
        .output()
        .map_err(|e| AppError::Actuator(format!("failed to run pactl: {}", e)))?;

    if !output.status.success() {
        return Err(AppError::Actuator(format!(
            "pactl exited with {}",
            output.status
        )));
    }

    Ok(parse_sink_list(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `pactl list short sinks` output (tab separated: id, name, driver, ...)
fn parse_sink_list(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let _id = fields.next()?;
            let name = fields.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let rest: Vec<&str> = fields.map(str::trim).filter(|f| !f.is_empty()).collect();
            Some((name.to_string(), rest.join(" ")))
        })
        .collect()
}
