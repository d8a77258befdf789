//! Rate limiting of volume updates

use crate::volume::VolumeLevel;
use clap::ValueEnum;
use log::trace;
use std::time::{Duration, Instant};

/// Which conditions an update must meet to pass the gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GatePolicy {
    /// Minimum interval elapsed and change at least the threshold
    #[default]
    Both,
    /// Minimum interval elapsed, any change size
    TimeOnly,
}

/// Outcome of offering a candidate level to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Emit,
    Suppress,
}

/// Last update that made it through the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateState {
    pub last_emitted_volume: VolumeLevel,
    pub last_emitted_time: Instant,
}

/// Suppresses volume updates that come too soon or change too little
pub struct ChangeGate {
    policy: GatePolicy,
    min_interval: Duration,
    threshold: u8,
    state: GateState,
}

impl ChangeGate {
    /// Create a gate whose clock starts at `start` with a level of 0
    pub fn new(policy: GatePolicy, min_interval: Duration, threshold: u8, start: Instant) -> Self {
        Self {
            policy,
            min_interval,
            threshold,
            state: GateState {
                last_emitted_volume: VolumeLevel::default(),
                last_emitted_time: start,
            },
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Offer a candidate level. State only changes when it is emitted.
    pub fn evaluate(&mut self, candidate: VolumeLevel, now: Instant) -> GateDecision {
        let elapsed = now.saturating_duration_since(self.state.last_emitted_time);
        let time_ok = elapsed >= self.min_interval;
        let change_ok = match self.policy {
            GatePolicy::Both => candidate.abs_diff(self.state.last_emitted_volume) >= self.threshold,
            GatePolicy::TimeOnly => true,
        };

        if time_ok && change_ok {
            self.state = GateState {
                last_emitted_volume: candidate,
                last_emitted_time: now,
            };
            GateDecision::Emit
        } else {
            trace!(
                "Suppressed {} (last {}, {:?} ago)",
                candidate, self.state.last_emitted_volume, elapsed
            );
            GateDecision::Suppress
        }
    }
}
