//! Fingertip distance smoothing

use std::collections::VecDeque;
use std::time::Instant;

/// One step of the distance smoother
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSample {
    pub raw: f32,
    pub smoothed: f32,
    pub timestamp: Instant,
}

/// Applies exponential smoothing to raw fingertip distances
pub struct DistanceSmoother {
    alpha: f32,
    smoothed_value: Option<f32>,
    history: VecDeque<f32>,
    history_len: usize,
}

impl DistanceSmoother {
    /// Create a smoother with the given responsiveness (`alpha` weights the
    /// newest sample) keeping `history_len` smoothed values around
    pub fn new(alpha: f32, history_len: usize) -> Self {
        Self {
            alpha,
            smoothed_value: None,
            history: VecDeque::with_capacity(history_len),
            history_len,
        }
    }

    /// Feed a raw distance and get the smoothed sample back.
    /// The first sample passes through unchanged.
    pub fn update(&mut self, raw: f32, timestamp: Instant) -> DistanceSample {
        let smoothed = match self.smoothed_value {
            Some(prev) => self.alpha * raw + (1.0 - self.alpha) * prev,
            None => raw,
        };
        self.smoothed_value = Some(smoothed);

        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(smoothed);

        DistanceSample {
            raw,
            smoothed,
            timestamp,
        }
    }

    /// Recent smoothed values, oldest first
    pub fn history(&self) -> impl Iterator<Item = f32> + '_ {
        self.history.iter().copied()
    }
}

/// Move `prev` towards `target` by the fraction `beta`
pub fn ease_towards(prev: f32, target: f32, beta: f32) -> f32 {
    prev + (target - prev) * beta
}
