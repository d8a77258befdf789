//! State shared between the acquisition and presentation loops

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set-once stop flag observed by both loops.
///
/// Cloning gives another handle to the same flag.
#[derive(Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Returns `true` for the call that actually set it.
    pub fn trigger(&self) -> bool {
        !self.stopped.swap(true, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}
