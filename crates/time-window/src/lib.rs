//! Time-Bounded Sample Windows
//!
//! Provides an append-at-tail, evict-from-head window for per-frame eye
//! samples and blink events.

mod window;

pub use window::{expected_capacity, TimeWindow, Timestamped};

use serde::{Deserialize, Serialize};

/// One analyzed frame as stored in the rolling window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub timestamp_ms: u64,
    /// Average EAR divided by the locked baseline, clamped
    pub normalized_ear: f64,
    pub eye_closed: bool,
}

/// A qualifying closure run that ended on this timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkEvent {
    pub timestamp_ms: u64,
}

impl Timestamped for FrameSample {
    fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

impl Timestamped for BlinkEvent {
    fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}
