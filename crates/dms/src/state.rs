//! Driver state tracking

use serde::{Deserialize, Serialize};
use time_window::{BlinkEvent, FrameSample, TimeWindow};

use crate::blink::EyePhase;

/// Fatigue level
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum FatigueLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl FatigueLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FatigueLevel::Low => "LOW",
            FatigueLevel::Medium => "MEDIUM",
            FatigueLevel::High => "HIGH",
        }
    }
}

impl std::fmt::Display for FatigueLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Personal open-eye reference collected at the start of a stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    /// Accepted average-EAR samples while collecting
    pub samples: Vec<f64>,
    /// Arrival time of the first calibration frame
    pub start_ms: Option<u64>,
    /// Locked baseline EAR; set once, cleared only by reset
    pub locked: Option<f64>,
}

impl Baseline {
    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }
}

/// Everything the analyzer carries between frames.
///
/// Window sizes are bounded by roughly `fps * horizon`; see
/// [`time_window::expected_capacity`].
#[derive(Debug, Clone)]
pub struct AnalyzerState {
    pub baseline: Baseline,

    /// Per-frame closure flags and normalized EAR
    pub frames: TimeWindow<FrameSample>,

    /// Blink timestamps
    pub blinks: TimeWindow<BlinkEvent>,

    /// Current eye phase, carrying the closure run length
    pub eye_phase: EyePhase,

    /// Frames analyzed since the baseline locked
    pub frames_since_baseline: u32,

    pub last_blink_ms: Option<u64>,

    /// Start of the current run of low normalized EAR
    pub low_ear_start_ms: Option<u64>,

    pub last_face_seen_ms: Option<u64>,

    /// Last verdict, for change logging
    pub last_level: FatigueLevel,
}

impl AnalyzerState {
    /// Fresh state with empty windows of the given horizon
    pub fn new(horizon_ms: u64) -> Self {
        Self {
            baseline: Baseline::default(),
            frames: TimeWindow::with_frame_rate(horizon_ms, 30),
            blinks: TimeWindow::new(horizon_ms),
            eye_phase: EyePhase::Open,
            frames_since_baseline: 0,
            last_blink_ms: None,
            low_ear_start_ms: None,
            last_face_seen_ms: None,
            last_level: FatigueLevel::Low,
        }
    }

    /// Clear all history (on stream restart or driver change)
    pub fn reset(&mut self) {
        *self = Self::new(self.frames.horizon_ms());
    }
}
