//! Blink detection state machine

use serde::{Deserialize, Serialize};

use crate::DmsConfig;

/// Closure runs saturate here instead of growing without bound
pub const MAX_CLOSURE_RUN: u32 = 10_000;

/// Eye phase between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EyePhase {
    #[default]
    Open,
    /// Eyes closed for this many consecutive frames
    Closed(u32),
}

/// What happened on one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkStep {
    pub eye_closed: bool,
    /// A qualifying closure run ended on this frame
    pub blink: bool,
    /// Length of the closure run that ended on this frame, if any
    pub ended_run: Option<u32>,
}

/// Per-frame blink FSM over normalized EAR.
///
/// `Open -> Closed(1)` on closure, `Closed(n) -> Closed(n+1)` while closed,
/// `Closed(n) -> Open` on reopening, emitting a blink iff
/// `min_closed_frames <= n <= max_blink_frames`.
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    closure_ratio: f64,
    min_closed_frames: u32,
    max_blink_frames: u32,
}

impl BlinkDetector {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            closure_ratio: config.closure_ratio,
            min_closed_frames: config.min_closed_frames,
            max_blink_frames: config.max_blink_frames,
        }
    }

    pub fn is_closed(&self, normalized_ear: f64) -> bool {
        normalized_ear < self.closure_ratio
    }

    pub fn step(&self, phase: &mut EyePhase, normalized_ear: f64) -> BlinkStep {
        let eye_closed = self.is_closed(normalized_ear);

        let (next, ended_run) = match (*phase, eye_closed) {
            (EyePhase::Open, true) => (EyePhase::Closed(1), None),
            (EyePhase::Closed(n), true) => {
                (EyePhase::Closed(n.saturating_add(1).min(MAX_CLOSURE_RUN)), None)
            }
            (EyePhase::Closed(n), false) => (EyePhase::Open, Some(n)),
            (EyePhase::Open, false) => (EyePhase::Open, None),
        };
        *phase = next;

        let blink = ended_run
            .is_some_and(|n| n >= self.min_closed_frames && n <= self.max_blink_frames);

        BlinkStep {
            eye_closed,
            blink,
            ended_run,
        }
    }
}
