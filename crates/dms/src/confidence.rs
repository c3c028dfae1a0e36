//! Confidence scoring

use crate::state::FatigueLevel;
use crate::DmsConfig;

/// Fuses temporal maturity, verdict and signal stability into `[0, 1]`
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    warmup_frames: u32,
    maturity_frames: u32,
}

impl ConfidenceScorer {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            warmup_frames: config.warmup_frames,
            maturity_frames: config.maturity_frames.max(1),
        }
    }

    /// Still inside the post-baseline warm-up
    pub fn is_warming_up(&self, frames_since_baseline: u32) -> bool {
        frames_since_baseline < self.warmup_frames
    }

    pub fn score(&self, frames_since_baseline: u32, level: FatigueLevel, stability: f64) -> f64 {
        if self.is_warming_up(frames_since_baseline) {
            return 0.0;
        }

        let temporal = (frames_since_baseline as f64 / self.maturity_frames as f64).min(1.0);
        let state = if level == FatigueLevel::Low { 0.5 } else { 1.0 };

        ((0.5 * temporal + 0.5 * state) * stability.clamp(0.0, 1.0)).clamp(0.0, 1.0)
    }
}
