//! Baseline EAR calibration

use tracing::debug;

use crate::state::Baseline;
use crate::DmsConfig;

/// Outcome of feeding one frame to the calibrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStep {
    /// Still collecting; `accepted` samples so far
    Collecting { accepted: usize },
    /// Baseline locked on this frame
    Locked(f64),
    /// Baseline was already locked; nothing changed
    AlreadyLocked(f64),
}

/// Collects open-eye EAR samples and locks a personal baseline.
///
/// `Collecting -> Locked` once both the elapsed time and the sample count
/// reach their minimums. A locked baseline never changes.
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    window_ms: u64,
    min_samples: usize,
    plausible: (f64, f64),
    floor: f64,
}

impl BaselineCalibrator {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            window_ms: config.calibration_window_ms,
            min_samples: config.min_calibration_samples,
            plausible: config.plausible_ear_range,
            floor: config.baseline_floor,
        }
    }

    /// Whether an average EAR looks like an open eye
    pub fn is_plausible(&self, avg_ear: f64) -> bool {
        avg_ear > self.plausible.0 && avg_ear < self.plausible.1
    }

    pub fn observe(&self, baseline: &mut Baseline, avg_ear: f64, now_ms: u64) -> CalibrationStep {
        if let Some(locked) = baseline.locked {
            return CalibrationStep::AlreadyLocked(locked);
        }

        let start = *baseline.start_ms.get_or_insert(now_ms);

        if self.is_plausible(avg_ear) {
            baseline.samples.push(avg_ear);
        }

        let elapsed = now_ms.saturating_sub(start);
        if elapsed >= self.window_ms && baseline.samples.len() >= self.min_samples {
            let mean = baseline.samples.iter().sum::<f64>() / baseline.samples.len() as f64;
            let value = mean.max(self.floor);

            debug!(
                baseline_ear = value,
                samples = baseline.samples.len(),
                elapsed_ms = elapsed,
                "Baseline locked"
            );

            baseline.locked = Some(value);
            baseline.samples.clear();
            return CalibrationStep::Locked(value);
        }

        CalibrationStep::Collecting {
            accepted: baseline.samples.len(),
        }
    }
}

/// Average EAR relative to the baseline, clamped to `range`
pub fn normalized_ear(avg_ear: f64, baseline: f64, range: (f64, f64)) -> f64 {
    (avg_ear / baseline).clamp(range.0, range.1)
}
