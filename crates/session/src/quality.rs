//! Data quality counters

use dms::{AnalysisResult, FatigueLevel};
use serde::{Deserialize, Serialize};

/// Frames below this confidence are counted but not trusted
pub const LOW_CONFIDENCE_CUTOFF: f64 = 0.4;

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualitySnapshot {
    pub total_frames: u64,
    pub face_detected_frames: u64,
    pub calibration_frames: u64,
    pub valid_fatigue_frames: u64,
    /// Frames without a face
    pub dropped_frames: u64,
    pub low_confidence_frames: u64,
    pub high_fatigue_frames: u64,
    /// Mean confidence over valid frames, 0 when there are none
    pub avg_confidence: f64,
}

impl DataQualitySnapshot {
    pub fn face_detected_ratio(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            self.face_detected_frames as f64 / self.total_frames as f64
        }
    }
}

/// Counts what kind of frames a stream is producing.
///
/// Each frame lands in exactly one bucket: dropped, calibration,
/// low confidence, or valid.
#[derive(Debug, Clone, Default)]
pub struct DataQualityTracker {
    counts: DataQualitySnapshot,
    confidence_sum: f64,
}

impl DataQualityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &AnalysisResult) {
        let c = &mut self.counts;
        c.total_frames += 1;

        if !result.face_detected() {
            c.dropped_frames += 1;
            return;
        }
        c.face_detected_frames += 1;

        if result.is_calibrating() {
            c.calibration_frames += 1;
            return;
        }

        let confidence = result.confidence();
        if confidence < LOW_CONFIDENCE_CUTOFF {
            c.low_confidence_frames += 1;
            return;
        }

        c.valid_fatigue_frames += 1;
        self.confidence_sum += confidence;
        if result.fatigue_level() == FatigueLevel::High {
            c.high_fatigue_frames += 1;
        }
    }

    pub fn snapshot(&self) -> DataQualitySnapshot {
        let valid = self.counts.valid_fatigue_frames;
        DataQualitySnapshot {
            avg_confidence: if valid > 0 {
                self.confidence_sum / valid as f64
            } else {
                0.0
            },
            ..self.counts
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
