//! DMS analysis results

use feature_engine::ENTROPY_UNDEFINED;
use serde::{Deserialize, Serialize};

use crate::classifier::Downgrade;
use crate::geometry::EyeMetrics;
use crate::state::FatigueLevel;

/// Steady-state analysis of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueAssessment {
    pub eyes: EyeMetrics,
    pub normalized_ear: f64,
    pub eye_closed: bool,
    pub blink_detected: bool,
    /// Blinks per minute, capped
    pub blink_rate: f64,
    /// Blink-interval entropy, -1 when undefined or not exposed
    pub blink_entropy: f64,
    /// Fraction of closed frames in the window
    pub perclos: f64,
    pub stability_score: f64,
    pub fatigue_level: FatigueLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downgrade: Option<Downgrade>,
    pub confidence: f64,
    /// Inside the post-baseline warm-up (confidence forced to 0)
    pub warming_up: bool,
    pub timestamp_ms: u64,
}

/// Result of analyzing one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisResult {
    /// No face, and none seen within the grace interval
    NoFace { timestamp_ms: u64 },

    /// Face briefly lost; history kept, nothing updated
    Hold { timestamp_ms: u64 },

    /// Baseline still being collected
    Calibrating { eyes: EyeMetrics, timestamp_ms: u64 },

    /// Full fatigue analysis
    Analyzed(FatigueAssessment),
}

impl AnalysisResult {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            AnalysisResult::NoFace { timestamp_ms }
            | AnalysisResult::Hold { timestamp_ms }
            | AnalysisResult::Calibrating { timestamp_ms, .. } => *timestamp_ms,
            AnalysisResult::Analyzed(a) => a.timestamp_ms,
        }
    }

    /// Face considered present (a hold counts as present)
    pub fn face_detected(&self) -> bool {
        !matches!(self, AnalysisResult::NoFace { .. })
    }

    /// Baseline collection or post-baseline warm-up
    pub fn is_calibrating(&self) -> bool {
        match self {
            AnalysisResult::Calibrating { .. } => true,
            AnalysisResult::Analyzed(a) => a.warming_up,
            _ => false,
        }
    }

    pub fn fatigue_level(&self) -> FatigueLevel {
        match self {
            AnalysisResult::Analyzed(a) => a.fatigue_level,
            _ => FatigueLevel::Low,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            AnalysisResult::Analyzed(a) => a.confidence,
            _ => 0.0,
        }
    }

    pub fn blink_detected(&self) -> bool {
        matches!(self, AnalysisResult::Analyzed(a) if a.blink_detected)
    }

    pub fn assessment(&self) -> Option<&FatigueAssessment> {
        match self {
            AnalysisResult::Analyzed(a) => Some(a),
            _ => None,
        }
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisResult::NoFace { .. } => "no_face",
            AnalysisResult::Hold { .. } => "hold",
            AnalysisResult::Calibrating { .. } => "calibrating",
            AnalysisResult::Analyzed(_) => "analyzed",
        }
    }

    /// Flatten into the presentation-layer record
    pub fn to_report(&self) -> FatigueReport {
        let neutral = FatigueReport {
            face_detected: self.face_detected(),
            is_calibrating: self.is_calibrating(),
            left_ear: 0.0,
            right_ear: 0.0,
            avg_ear: 0.0,
            blink_detected: false,
            blink_rate: 0.0,
            blink_entropy: ENTROPY_UNDEFINED,
            perclos: 0.0,
            fatigue_level: FatigueLevel::Low,
            confidence: 0.0,
            timestamp: self.timestamp_ms(),
        };

        match self {
            AnalysisResult::NoFace { .. } | AnalysisResult::Hold { .. } => neutral,
            AnalysisResult::Calibrating { eyes, .. } => FatigueReport {
                left_ear: eyes.left_ear,
                right_ear: eyes.right_ear,
                avg_ear: eyes.avg_ear,
                ..neutral
            },
            AnalysisResult::Analyzed(a) => FatigueReport {
                left_ear: a.eyes.left_ear,
                right_ear: a.eyes.right_ear,
                avg_ear: a.eyes.avg_ear,
                blink_detected: a.blink_detected,
                blink_rate: a.blink_rate,
                blink_entropy: a.blink_entropy,
                perclos: a.perclos,
                fatigue_level: a.fatigue_level,
                confidence: a.confidence,
                ..neutral
            },
        }
    }
}

impl From<&AnalysisResult> for FatigueReport {
    fn from(result: &AnalysisResult) -> Self {
        result.to_report()
    }
}

/// Flat per-frame record consumed by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatigueReport {
    pub face_detected: bool,
    pub is_calibrating: bool,
    #[serde(rename = "leftEAR")]
    pub left_ear: f64,
    #[serde(rename = "rightEAR")]
    pub right_ear: f64,
    #[serde(rename = "avgEAR")]
    pub avg_ear: f64,
    pub blink_detected: bool,
    pub blink_rate: f64,
    pub blink_entropy: f64,
    pub perclos: f64,
    pub fatigue_level: FatigueLevel,
    pub confidence: f64,
    pub timestamp: u64,
}

/// Window-level metrics at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub timestamp_ms: u64,
    pub baseline_ear: Option<f64>,
    pub normalized_ear_mean: f64,
    pub normalized_ear_variance: f64,
    pub blink_rate: f64,
    pub blink_entropy: f64,
    pub perclos: f64,
    pub sustained_low_ear: bool,
    /// Stability below 1: the EAR signal is jittery
    pub unstable_signal: bool,
    /// Blink intervals too regular
    pub low_liveness: bool,
    pub window_duration_ms: u64,
    pub frame_count: usize,
}
