//! Window log records

use chrono::{DateTime, Utc};
use dms::{FatigueLevel, WindowSnapshot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quality::LOW_CONFIDENCE_CUTOFF;

pub const LOG_SCHEMA_VERSION: &str = "2.0";

/// Mean spacing between frames in a window, 0 with fewer than two frames
pub fn mean_frame_interval_ms(snapshot: &WindowSnapshot) -> u64 {
    match snapshot.frame_count {
        0 | 1 => 0,
        n => snapshot.window_duration_ms / (n as u64 - 1),
    }
}

/// One window's metrics with session metadata, ready for storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowLog {
    pub schema_version: String,
    pub session_id: Uuid,
    /// Opaque per-device identifier
    pub device_hash: String,
    pub platform: Option<String>,
    pub timestamp: u64,
    pub window_duration_ms: u64,
    #[serde(rename = "baselineEAR")]
    pub baseline_ear: Option<f64>,
    #[serde(rename = "normalizedEARMean")]
    pub normalized_ear_mean: f64,
    #[serde(rename = "normalizedEARVariance")]
    pub normalized_ear_variance: f64,
    pub blink_rate: f64,
    pub blink_entropy: f64,
    pub perclos: f64,
    #[serde(rename = "sustainedLowEAR")]
    pub sustained_low_ear: bool,
    pub fatigue_level: FatigueLevel,
    pub confidence: f64,
    pub unstable_signal: bool,
    pub low_liveness: bool,
    pub scan_interval_ms: u64,
    pub face_detected_ratio: f64,
    pub created_at: DateTime<Utc>,
}

impl WindowLog {
    pub fn new(
        session_id: Uuid,
        device_hash: &str,
        platform: Option<&str>,
        snapshot: &WindowSnapshot,
        fatigue_level: FatigueLevel,
        confidence: f64,
        face_detected_ratio: f64,
    ) -> Self {
        Self {
            schema_version: LOG_SCHEMA_VERSION.to_string(),
            session_id,
            device_hash: device_hash.to_string(),
            platform: platform.map(str::to_string),
            timestamp: snapshot.timestamp_ms,
            window_duration_ms: snapshot.window_duration_ms,
            baseline_ear: snapshot.baseline_ear,
            normalized_ear_mean: snapshot.normalized_ear_mean,
            normalized_ear_variance: snapshot.normalized_ear_variance,
            blink_rate: snapshot.blink_rate,
            blink_entropy: snapshot.blink_entropy,
            perclos: snapshot.perclos,
            sustained_low_ear: snapshot.sustained_low_ear,
            fatigue_level,
            confidence: confidence.clamp(0.0, 1.0),
            unstable_signal: snapshot.unstable_signal,
            low_liveness: snapshot.low_liveness,
            scan_interval_ms: mean_frame_interval_ms(snapshot),
            face_detected_ratio: face_detected_ratio.clamp(0.0, 1.0),
            created_at: Utc::now(),
        }
    }

    /// Low-confidence windows are not worth storing
    pub fn should_persist(&self) -> bool {
        self.confidence >= LOW_CONFIDENCE_CUTOFF
    }
}
