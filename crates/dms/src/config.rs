//! DMS configuration

use feature_engine::FeatureConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geometry::EyeIndices;
use crate::DmsError;

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Landmark positions of the left eye contour
    pub left_eye: EyeIndices,

    /// Landmark positions of the right eye contour
    pub right_eye: EyeIndices,

    /// Minimum baseline collection time (milliseconds)
    pub calibration_window_ms: u64,

    /// Minimum accepted samples before the baseline may lock
    pub min_calibration_samples: usize,

    /// Open-eye EAR accepted during calibration (exclusive bounds)
    pub plausible_ear_range: (f64, f64),

    /// Lower bound on the locked baseline
    pub baseline_floor: f64,

    /// Clamp applied to EAR / baseline
    pub normalized_ear_range: (f64, f64),

    /// Eyes count as closed below this normalized EAR
    pub closure_ratio: f64,

    /// Shortest closure run counted as a blink (frames)
    pub min_closed_frames: u32,

    /// Longest closure run counted as a blink (frames)
    pub max_blink_frames: u32,

    /// Normalized EAR below which sustained closure means HIGH fatigue
    pub low_ear_ratio: f64,

    /// How long normalized EAR must stay below `low_ear_ratio` (milliseconds)
    pub sustained_low_ear_ms: u64,

    /// Normalized EAR below which the verdict is at least MEDIUM
    pub moderate_ear_ratio: f64,

    /// PERCLOS at or above which the verdict is at least MEDIUM
    pub perclos_medium: f64,

    /// PERCLOS at or above which the verdict is HIGH
    pub perclos_high: f64,

    /// Blinks per minute at or above which the verdict is at least MEDIUM
    pub blink_rate_medium: f64,

    /// Blinks per minute above which the verdict is HIGH
    pub blink_rate_high: f64,

    /// A blink this recent downgrades HIGH to MEDIUM (milliseconds)
    pub recent_blink_ms: u64,

    /// Blink-interval entropy below this (bits) is treated as low liveness
    pub low_entropy_threshold: f64,

    /// Frames after baseline lock with zero confidence
    pub warmup_frames: u32,

    /// Frames after baseline lock until temporal confidence saturates
    pub maturity_frames: u32,

    /// Face loss shorter than this holds state (milliseconds)
    pub face_lost_grace_ms: u64,

    /// Report blink entropy in results (always computed internally)
    pub expose_entropy: bool,

    /// Rolling window statistics
    pub statistics: FeatureConfig,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            left_eye: EyeIndices::FACE_MESH_LEFT,
            right_eye: EyeIndices::FACE_MESH_RIGHT,
            calibration_window_ms: 3_000,
            min_calibration_samples: 8,
            plausible_ear_range: (0.15, 0.35),
            baseline_floor: 0.18,
            normalized_ear_range: (0.3, 1.3),
            closure_ratio: 0.65,
            min_closed_frames: 1,
            max_blink_frames: 6,
            low_ear_ratio: 0.65,
            sustained_low_ear_ms: 1_500,
            moderate_ear_ratio: 0.80,
            perclos_medium: 0.15,
            perclos_high: 0.35,
            blink_rate_medium: 15.0,
            blink_rate_high: 25.0,
            recent_blink_ms: 300,
            low_entropy_threshold: 0.5,
            warmup_frames: 5,
            maturity_frames: 30,
            face_lost_grace_ms: 1_000,
            expose_entropy: true,
            statistics: FeatureConfig::default(),
        }
    }
}

impl DmsConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            sustained_low_ear_ms: 1_000,
            perclos_medium: 0.12,
            perclos_high: 0.30,
            blink_rate_medium: 12.0,
            blink_rate_high: 20.0,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            sustained_low_ear_ms: 2_500,
            perclos_medium: 0.20,
            perclos_high: 0.45,
            blink_rate_medium: 20.0,
            blink_rate_high: 30.0,
            ..Default::default()
        }
    }

    /// Reject configurations the analyzer cannot run with
    pub fn validate(&self) -> Result<(), DmsError> {
        let fail = |msg: String| {
            warn!("Rejected DMS configuration: {}", msg);
            Err(DmsError::Config(msg))
        };

        if self.statistics.window_ms == 0 {
            return fail("statistics.window_ms must be positive".into());
        }
        if self.min_closed_frames == 0 || self.min_closed_frames > self.max_blink_frames {
            return fail(format!(
                "blink run range [{}, {}] is empty",
                self.min_closed_frames, self.max_blink_frames
            ));
        }
        let (lo, hi) = self.plausible_ear_range;
        if !(lo < hi) {
            return fail(format!("plausible_ear_range ({lo}, {hi}) is inverted"));
        }
        let (lo, hi) = self.normalized_ear_range;
        if !(lo > 0.0 && lo < hi) {
            return fail(format!("normalized_ear_range ({lo}, {hi}) is invalid"));
        }
        if !(self.baseline_floor > 0.0) {
            return fail("baseline_floor must be positive".into());
        }
        if self.perclos_medium > self.perclos_high {
            return fail("perclos_medium exceeds perclos_high".into());
        }
        if self.blink_rate_medium > self.blink_rate_high {
            return fail("blink_rate_medium exceeds blink_rate_high".into());
        }
        if self.low_ear_ratio > self.moderate_ear_ratio {
            return fail("low_ear_ratio exceeds moderate_ear_ratio".into());
        }
        if self.maturity_frames == 0 {
            return fail("maturity_frames must be positive".into());
        }
        let stats = &self.statistics;
        if !(stats.stable_variance < stats.unstable_variance) {
            return fail("stable_variance must be below unstable_variance".into());
        }
        if !(0.0..=1.0).contains(&stats.stability_floor) {
            return fail("stability_floor must lie in [0, 1]".into());
        }
        if stats.entropy_bins == 0 || !(stats.entropy_bin_width > 0.0) {
            return fail("entropy histogram needs bins and a positive width".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DmsConfig::default().validate().is_ok());
        assert!(DmsConfig::strict().validate().is_ok());
        assert!(DmsConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_presets_order_thresholds() {
        let strict = DmsConfig::strict();
        let lenient = DmsConfig::lenient();
        assert!(strict.perclos_high < lenient.perclos_high);
        assert!(strict.sustained_low_ear_ms < lenient.sustained_low_ear_ms);
    }

    #[test]
    fn test_rejects_empty_blink_range() {
        let config = DmsConfig {
            min_closed_frames: 7,
            max_blink_frames: 6,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DmsError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_window() {
        let mut config = DmsConfig::default();
        config.statistics.window_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: DmsConfig =
            serde_json::from_str(r#"{ "perclos_high": 0.4, "statistics": { "window_ms": 30000 } }"#)
                .unwrap();
        assert_eq!(config.perclos_high, 0.4);
        assert_eq!(config.statistics.window_ms, 30_000);
        assert_eq!(config.statistics.min_perclos_frames, 15);
        assert_eq!(config.left_eye, EyeIndices::FACE_MESH_LEFT);
    }
}
