//! Window Feature Assembly

use crate::blink::{blink_entropy, blink_rate};
use crate::perclos::perclos;
use crate::stability::stability_score;
use crate::statistics::SignalStatistics;
use serde::{Deserialize, Serialize};
use time_window::{BlinkEvent, FrameSample, TimeWindow};
use tracing::trace;

/// Thresholds for the window statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Rolling window horizon (milliseconds)
    pub window_ms: u64,

    /// PERCLOS is reported as 0 below this many frames
    pub min_perclos_frames: usize,

    /// Upper clamp on blinks per minute
    pub blink_rate_cap: f64,

    /// Fewer normalized-EAR samples than this are assumed stable
    pub stability_min_samples: usize,

    /// Variance at or below which the signal is fully trusted
    pub stable_variance: f64,

    /// Variance at or above which trust drops to `stability_floor`
    pub unstable_variance: f64,

    /// Hard-distrust stability score
    pub stability_floor: f64,

    /// Blinks needed before entropy is defined
    pub entropy_min_blinks: usize,

    /// Histogram buckets for interval ratios
    pub entropy_bins: usize,

    /// Width of each bucket in units of the mean interval
    pub entropy_bin_width: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window_ms: 20_000,
            min_perclos_frames: 15,
            blink_rate_cap: 60.0,
            stability_min_samples: 8,
            stable_variance: 0.006,
            unstable_variance: 0.02,
            stability_floor: 0.4,
            entropy_min_blinks: 4,
            entropy_bins: 5,
            entropy_bin_width: 0.4,
        }
    }
}

/// Statistics derived from the current window contents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowFeatures {
    /// Frames in the window
    pub frame_count: usize,
    /// Blinks in the window
    pub blink_count: usize,
    /// Window length used for the blink rate (milliseconds)
    pub effective_window_ms: u64,
    /// Fraction of closed frames, in [0, 1]
    pub perclos: f64,
    /// Blinks per minute, in [0, cap]
    pub blink_rate: f64,
    /// Shannon entropy of blink intervals, or -1 when undefined
    pub blink_entropy: f64,
    /// Mean normalized EAR
    pub ear_mean: f64,
    /// Variance of normalized EAR
    pub ear_variance: f64,
    /// Trust multiplier in [floor, 1]
    pub stability_score: f64,
}

impl Default for WindowFeatures {
    fn default() -> Self {
        Self {
            frame_count: 0,
            blink_count: 0,
            effective_window_ms: 0,
            perclos: 0.0,
            blink_rate: 0.0,
            blink_entropy: crate::ENTROPY_UNDEFINED,
            ear_mean: 0.0,
            ear_variance: 0.0,
            stability_score: 1.0,
        }
    }
}

/// Computes [`WindowFeatures`] from the frame and blink windows
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    /// Create a new feature extractor
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Extract features as of `now_ms`.
    ///
    /// Callers evict both windows at `now_ms` first.
    ///
    /// Blink rate is scaled over the effective window, the span actually
    /// covered by frames (at most `window_ms`). Right after the window starts
    /// filling that span is short, so a single blink saturates
    /// `blink_rate_cap`; a 500 ms span with one blink reads as 120/min and
    /// is reported as the cap.
    pub fn extract(
        &self,
        frames: &TimeWindow<FrameSample>,
        blinks: &TimeWindow<BlinkEvent>,
        now_ms: u64,
    ) -> WindowFeatures {
        let cfg = &self.config;

        let effective_window_ms = frames.age_ms(now_ms).min(cfg.window_ms);
        let stats = SignalStatistics::of_normalized_ear(frames.iter());

        let features = WindowFeatures {
            frame_count: frames.len(),
            blink_count: blinks.len(),
            effective_window_ms,
            perclos: perclos(frames.iter(), cfg.min_perclos_frames),
            blink_rate: blink_rate(blinks.len(), effective_window_ms, cfg.blink_rate_cap),
            blink_entropy: blink_entropy(
                blinks.iter(),
                cfg.entropy_min_blinks,
                cfg.entropy_bins,
                cfg.entropy_bin_width,
            ),
            ear_mean: stats.mean,
            ear_variance: stats.variance,
            stability_score: stability_score(
                stats.variance,
                stats.count,
                cfg.stability_min_samples,
                cfg.stable_variance,
                cfg.unstable_variance,
                cfg.stability_floor,
            ),
        };

        trace!(
            frames = features.frame_count,
            blinks = features.blink_count,
            perclos = features.perclos,
            blink_rate = features.blink_rate,
            "Window features extracted"
        );

        features
    }
}
