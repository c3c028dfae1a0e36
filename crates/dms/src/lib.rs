//! Driver Monitoring System (DMS)
//!
//! Real-time drowsiness estimation from per-frame eye landmarks:
//! - Eye-aspect-ratio from six contour points per eye
//! - Personal baseline calibration
//! - Blink detection and PERCLOS over a rolling window
//! - Blink-interval entropy as a liveness heuristic
//! - Three-level fatigue verdict with a confidence score
//!
//! One [`FatigueAnalyzer`] serves one video stream. Calls must be serialized;
//! the analyzer never blocks and each frame costs O(window size).

pub mod analysis;
pub mod blink;
pub mod calibration;
pub mod classifier;
pub mod confidence;
pub mod config;
pub mod geometry;
pub mod state;

pub use analysis::{AnalysisResult, FatigueAssessment, FatigueReport, WindowSnapshot};
pub use blink::{BlinkDetector, EyePhase};
pub use calibration::{BaselineCalibrator, CalibrationStep};
pub use classifier::{Classification, ClassifierInput, Downgrade, FatigueClassifier};
pub use confidence::ConfidenceScorer;
pub use config::DmsConfig;
pub use geometry::{eye_aspect_ratio, EyeIndices, EyeMetrics, LandmarkSet, Point2};
pub use state::{AnalyzerState, FatigueLevel};

use feature_engine::{FeatureExtractor, WindowFeatures, ENTROPY_UNDEFINED};
use thiserror::Error;
use time_window::{BlinkEvent, FrameSample};
use tracing::{debug, info};

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Keypoints missing for feature calculation: need {required}, got {available}")]
    KeypointsMissing { required: usize, available: usize },
}

/// Streaming fatigue analyzer for one video stream
#[derive(Debug, Clone)]
pub struct FatigueAnalyzer {
    config: DmsConfig,
    calibrator: BaselineCalibrator,
    blink_detector: BlinkDetector,
    features: FeatureExtractor,
    classifier: FatigueClassifier,
    scorer: ConfidenceScorer,
    state: AnalyzerState,
}

impl FatigueAnalyzer {
    /// Create a new analyzer with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;

        Ok(Self {
            calibrator: BaselineCalibrator::new(&config),
            blink_detector: BlinkDetector::new(&config),
            features: FeatureExtractor::new(config.statistics.clone()),
            classifier: FatigueClassifier::new(&config),
            scorer: ConfidenceScorer::new(&config),
            state: AnalyzerState::new(config.statistics.window_ms),
            config,
        })
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn state(&self) -> &AnalyzerState {
        &self.state
    }

    /// Locked baseline EAR, if calibration has finished
    pub fn baseline_ear(&self) -> Option<f64> {
        self.state.baseline.locked
    }

    /// Analyze one frame.
    ///
    /// `landmarks` is `None` when the detector found no single face.
    pub fn analyze(
        &mut self,
        landmarks: Option<&LandmarkSet>,
        timestamp_ms: u64,
    ) -> Result<AnalysisResult, DmsError> {
        let eyes = landmarks
            .map(|set| {
                EyeMetrics::from_landmarks(set, &self.config.left_eye, &self.config.right_eye)
            })
            .transpose()?;
        Ok(self.analyze_eyes(eyes, timestamp_ms))
    }

    /// Analyze one frame from precomputed eye metrics
    pub fn analyze_eyes(&mut self, eyes: Option<EyeMetrics>, timestamp_ms: u64) -> AnalysisResult {
        let Some(eyes) = eyes else {
            return self.face_lost(timestamp_ms);
        };
        if self.state.last_face_seen_ms.is_some() && !self.within_grace(timestamp_ms) {
            self.interrupt_runs(timestamp_ms);
        }
        self.state.last_face_seen_ms = Some(timestamp_ms);

        let baseline = match self
            .calibrator
            .observe(&mut self.state.baseline, eyes.avg_ear, timestamp_ms)
        {
            CalibrationStep::AlreadyLocked(value) => value,
            CalibrationStep::Locked(_) => {
                self.state.frames_since_baseline = 0;
                return AnalysisResult::Calibrating { eyes, timestamp_ms };
            }
            CalibrationStep::Collecting { .. } => {
                return AnalysisResult::Calibrating { eyes, timestamp_ms };
            }
        };

        self.state.frames_since_baseline = self.state.frames_since_baseline.saturating_add(1);
        self.assess(eyes, baseline, timestamp_ms)
    }

    fn within_grace(&self, timestamp_ms: u64) -> bool {
        self.state
            .last_face_seen_ms
            .is_some_and(|seen| timestamp_ms.saturating_sub(seen) < self.config.face_lost_grace_ms)
    }

    /// A gap past the grace interval breaks closure and low-EAR runs.
    /// Baseline and windows are kept.
    fn interrupt_runs(&mut self, timestamp_ms: u64) {
        debug!(
            timestamp_ms,
            last_seen = ?self.state.last_face_seen_ms,
            "Face back after gap, restarting eye runs"
        );
        self.state.eye_phase = EyePhase::Open;
        self.state.low_ear_start_ms = None;
    }

    fn face_lost(&self, timestamp_ms: u64) -> AnalysisResult {
        if self.within_grace(timestamp_ms) {
            AnalysisResult::Hold { timestamp_ms }
        } else {
            AnalysisResult::NoFace { timestamp_ms }
        }
    }

    fn assess(&mut self, eyes: EyeMetrics, baseline: f64, now_ms: u64) -> AnalysisResult {
        let normalized_ear =
            calibration::normalized_ear(eyes.avg_ear, baseline, self.config.normalized_ear_range);

        let step = self.blink_detector.step(&mut self.state.eye_phase, normalized_ear);
        if step.blink {
            self.state.blinks.push(BlinkEvent { timestamp_ms: now_ms });
            self.state.last_blink_ms = Some(now_ms);
            debug!(timestamp_ms = now_ms, run = ?step.ended_run, "Blink detected");
        }

        self.state.frames.push(FrameSample {
            timestamp_ms: now_ms,
            normalized_ear,
            eye_closed: step.eye_closed,
        });
        self.state.frames.evict(now_ms);
        self.state.blinks.evict(now_ms);

        let window = self
            .features
            .extract(&self.state.frames, &self.state.blinks, now_ms);

        let sustained_low_ear =
            self.classifier
                .track_low_ear(&mut self.state.low_ear_start_ms, normalized_ear, now_ms);
        let recent_blink = self
            .state
            .last_blink_ms
            .is_some_and(|t| now_ms.saturating_sub(t) <= self.config.recent_blink_ms);

        let classification = self.classifier.classify(&ClassifierInput {
            normalized_ear,
            sustained_low_ear,
            perclos: window.perclos,
            blink_rate: window.blink_rate,
            recent_blink,
            low_liveness: self.is_low_liveness(&window),
        });

        let frames = self.state.frames_since_baseline;
        let confidence = self
            .scorer
            .score(frames, classification.level, window.stability_score);

        if classification.level != self.state.last_level {
            debug!(
                from = %self.state.last_level,
                to = %classification.level,
                perclos = window.perclos,
                blink_rate = window.blink_rate,
                downgrade = ?classification.downgrade,
                "Fatigue level changed"
            );
            self.state.last_level = classification.level;
        }

        AnalysisResult::Analyzed(FatigueAssessment {
            eyes,
            normalized_ear,
            eye_closed: step.eye_closed,
            blink_detected: step.blink,
            blink_rate: window.blink_rate,
            blink_entropy: if self.config.expose_entropy {
                window.blink_entropy
            } else {
                ENTROPY_UNDEFINED
            },
            perclos: window.perclos,
            stability_score: window.stability_score,
            fatigue_level: classification.level,
            downgrade: classification.downgrade,
            confidence,
            warming_up: self.scorer.is_warming_up(frames),
            timestamp_ms: now_ms,
        })
    }

    fn is_low_liveness(&self, window: &WindowFeatures) -> bool {
        window.blink_entropy >= 0.0 && window.blink_entropy < self.config.low_entropy_threshold
    }

    /// Window-level metrics as of `now_ms`, without touching state
    pub fn window_snapshot(&self, now_ms: u64) -> WindowSnapshot {
        let window = self
            .features
            .extract(&self.state.frames, &self.state.blinks, now_ms);
        let sustained_low_ear = self
            .state
            .low_ear_start_ms
            .is_some_and(|start| now_ms.saturating_sub(start) >= self.config.sustained_low_ear_ms);

        WindowSnapshot {
            timestamp_ms: now_ms,
            baseline_ear: self.state.baseline.locked,
            normalized_ear_mean: window.ear_mean,
            normalized_ear_variance: window.ear_variance,
            blink_rate: window.blink_rate,
            blink_entropy: window.blink_entropy,
            perclos: window.perclos,
            sustained_low_ear,
            unstable_signal: window.stability_score < 1.0,
            low_liveness: self.is_low_liveness(&window),
            window_duration_ms: window.effective_window_ms,
            frame_count: window.frame_count,
        }
    }

    /// Clear calibration, windows and counters (on stream restart or driver change)
    pub fn reset(&mut self) {
        info!(
            baseline = ?self.state.baseline.locked,
            frames = self.state.frames.len(),
            "Resetting fatigue analyzer"
        );
        self.state.reset();
    }
}
