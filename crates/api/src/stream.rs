//! Per-stream analysis session

use alerting::{FatigueAlert, FatigueAlertManager};
use dms::{AnalysisResult, DmsError, EyeMetrics, FatigueAnalyzer, FatigueReport, LandmarkSet};
use serde::Serialize;
use session::{DataQualitySnapshot, DataQualityTracker, SessionSummary, SessionTracker, WindowLog};

use crate::settings::Settings;

/// What one frame produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOutcome {
    #[serde(flatten)]
    pub report: FatigueReport,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<FatigueAlert>,
}

/// Frame input: raw landmarks or precomputed eye ratios
#[derive(Debug, Clone)]
pub enum FrameInput {
    Landmarks(Option<LandmarkSet>),
    Eyes(EyeMetrics),
}

/// Analyzer plus the bookkeeping around it for one stream
#[derive(Debug)]
pub struct StreamSession {
    device_hash: String,
    platform: Option<String>,
    analyzer: FatigueAnalyzer,
    alerts: FatigueAlertManager,
    quality: DataQualityTracker,
    tracker: SessionTracker,
    last: Option<AnalysisResult>,
}

impl StreamSession {
    /// The stream id doubles as the device hash in window logs
    pub fn new(stream_id: &str, settings: &Settings) -> Result<Self, DmsError> {
        Ok(Self {
            device_hash: stream_id.to_string(),
            platform: settings.server.platform.clone(),
            analyzer: FatigueAnalyzer::new(settings.dms.clone())?,
            alerts: FatigueAlertManager::new(settings.alerts.clone()),
            quality: DataQualityTracker::new(),
            tracker: SessionTracker::new(),
            last: None,
        })
    }

    pub fn process(&mut self, input: FrameInput, timestamp_ms: u64) -> Result<FrameOutcome, DmsError> {
        let result = match input {
            FrameInput::Landmarks(landmarks) => self.analyzer.analyze(landmarks.as_ref(), timestamp_ms)?,
            FrameInput::Eyes(eyes) => self.analyzer.analyze_eyes(Some(eyes), timestamp_ms),
        };

        self.quality.record(&result);
        self.tracker.record(&result);

        let alert = self.alerts.observe(&result);
        if let Some(alert) = &alert {
            self.tracker.record_alert();
            metrics::counter!("fatigue_alerts_total", "level" => alert.level.as_str()).increment(1);
        }

        metrics::counter!("fatigue_frames_total", "kind" => result.kind()).increment(1);
        if result.blink_detected() {
            metrics::counter!("fatigue_blinks_total").increment(1);
        }

        self.last = Some(result);
        Ok(FrameOutcome {
            report: result.to_report(),
            kind: result.kind(),
            alert,
        })
    }

    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last.as_ref()
    }

    pub fn quality(&self) -> DataQualitySnapshot {
        self.quality.snapshot()
    }

    /// Window log as of the last analyzed frame
    pub fn window_log(&self) -> Option<WindowLog> {
        let last = self.last.as_ref()?;
        let snapshot = self.analyzer.window_snapshot(last.timestamp_ms());
        Some(WindowLog::new(
            self.tracker.session_id(),
            &self.device_hash,
            self.platform.as_deref(),
            &snapshot,
            last.fatigue_level(),
            last.confidence(),
            self.quality.snapshot().face_detected_ratio(),
        ))
    }

    /// Close the current session at the last frame time
    pub fn finish(&mut self) -> SessionSummary {
        let end = self.last.as_ref().map_or(0, AnalysisResult::timestamp_ms);
        self.tracker.finish(end)
    }

    pub fn reset(&mut self) {
        self.analyzer.reset();
        self.alerts.reset();
        self.quality.reset();
        self.tracker = SessionTracker::new();
        self.last = None;
    }
}
