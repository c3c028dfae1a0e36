//! Session summaries

use chrono::{DateTime, Utc};
use dms::{AnalysisResult, FatigueLevel};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::window_log::LOG_SCHEMA_VERSION;

/// Share of steady-state frames at each level
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct FatigueDistribution {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// End-of-session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub schema_version: String,
    pub session_id: Uuid,
    /// Timestamp of the first frame, ms
    pub start_time: u64,
    pub end_time: u64,
    pub duration_ms: u64,
    pub avg_confidence: f64,
    pub peak_fatigue_level: FatigueLevel,
    pub fatigue_distribution: FatigueDistribution,
    pub baseline_successful: bool,
    pub alert_count: usize,
    pub finished_at: DateTime<Utc>,
}

/// Accumulates one session's verdicts until [`finish`](SessionTracker::finish)
#[derive(Debug, Clone)]
pub struct SessionTracker {
    session_id: Uuid,
    start_ms: Option<u64>,
    /// Steady-state frames per level: LOW, MEDIUM, HIGH
    level_counts: [u64; 3],
    confidence_sum: f64,
    baseline_successful: bool,
    alert_count: usize,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(session_id: Uuid) -> Self {
        Self {
            session_id,
            start_ms: None,
            level_counts: [0; 3],
            confidence_sum: 0.0,
            baseline_successful: false,
            alert_count: 0,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Frames counted toward the distribution
    pub fn frames(&self) -> u64 {
        self.level_counts.iter().sum()
    }

    pub fn record(&mut self, result: &AnalysisResult) {
        self.start_ms.get_or_insert(result.timestamp_ms());

        let Some(assessment) = result.assessment() else {
            return;
        };
        self.baseline_successful = true;
        if assessment.warming_up {
            return;
        }

        let slot = match assessment.fatigue_level {
            FatigueLevel::Low => 0,
            FatigueLevel::Medium => 1,
            FatigueLevel::High => 2,
        };
        self.level_counts[slot] += 1;
        self.confidence_sum += assessment.confidence;
    }

    pub fn record_alert(&mut self) {
        self.alert_count += 1;
    }

    /// Close the session and start a fresh one under a new id
    pub fn finish(&mut self, end_ms: u64) -> SessionSummary {
        let start = self.start_ms.unwrap_or(end_ms);
        let total = self.frames().max(1) as f64;
        let [low, medium, high] = self.level_counts;

        let peak_fatigue_level = if high > 0 {
            FatigueLevel::High
        } else if medium > 0 {
            FatigueLevel::Medium
        } else {
            FatigueLevel::Low
        };

        let summary = SessionSummary {
            schema_version: LOG_SCHEMA_VERSION.to_string(),
            session_id: self.session_id,
            start_time: start,
            end_time: end_ms,
            duration_ms: end_ms.saturating_sub(start),
            avg_confidence: self.confidence_sum / total,
            peak_fatigue_level,
            fatigue_distribution: FatigueDistribution {
                low: low as f64 / total,
                medium: medium as f64 / total,
                high: high as f64 / total,
            },
            baseline_successful: self.baseline_successful,
            alert_count: self.alert_count,
            finished_at: Utc::now(),
        };

        info!(
            session_id = %summary.session_id,
            duration_ms = summary.duration_ms,
            peak = %summary.peak_fatigue_level,
            alerts = summary.alert_count,
            "Session finished"
        );

        *self = Self::new();
        summary
    }
}
