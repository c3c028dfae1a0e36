//! Fatigue Alert Manager Implementation

use dms::{AnalysisResult, FatigueLevel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum confidence for a frame to count (default: 0.7)
    pub confidence_threshold: f64,
    /// Minimum time between alerts, on frame timestamps (default: 30 s)
    pub cooldown_ms: u64,
    /// Consecutive MEDIUM verdicts required (default: 3)
    pub medium_required: u32,
    /// Consecutive HIGH verdicts required (default: 2)
    pub high_required: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            cooldown_ms: 30_000,
            medium_required: 3,
            high_required: 2,
        }
    }
}

impl AlertConfig {
    fn required(&self, level: FatigueLevel) -> Option<u32> {
        match level {
            FatigueLevel::Low => None,
            FatigueLevel::Medium => Some(self.medium_required.max(1)),
            FatigueLevel::High => Some(self.high_required.max(1)),
        }
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn for_level(level: FatigueLevel) -> Self {
        match level {
            FatigueLevel::High => AlertSeverity::Critical,
            FatigueLevel::Low | FatigueLevel::Medium => AlertSeverity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }
}

/// A fired fatigue alert
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueAlert {
    pub level: FatigueLevel,
    pub severity: AlertSeverity,
    pub confidence: f64,
    /// Consecutive qualifying verdicts that triggered the alert
    pub sustained_count: u32,
    pub timestamp_ms: u64,
}

/// Why a frame did not produce an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    NoFace,
    Calibrating,
    LowConfidence,
    LowLevel,
    /// Level not yet held for the required number of frames
    NotSustained,
    Cooldown,
}

/// Gates per-frame verdicts into rate-limited alerts
#[derive(Debug, Clone)]
pub struct FatigueAlertManager {
    /// Configuration
    config: AlertConfig,
    /// Level currently being counted
    sustained_level: Option<FatigueLevel>,
    /// Consecutive frames at `sustained_level`
    sustained_count: u32,
    /// Timestamp of the last fired alert
    last_alert_ms: Option<u64>,
    /// Alerts fired since creation or reset
    alert_count: usize,
}

impl FatigueAlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating fatigue alert manager with config: {:?}", config);
        Self {
            config,
            sustained_level: None,
            sustained_count: 0,
            last_alert_ms: None,
            alert_count: 0,
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Feed one analysis result; returns an alert when one fires
    pub fn observe(&mut self, result: &AnalysisResult) -> Option<FatigueAlert> {
        self.evaluate(result).ok()
    }

    /// Like [`observe`](Self::observe), reporting why nothing fired
    pub fn evaluate(&mut self, result: &AnalysisResult) -> Result<FatigueAlert, Suppression> {
        if let Err(gate) = self.hard_gate(result) {
            self.clear_streak();
            return Err(gate);
        }

        let level = result.fatigue_level();
        if self.sustained_level == Some(level) {
            self.sustained_count = self.sustained_count.saturating_add(1);
        } else {
            self.sustained_level = Some(level);
            self.sustained_count = 1;
        }

        let required = self.config.required(level).ok_or(Suppression::LowLevel)?;
        if self.sustained_count < required {
            return Err(Suppression::NotSustained);
        }

        let now = result.timestamp_ms();
        if let Some(last) = self.last_alert_ms {
            if now.saturating_sub(last) < self.config.cooldown_ms {
                debug!("Alert suppressed: in cooldown period");
                return Err(Suppression::Cooldown);
            }
        }

        self.last_alert_ms = Some(now);
        self.alert_count += 1;

        let alert = FatigueAlert {
            level,
            severity: AlertSeverity::for_level(level),
            confidence: result.confidence(),
            sustained_count: self.sustained_count,
            timestamp_ms: now,
        };
        info!(
            level = %alert.level,
            severity = alert.severity.as_str(),
            confidence = alert.confidence,
            count = self.alert_count,
            "Fatigue alert fired"
        );
        Ok(alert)
    }

    fn hard_gate(&self, result: &AnalysisResult) -> Result<(), Suppression> {
        if !result.face_detected() {
            return Err(Suppression::NoFace);
        }
        if result.is_calibrating() {
            return Err(Suppression::Calibrating);
        }
        if result.confidence() < self.config.confidence_threshold {
            debug!(
                "Alert suppressed: confidence {} < threshold {}",
                result.confidence(),
                self.config.confidence_threshold
            );
            return Err(Suppression::LowConfidence);
        }
        if result.fatigue_level() == FatigueLevel::Low {
            return Err(Suppression::LowLevel);
        }
        Ok(())
    }

    fn clear_streak(&mut self) {
        self.sustained_level = None;
        self.sustained_count = 0;
    }

    /// Consecutive qualifying frames at the current level
    pub fn sustained_count(&self) -> u32 {
        self.sustained_count
    }

    /// Alerts fired since creation or reset
    pub fn alert_count(&self) -> usize {
        self.alert_count
    }

    /// Clear all gating state
    pub fn reset(&mut self) {
        self.clear_streak();
        self.last_alert_ms = None;
        self.alert_count = 0;
    }
}

impl Default for FatigueAlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::{EyeMetrics, FatigueAssessment};

    fn analyzed(level: FatigueLevel, confidence: f64, timestamp_ms: u64) -> AnalysisResult {
        AnalysisResult::Analyzed(FatigueAssessment {
            eyes: EyeMetrics::symmetric(0.2),
            normalized_ear: 0.7,
            eye_closed: false,
            blink_detected: false,
            blink_rate: 18.0,
            blink_entropy: 1.5,
            perclos: 0.2,
            stability_score: 1.0,
            fatigue_level: level,
            downgrade: None,
            confidence,
            warming_up: false,
            timestamp_ms,
        })
    }

    #[test]
    fn test_high_needs_two_frames() {
        let mut manager = FatigueAlertManager::default();

        assert_eq!(
            manager.evaluate(&analyzed(FatigueLevel::High, 0.9, 0)),
            Err(Suppression::NotSustained)
        );
        let alert = manager.observe(&analyzed(FatigueLevel::High, 0.9, 100)).unwrap();
        assert_eq!(alert.level, FatigueLevel::High);
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.sustained_count, 2);
        assert_eq!(manager.alert_count(), 1);
    }

    #[test]
    fn test_medium_needs_three_frames() {
        let mut manager = FatigueAlertManager::default();
        assert!(manager.observe(&analyzed(FatigueLevel::Medium, 0.8, 0)).is_none());
        assert!(manager.observe(&analyzed(FatigueLevel::Medium, 0.8, 100)).is_none());
        let alert = manager.observe(&analyzed(FatigueLevel::Medium, 0.8, 200)).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Warning);
    }

    #[test]
    fn test_level_change_restarts_count() {
        let mut manager = FatigueAlertManager::default();
        manager.observe(&analyzed(FatigueLevel::Medium, 0.8, 0));
        manager.observe(&analyzed(FatigueLevel::Medium, 0.8, 100));
        assert!(manager.observe(&analyzed(FatigueLevel::High, 0.8, 200)).is_none());
        assert_eq!(manager.sustained_count(), 1);
    }

    #[test]
    fn test_gates_reset_the_streak() {
        let mut manager = FatigueAlertManager::default();

        for gate in [
            AnalysisResult::NoFace { timestamp_ms: 100 },
            AnalysisResult::Hold { timestamp_ms: 100 },
            analyzed(FatigueLevel::High, 0.5, 100),
            analyzed(FatigueLevel::Low, 0.9, 100),
        ] {
            manager.observe(&analyzed(FatigueLevel::High, 0.9, 0));
            assert!(manager.observe(&gate).is_none());
            assert_eq!(manager.sustained_count(), 0, "{gate:?}");
        }
    }

    #[test]
    fn test_warmup_frames_are_gated() {
        let mut manager = FatigueAlertManager::default();
        let mut result = analyzed(FatigueLevel::High, 0.9, 0);
        if let AnalysisResult::Analyzed(a) = &mut result {
            a.warming_up = true;
        }
        assert_eq!(manager.evaluate(&result), Err(Suppression::Calibrating));
    }

    #[test]
    fn test_cooldown() {
        let mut manager = FatigueAlertManager::default();
        manager.observe(&analyzed(FatigueLevel::High, 0.9, 0));
        assert!(manager.observe(&analyzed(FatigueLevel::High, 0.9, 100)).is_some());

        assert_eq!(
            manager.evaluate(&analyzed(FatigueLevel::High, 0.9, 10_000)),
            Err(Suppression::Cooldown)
        );
        // Cooldown measured from the last alert
        assert!(manager.observe(&analyzed(FatigueLevel::High, 0.9, 30_100)).is_some());
        assert_eq!(manager.alert_count(), 2);
    }

    #[test]
    fn test_reset_clears_cooldown() {
        let mut manager = FatigueAlertManager::default();
        manager.observe(&analyzed(FatigueLevel::High, 0.9, 0));
        manager.observe(&analyzed(FatigueLevel::High, 0.9, 100));
        manager.reset();

        assert_eq!(manager.alert_count(), 0);
        manager.observe(&analyzed(FatigueLevel::High, 0.9, 200));
        assert!(manager.observe(&analyzed(FatigueLevel::High, 0.9, 300)).is_some());
    }
}
