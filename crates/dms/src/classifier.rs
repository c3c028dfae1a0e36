//! Fatigue classification rules

use serde::{Deserialize, Serialize};

use crate::state::FatigueLevel;
use crate::DmsConfig;

/// Signals the classifier looks at for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierInput {
    pub normalized_ear: f64,
    /// Normalized EAR has stayed low for the sustained duration
    pub sustained_low_ear: bool,
    pub perclos: f64,
    pub blink_rate: f64,
    /// A blink ended within the recent-blink interval
    pub recent_blink: bool,
    /// Blink intervals look too regular to be biological
    pub low_liveness: bool,
}

/// Why a HIGH verdict was downgraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Downgrade {
    RecentBlink,
    LowLiveness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Verdict after overrides
    pub level: FatigueLevel,
    /// Verdict from the threshold rules alone
    pub base_level: FatigueLevel,
    pub downgrade: Option<Downgrade>,
}

/// Three-level fatigue classifier with false-positive overrides
#[derive(Debug, Clone)]
pub struct FatigueClassifier {
    low_ear_ratio: f64,
    sustained_low_ear_ms: u64,
    moderate_ear_ratio: f64,
    perclos_medium: f64,
    perclos_high: f64,
    blink_rate_medium: f64,
    blink_rate_high: f64,
}

impl FatigueClassifier {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            low_ear_ratio: config.low_ear_ratio,
            sustained_low_ear_ms: config.sustained_low_ear_ms,
            moderate_ear_ratio: config.moderate_ear_ratio,
            perclos_medium: config.perclos_medium,
            perclos_high: config.perclos_high,
            blink_rate_medium: config.blink_rate_medium,
            blink_rate_high: config.blink_rate_high,
        }
    }

    /// Update the low-EAR run start and report whether it is sustained
    pub fn track_low_ear(&self, low_start_ms: &mut Option<u64>, normalized_ear: f64, now_ms: u64) -> bool {
        if normalized_ear >= self.low_ear_ratio {
            *low_start_ms = None;
            return false;
        }
        let start = *low_start_ms.get_or_insert(now_ms);
        now_ms.saturating_sub(start) >= self.sustained_low_ear_ms
    }

    /// Threshold rules, most severe first
    pub fn base_level(&self, input: &ClassifierInput) -> FatigueLevel {
        if input.sustained_low_ear
            || input.perclos >= self.perclos_high
            || input.blink_rate > self.blink_rate_high
        {
            FatigueLevel::High
        } else if input.normalized_ear < self.moderate_ear_ratio
            || input.perclos >= self.perclos_medium
            || input.blink_rate >= self.blink_rate_medium
        {
            FatigueLevel::Medium
        } else {
            FatigueLevel::Low
        }
    }

    /// Base verdict plus overrides; overrides only ever lower HIGH to MEDIUM
    pub fn classify(&self, input: &ClassifierInput) -> Classification {
        let base_level = self.base_level(input);

        let downgrade = if base_level != FatigueLevel::High {
            None
        } else if input.recent_blink {
            Some(Downgrade::RecentBlink)
        } else if input.low_liveness {
            Some(Downgrade::LowLiveness)
        } else {
            None
        };

        let level = if downgrade.is_some() {
            FatigueLevel::Medium
        } else {
            base_level
        };

        Classification {
            level,
            base_level,
            downgrade,
        }
    }
}
