//! Alerting System
//!
//! Turns per-frame fatigue verdicts into rate-limited alerts: hard gates,
//! sustained-verdict counting, cooldown, and severity mapping.

mod manager;

pub use manager::{AlertConfig, AlertSeverity, FatigueAlert, FatigueAlertManager, Suppression};
