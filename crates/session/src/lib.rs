//! Session bookkeeping
//!
//! Everything a host records around the fatigue analyzer:
//! - Data quality counters per stream
//! - Session summaries (level distribution, peak, alerts)
//! - Window log records for offline storage

mod quality;
mod summary;
mod window_log;

pub use quality::{DataQualitySnapshot, DataQualityTracker, LOW_CONFIDENCE_CUTOFF};
pub use summary::{FatigueDistribution, SessionSummary, SessionTracker};
pub use window_log::{mean_frame_interval_ms, WindowLog, LOG_SCHEMA_VERSION};
