//! Feature Engineering Engine
//!
//! Derives PERCLOS, blink rate, blink-interval entropy and EAR signal
//! stability from the rolling sample windows.

mod blink;
mod features;
mod perclos;
mod stability;
mod statistics;

pub use blink::{blink_entropy, blink_rate, ENTROPY_UNDEFINED};
pub use features::{FeatureConfig, FeatureExtractor, WindowFeatures};
pub use perclos::perclos;
pub use stability::stability_score;
pub use statistics::SignalStatistics;
