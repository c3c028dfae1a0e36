//! Server settings
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `FATIGUE__SECTION__KEY` environment variables.

use alerting::AlertConfig;
use dms::{DmsConfig, DmsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file looked up when `FATIGUE_CONFIG` is unset (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "fatigue-monitor";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid analyzer settings: {0}")]
    Invalid(#[from] DmsError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Streams hosted at once; new stream ids beyond this are refused
    pub max_streams: usize,
    /// Platform tag stamped on window logs
    pub platform: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_streams: 64,
            platform: None,
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LogSettings,
    pub dms: DmsConfig,
    pub alerts: AlertConfig,
}

impl Settings {
    /// Load from `FATIGUE_CONFIG` (or the default file) and the environment
    pub fn load() -> Result<Self, SettingsError> {
        let path = std::env::var("FATIGUE_CONFIG").ok();
        Self::load_from(path.as_deref())
    }

    pub fn load_from(path: Option<&str>) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => config::File::with_name(path),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("FATIGUE").separator("__"))
            .build()?
            .try_deserialize()?;

        settings.dms.validate()?;
        Ok(settings)
    }
}
