use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Application-level settings
    pub application: ApplicationConfig,

    /// Model artifact configuration
    pub model: ModelConfig,

    /// History store configuration
    pub history: HistoryConfig,

    /// Meal / sugar tracker configuration
    pub trackers: TrackerConfig,

    /// Advice generation configuration
    #[serde(default)]
    pub advice: AdviceConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> std::result::Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: DHM)
            .add_source(
                config::Environment::with_prefix("DHM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// IANA time zone used for prediction timestamps
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl ApplicationConfig {
    /// Parse the configured time zone
    pub fn time_zone(&self) -> Result<chrono_tz::Tz> {
        self.time_zone.parse::<chrono_tz::Tz>().map_err(|_| {
            AppError::Configuration(format!("unknown time zone '{}'", self.time_zone))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the trained classifier artifact
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Path to the labelled reference dataset (CSV); powers the
    /// explanation and performance features
    pub reference_data_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// History backend type
    #[serde(default)]
    pub backend: HistoryBackend,

    /// Directory for per-user history files (csv backend)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryBackend {
    #[default]
    Csv,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Directory for per-user meal and sugar logs
    #[serde(default = "default_tracker_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdviceConfig {
    /// Enable the HTTP-backed advice generator
    #[serde(default)]
    pub enabled: bool,

    /// Advice endpoint URL
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: Option<String>,

    /// Request timeout (seconds)
    #[serde(default = "default_advice_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("data/model/diabetes_model.json")
}

fn default_tracker_path() -> PathBuf {
    PathBuf::from("data/trackers")
}

fn default_advice_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        assert_eq!(default_http_port(), 8080);
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_time_zone(), "UTC");
    }

    #[test]
    fn test_history_backend_default() {
        assert_eq!(HistoryBackend::default(), HistoryBackend::Csv);
    }

    #[test]
    fn test_time_zone_parsing() {
        let app = ApplicationConfig {
            time_zone: "Europe/Berlin".to_string(),
        };
        assert!(app.time_zone().is_ok());

        let bad = ApplicationConfig {
            time_zone: "Mars/Olympus".to_string(),
        };
        assert!(bad.time_zone().is_err());
    }
}
