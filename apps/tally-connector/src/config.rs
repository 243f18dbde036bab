//! Connector configuration from environment variables.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Local Tally HTTP gateway, normally on the shop machine itself.
    pub tally_url: String,
    /// Full cloud sync endpoint, e.g. `https://api.example.com/sync`.
    pub cloud_endpoint: String,
    pub api_key: String,
    pub state_path: PathBuf,
    pub lookback_days: u64,
    pub max_window_days: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let tally_url =
            env::var("TALLY_URL").unwrap_or_else(|_| "http://localhost:9000".to_string());
        let cloud_endpoint = env::var("CLOUD_ENDPOINT")
            .map_err(|_| ConfigError::MissingVar("CLOUD_ENDPOINT".to_string()))?;
        let api_key =
            env::var("API_KEY").map_err(|_| ConfigError::MissingVar("API_KEY".to_string()))?;

        let state_path = env::var("SYNC_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("sync_state.json"));

        let lookback_days = parse_u64("SYNC_LOOKBACK_DAYS", "7")?;
        let max_window_days = parse_u64("SYNC_MAX_WINDOW_DAYS", "30")?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            tally_url,
            cloud_endpoint,
            api_key,
            state_path,
            lookback_days,
            max_window_days,
            rust_log,
        })
    }
}

fn parse_u64(var: &str, default: &str) -> Result<u64, ConfigError> {
    env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            var: var.to_string(),
            message: e.to_string(),
        })
}
