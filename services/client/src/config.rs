//! services/client/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
    #[error("Could not determine a data directory for this platform")]
    NoDataDir,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base address of the backend, including the `/api` prefix.
    pub api_base: String,
    pub log_level: Level,
    /// Where the two token strings are persisted.
    pub token_file: PathBuf,
    /// Directory for the client's log files (the terminal belongs to the TUI).
    pub log_dir: PathBuf,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let mut api_base = std::env::var("ASKDOC_API_BASE")
            .unwrap_or_else(|_| "http://localhost:8000/api".to_string());
        while api_base.ends_with('/') {
            api_base.pop();
        }
        if api_base.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ASKDOC_API_BASE".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let (token_file, log_dir) = match std::env::var("ASKDOC_TOKEN_FILE") {
            Ok(path) => {
                let token_file = PathBuf::from(path);
                let log_dir = std::env::var("ASKDOC_LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| {
                        token_file
                            .parent()
                            .map(|p| p.join("logs"))
                            .unwrap_or_else(|| PathBuf::from("./logs"))
                    });
                (token_file, log_dir)
            }
            Err(_) => {
                let dirs = directories::ProjectDirs::from("", "", "askdoc")
                    .ok_or(ConfigError::NoDataDir)?;
                let token_file = dirs.data_dir().join("tokens.json");
                let log_dir = std::env::var("ASKDOC_LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| dirs.data_dir().join("logs"));
                (token_file, log_dir)
            }
        };

        let http_timeout_secs = match std::env::var("ASKDOC_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(
                    "ASKDOC_HTTP_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a number of seconds", raw),
                )
            })?,
            Err(_) => 30,
        };

        Ok(Self {
            api_base,
            log_level,
            token_file,
            log_dir,
            http_timeout_secs,
        })
    }
}
