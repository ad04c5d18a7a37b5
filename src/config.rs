//! Runtime configuration read from environment variables.

use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_DEPTH: usize = 4;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Settings consumed by the locator and orchestrator.
#[derive(Debug, Clone)]
pub struct TurnoutConfig {
    /// Walk depth cap for discovery.
    pub max_depth: usize,
    /// Timeout for network-bound VFS initialization (archive download).
    pub fetch_timeout: Duration,
    /// Optional GitHub token; switches archive fetches to the
    /// authenticated API endpoint.
    pub github_token: Option<String>,
}

impl Default for TurnoutConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            github_token: None,
        }
    }
}

impl TurnoutConfig {
    /// Reads `TURNOUT_MAX_DEPTH`, `TURNOUT_FETCH_TIMEOUT_SECS`, and
    /// `GITHUB_TOKEN`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_depth = match env::var("TURNOUT_MAX_DEPTH") {
            Ok(raw) => raw.parse::<usize>().map_err(|e| ConfigError::ParseError {
                field: "TURNOUT_MAX_DEPTH".to_string(),
                error: e.to_string(),
            })?,
            Err(_) => DEFAULT_MAX_DEPTH,
        };

        let timeout_secs = match env::var("TURNOUT_FETCH_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| ConfigError::ParseError {
                field: "TURNOUT_FETCH_TIMEOUT_SECS".to_string(),
                error: e.to_string(),
            })?,
            Err(_) => DEFAULT_FETCH_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "TURNOUT_FETCH_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        let github_token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(Self {
            max_depth,
            fetch_timeout: Duration::from_secs(timeout_secs),
            github_token,
        })
    }
}
