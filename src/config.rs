//! Configuration loading from TOML files
//!
//! Structured configuration for the client: the roster endpoints, the
//! connection timeout and submission defaults.

use crate::roster::{NodeAddress, Roster};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Roster of candidate nodes.
    pub roster: RosterConfig,

    /// Connection behavior.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Submission behavior.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Node WebSocket endpoints, in failover order; the first is the leader.
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Confirmation rounds to wait on submission; 0 = fire-and-forget.
    #[serde(default)]
    pub wait_rounds: u32,
}

fn default_timeout_ms() -> u64 {
    1_000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { wait_rounds: 0 }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.roster.endpoints.is_empty() {
            return Err(ConfigError::Invalid(
                "roster.endpoints must list at least one node".to_string(),
            ));
        }
        if self.connection.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "connection.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured roster, in file order.
    pub fn roster(&self) -> Roster {
        Roster::new(
            self.roster
                .endpoints
                .iter()
                .map(|e| NodeAddress::new(e.clone()))
                .collect(),
        )
    }

    /// The configured per-call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.connection.timeout_ms)
    }
}
