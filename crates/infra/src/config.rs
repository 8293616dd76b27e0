//! Configuration loading from the process environment.
//!
//! | variable               | default | meaning                                       |
//! |------------------------|---------|-----------------------------------------------|
//! | `DISPO_LOG_FORMAT`     | `json`  | `json` or `text` log output                   |
//! | `DISPO_WORKER_POLL_MS` | `250`   | how often dispatch workers check for shutdown |
//!
//! Log filtering itself follows `RUST_LOG`.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use dispo_observability::{LogFormat, ObservabilityConfig};

pub const LOG_FORMAT_VAR: &str = "DISPO_LOG_FORMAT";
pub const WORKER_POLL_MS_VAR: &str = "DISPO_WORKER_POLL_MS";

const DEFAULT_WORKER_POLL_MS: u64 = 250;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispoConfig {
    pub log_format: LogFormat,
    pub worker_poll_interval: Duration,
}

impl Default for DispoConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            worker_poll_interval: Duration::from_millis(DEFAULT_WORKER_POLL_MS),
        }
    }
}

impl DispoConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source (env, tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let log_format = match lookup(LOG_FORMAT_VAR) {
            Some(raw) => raw.parse::<LogFormat>().map_err(|e| ConfigError::Invalid {
                key: LOG_FORMAT_VAR,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => {
                debug!("{LOG_FORMAT_VAR} not set; using {:?}", defaults.log_format);
                defaults.log_format
            }
        };

        let worker_poll_interval = match lookup(WORKER_POLL_MS_VAR) {
            Some(raw) => {
                let millis = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key: WORKER_POLL_MS_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                if millis == 0 {
                    return Err(ConfigError::Invalid {
                        key: WORKER_POLL_MS_VAR,
                        value: raw,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_millis(millis)
            }
            None => defaults.worker_poll_interval,
        };

        Ok(Self {
            log_format,
            worker_poll_interval,
        })
    }

    pub fn observability(&self) -> ObservabilityConfig {
        ObservabilityConfig {
            format: self.log_format,
            ..ObservabilityConfig::default()
        }
    }
}
