//! Generation service configuration parsed from environment variables.

use std::time::Duration;

use tracing::warn;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SNAPSHOT_TIMEOUT_MS: u64 = 2000;

const ENDPOINT_VAR: &str = "MAGIC_INK_ENDPOINT";
const API_KEY_VAR: &str = "MAGIC_INK_API_KEY";
const REQUEST_TIMEOUT_VAR: &str = "MAGIC_INK_REQUEST_TIMEOUT_SECS";
const CONNECT_TIMEOUT_VAR: &str = "MAGIC_INK_CONNECT_TIMEOUT_SECS";
const SNAPSHOT_TIMEOUT_VAR: &str = "MAGIC_INK_SNAPSHOT_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },

    #[error("{var} must be an http(s) URL, got '{value}'")]
    InvalidEndpoint { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
    pub snapshot_ms: u64,
}

impl Default for GenerationTimeouts {
    fn default() -> Self {
        Self {
            request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            snapshot_ms: DEFAULT_SNAPSHOT_TIMEOUT_MS,
        }
    }
}

impl GenerationTimeouts {
    #[must_use]
    pub fn snapshot(&self) -> Duration {
        Duration::from_millis(self.snapshot_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Full URL the generation request is POSTed to.
    pub endpoint: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub timeouts: GenerationTimeouts,
}

impl GenerationConfig {
    /// Build typed config from process environment variables.
    ///
    /// Required:
    /// - `MAGIC_INK_ENDPOINT`
    ///
    /// Optional:
    /// - `MAGIC_INK_API_KEY`
    /// - `MAGIC_INK_REQUEST_TIMEOUT_SECS`: default 120
    /// - `MAGIC_INK_CONNECT_TIMEOUT_SECS`: default 10
    /// - `MAGIC_INK_SNAPSHOT_TIMEOUT_MS`: default 2000
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is missing or not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GenerationConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is missing or not an http(s) URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENDPOINT_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing { var: ENDPOINT_VAR })?;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint { var: ENDPOINT_VAR, value: endpoint });
        }

        let api_key = lookup(API_KEY_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let timeouts = GenerationTimeouts {
            request_secs: parse_u64(&lookup, REQUEST_TIMEOUT_VAR, DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(&lookup, CONNECT_TIMEOUT_VAR, DEFAULT_CONNECT_TIMEOUT_SECS),
            snapshot_ms: parse_u64(&lookup, SNAPSHOT_TIMEOUT_VAR, DEFAULT_SNAPSHOT_TIMEOUT_MS),
        };

        Ok(Self { endpoint, api_key, timeouts })
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => value,
        _ => {
            warn!(key, value = %raw, default, "config: invalid timeout, using default");
            default
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
