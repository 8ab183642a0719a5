//! Configuration defaults and loading.
//!
//! Holds every tunable the service uses so the defaults live in one place.
//! [`ServerConfig`] is resolved in three layers, later layers winning:
//!
//! 1. `config.toml` (or an explicit path)
//! 2. Environment variables (see [`env_vars`])
//! 3. Command-line flags (applied by the binary)

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Fixed per-command response deadlines.
///
/// These are properties of the command kind, never caller supplied.
pub mod timeouts {
    /// Channel catalog sync.
    pub const CATALOG_MS: u64 = 2_000;
    /// Device status query.
    pub const DEVICE_STATUS_MS: u64 = 2_000;
    /// Alarm query.
    pub const ALARM_MS: u64 = 3_000;
    /// Upper bound for one gateway long-poll.
    pub const GATEWAY_POLL_MAX_MS: u64 = 30_000;
}

/// Default values.
pub mod defaults {
    pub const BIND: &str = "127.0.0.1:18080";
    pub const CONFIG_FILE: &str = "config.toml";
    /// Three missed 60s keepalives.
    pub const HEARTBEAT_TIMEOUT_SECS: u64 = 180;
    pub const GATEWAY_QUEUE_CAPACITY: usize = 1024;
    pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;
}

/// Environment variable names.
pub mod env_vars {
    pub const BIND: &str = "VMP_BIND";
    pub const LOG_JSON: &str = "VMP_LOG_JSON";
    pub const HEARTBEAT_TIMEOUT_SECS: &str = "VMP_HEARTBEAT_TIMEOUT_SECS";
    pub const GATEWAY_QUEUE: &str = "VMP_GATEWAY_QUEUE";
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP facade listens on.
    pub bind: SocketAddr,
    /// Emit JSON log lines instead of the compact human format.
    pub log_json: bool,
    /// Seconds without a keepalive before a device counts as offline.
    pub heartbeat_timeout_secs: u64,
    /// Capacity of the outbound command queue read by the signaling gateway.
    pub gateway_queue_capacity: usize,
    /// Largest accepted request body.
    pub max_request_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::BIND
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 18080))),
            log_json: false,
            heartbeat_timeout_secs: defaults::HEARTBEAT_TIMEOUT_SECS,
            gateway_queue_capacity: defaults::GATEWAY_QUEUE_CAPACITY,
            max_request_body_bytes: defaults::MAX_REQUEST_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or from `config.toml` in the working
    /// directory when no path is given. A missing default file is not an
    /// error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                info!(category = "config", "Loading config from: {}", path.display());
                Self::from_toml(&content)?
            }
            None => match std::fs::read_to_string(defaults::CONFIG_FILE) {
                Ok(content) => {
                    info!(
                        category = "config",
                        "Loading config from: {}",
                        defaults::CONFIG_FILE
                    );
                    Self::from_toml(&content)?
                }
                Err(_) => {
                    debug!(category = "config", "No config file, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(env_vars::BIND) {
            self.bind = bind
                .parse()
                .map_err(|_| Error::Config(format!("{} is not a socket address: {}", env_vars::BIND, bind)))?;
        }
        if let Some(json) = lookup(env_vars::LOG_JSON) {
            self.log_json = json.parse().unwrap_or(false);
        }
        if let Some(secs) = lookup(env_vars::HEARTBEAT_TIMEOUT_SECS) {
            self.heartbeat_timeout_secs = parse_env(env_vars::HEARTBEAT_TIMEOUT_SECS, &secs)?;
        }
        if let Some(capacity) = lookup(env_vars::GATEWAY_QUEUE) {
            self.gateway_queue_capacity = parse_env(env_vars::GATEWAY_QUEUE, &capacity)?;
        }
        self.validate()
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_timeout_secs == 0 {
            return Err(Error::validation("heartbeat_timeout_secs must be greater than 0"));
        }
        if self.gateway_queue_capacity == 0 {
            return Err(Error::validation("gateway_queue_capacity must be greater than 0"));
        }
        if self.max_request_body_bytes == 0 {
            return Err(Error::validation("max_request_body_bytes must be greater than 0"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value: {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.port(), 18080);
        assert!(!config.log_json);
        assert_eq!(config.heartbeat_timeout_secs, 180);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml("log_json = true\n").unwrap();
        assert!(config.log_json);
        assert_eq!(config.gateway_queue_capacity, defaults::GATEWAY_QUEUE_CAPACITY);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (env_vars::BIND, "0.0.0.0:9000"),
            (env_vars::LOG_JSON, "true"),
            (env_vars::GATEWAY_QUEUE, "16"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert!(config.log_json);
        assert_eq!(config.gateway_queue_capacity, 16);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = ServerConfig::default();
        let result = config.apply_env(|name| {
            (name == env_vars::HEARTBEAT_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_timeouts_are_per_kind() {
        assert_eq!(timeouts::CATALOG_MS, 2_000);
        assert_eq!(timeouts::DEVICE_STATUS_MS, 2_000);
        assert_eq!(timeouts::ALARM_MS, 3_000);
    }
}
