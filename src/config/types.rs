//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::limits::LimitsConfig;
use super::listen::ListenConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
///
/// Every section is optional; an empty file yields a working server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server information.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Handshake and idle timeouts.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    /// Validation pipeline options.
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, used in logs (default: "ndfad").
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Prometheus metrics HTTP port (default: 9090, 0 disables).
    pub metrics_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            metrics_port: None,
        }
    }
}

fn default_server_name() -> String {
    "ndfad".to_string()
}

/// Connection timeouts, in seconds.
///
/// - `handshake`: time allowed between accept and a complete nickname line (default: 30)
/// - `idle`: time allowed between two frames from an active client (default: 0 = never)
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_handshake")]
    pub handshake: u64,
    #[serde(default)]
    pub idle: u64,
}

impl TimeoutsConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake)
    }

    /// `None` when idle disconnects are disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle > 0).then(|| Duration::from_secs(self.idle))
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            handshake: default_handshake(),
            idle: 0,
        }
    }
}

fn default_handshake() -> u64 {
    30
}

/// Validation pipeline options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationConfig {
    /// Also check that every transition uses known states and symbols.
    #[serde(default)]
    pub check_transitions: bool,
}
