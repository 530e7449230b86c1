//! Configuration management for Threadcast
//!
//! Configuration is read from a TOML file and then overridden by
//! environment variables, so the sample app can run from environment alone.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.threads.net/";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub graph: GraphConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub base_url: String,
    pub api_version: Option<String>,
    /// Set to false to accept self-signed certificates (development only)
    pub reject_unauthorized: bool,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub initial_access_token: Option<String>,
    pub initial_user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    /// Give up after this many status checks; unbounded when absent
    pub max_attempts: Option<u32>,
    /// Retries of a failed status query before reporting a lost connection
    pub transport_retries: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            api_version: None,
            reject_unauthorized: true,
            timeout_secs: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: None,
            transport_retries: 3,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Load configuration from the default location, then apply environment overrides
    ///
    /// A missing file at the default location is not an error; a missing
    /// file named by `THREADCAST_CONFIG` is.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var("THREADCAST_CONFIG").is_ok();
        let path = resolve_config_path()?;

        let mut config = if explicit || path.exists() {
            Self::load_from_path(&path)?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_value("PORT", &port)?;
        }
        if let Some(version) = lookup("GRAPH_API_VERSION") {
            self.graph.api_version = Some(version).filter(|v| !v.is_empty());
        }
        if let Some(reject) = lookup("REJECT_UNAUTHORIZED") {
            // Only an explicit "false" turns verification off
            self.graph.reject_unauthorized = reject != "false";
        }
        if let Some(token) = lookup("INITIAL_ACCESS_TOKEN") {
            self.auth.initial_access_token = Some(token);
        }
        if let Some(user_id) = lookup("INITIAL_USER_ID") {
            self.auth.initial_user_id = Some(user_id);
        }
        if let Some(token) = lookup("THREADCAST_ACCESS_TOKEN") {
            self.auth.initial_access_token = Some(token);
        }
        if let Some(interval) = lookup("THREADCAST_POLL_INTERVAL") {
            self.polling.interval_secs = parse_value("THREADCAST_POLL_INTERVAL", &interval)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.graph.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("graph.base_url".to_string()).into());
        }
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.interval_secs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

/// Resolve the configuration file path following XDG base directory conventions
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("THREADCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("threadcast").join("config.toml"))
}
