//! Configuration loading and management.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server connection settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Bot identity and behavior.
    pub bot: BotConfig,
    /// Input limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server hostname (default: "irc.rizon.net").
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port (default: 6667).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// The `host:port` address to connect to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "irc.rizon.net".to_string()
}

fn default_port() -> u16 {
    6667
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Nickname registered with the server.
    pub nick: String,
    /// Home channel joined at startup (e.g. "#dogstar").
    pub channel: String,
    /// Name allowed to shut the bot down (matched case-insensitively).
    pub admin: String,
    /// Exact phrase the admin sends to shut the bot down.
    pub shutdown_phrase: String,
}

/// Input limits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted line length in bytes. Unset means no cap.
    #[serde(default)]
    pub max_line_len: Option<usize>,
}
