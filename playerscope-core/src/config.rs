//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/playerscope/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/playerscope/` (~/.config/playerscope/)
//! - Data: `$XDG_DATA_HOME/playerscope/` (~/.local/share/playerscope/)
//! - State/Logs: `$XDG_STATE_HOME/playerscope/` (~/.local/state/playerscope/)

use crate::error::{Error, Result};
use crate::types::ScoreWeights;
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database location override
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix under which the player routes are mounted
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_prefix: default_api_prefix(),
        }
    }
}

impl ServerConfig {
    /// Get bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

/// Database configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DatabaseConfig {
    /// Override path for the SQLite database file
    pub path: Option<PathBuf>,
}

/// Analytics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Minimum sessions for a game type to appear in preference statistics
    #[serde(default = "default_min_games")]
    pub default_min_games: u32,

    /// Weights used when a value-score request carries none
    #[serde(default)]
    pub default_weights: ScoreWeights,

    /// Acquisition cost used by the ROI component of profitability
    #[serde(default = "default_acquisition_cost")]
    pub customer_acquisition_cost: f64,

    /// Write each completed analysis to its history table
    #[serde(default = "default_persist_results")]
    pub persist_results: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_min_games: default_min_games(),
            default_weights: ScoreWeights::default(),
            customer_acquisition_cost: default_acquisition_cost(),
            persist_results: default_persist_results(),
        }
    }
}

fn default_min_games() -> u32 {
    10
}

fn default_acquisition_cost() -> f64 {
    50.0
}

fn default_persist_results() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }
        if !self.analytics.default_weights.is_valid() {
            return Err(Error::Config(
                "analytics.default_weights must be finite and non-negative".to_string(),
            ));
        }
        if self.analytics.customer_acquisition_cost <= 0.0 {
            return Err(Error::Config(
                "analytics.customer_acquisition_cost must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/playerscope/config.toml` (~/.config/playerscope/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("playerscope").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/playerscope/` (~/.local/share/playerscope/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("playerscope")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/playerscope/` (~/.local/state/playerscope/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("playerscope")
    }

    /// Returns the default database file path
    ///
    /// `$XDG_DATA_HOME/playerscope/data.db` (~/.local/share/playerscope/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Database path honoring the `[database]` override.
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(Self::database_path)
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/playerscope/playerscope.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("playerscope.log")
    }
}
