//! Configuration management for recsched
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Scheduler configuration
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the heuristic best-pick after overrides and preferences
    pub auto_resolve: bool,

    /// How often the watcher polls the change flag, in seconds
    pub poll_interval_secs: u64,

    /// Refuse to schedule when a source has no card input
    pub strict_topology: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/recsched.db"),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            auto_resolve: true,
            poll_interval_secs: 60,
            strict_topology: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

const LOG_FORMATS: &[&str] = &["text", "json"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let sqlite_path = std::env::var("RECSCHED_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database.sqlite_path);

        let auto_resolve = parse_env("RECSCHED_AUTO_RESOLVE")?
            .unwrap_or(defaults.scheduler.auto_resolve);

        let poll_interval_secs = parse_env("RECSCHED_POLL_INTERVAL")?
            .unwrap_or(defaults.scheduler.poll_interval_secs);

        let strict_topology = parse_env("RECSCHED_STRICT_TOPOLOGY")?
            .unwrap_or(defaults.scheduler.strict_topology);

        let level = std::env::var("RECSCHED_LOG_LEVEL").unwrap_or(defaults.logging.level);
        let format = std::env::var("RECSCHED_LOG_FORMAT").unwrap_or(defaults.logging.format);

        Ok(Self {
            database: DatabaseConfig { sqlite_path },
            scheduler: SchedulerConfig {
                auto_resolve,
                poll_interval_secs,
                strict_topology,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.sqlite_path.as_os_str().is_empty() {
            anyhow::bail!("sqlite_path must not be empty");
        }

        if self.scheduler.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than 0");
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "unknown log format '{}', expected one of {:?}",
                self.logging.format,
                LOG_FORMATS
            );
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "unknown log level '{}', expected one of {:?}",
                self.logging.level,
                LOG_LEVELS
            );
        }

        Ok(())
    }

    /// Get the change-flag poll interval as Duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.poll_interval_secs)
    }
}

/// Read and parse an optional environment variable
fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid value for {name}: {value}")),
        Err(_) => Ok(None),
    }
}
