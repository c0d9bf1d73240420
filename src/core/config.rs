//! Configuration for the Metridex catalog.
//!
//! Supports YAML files, environment variable overrides, and validation
//! with sensible defaults throughout.

use crate::core::error::{MetridexError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default staleness window: metadata older than this is rebuilt from the
/// next data point that arrives for the key.
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(6 * 60 * 60);

/// Complete configuration for Metridex
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog behavior
    pub catalog: CatalogConfig,
    /// External store settings
    pub store: StoreConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Catalog behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Age after which cached metadata is rebuilt from the live stream
    #[serde(with = "humantime_serde")]
    pub staleness_window: Duration,
    /// Capacity of the ingest channel feeding the adapter loop
    pub ingest_channel_capacity: usize,
}

/// External store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Page size the backfill scan asks the store for
    pub page_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Full EnvFilter directive; overrides `level` when set
    pub filter: Option<String>,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level (very verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    Info,
    /// Warning level
    Warn,
    /// Error level only
    Error,
}

impl LogLevel {
    /// Returns the level as an EnvFilter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            staleness_window: DEFAULT_STALENESS_WINDOW,
            ingest_channel_capacity: 1024,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { page_size: 500 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            filter: None,
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&raw)
            .map_err(|e| MetridexError::config(format!("failed to parse {:?}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment variable overrides.
    ///
    /// - `METRIDEX_STALENESS_SECS`: staleness window in seconds
    /// - `METRIDEX_PAGE_SIZE`: store scan page size
    /// - `METRIDEX_LOG`: EnvFilter directive
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(secs) = std::env::var("METRIDEX_STALENESS_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                MetridexError::config(format!("METRIDEX_STALENESS_SECS is not a number: {}", secs))
            })?;
            self.catalog.staleness_window = Duration::from_secs(secs);
        }
        if let Ok(size) = std::env::var("METRIDEX_PAGE_SIZE") {
            let size: usize = size.parse().map_err(|_| {
                MetridexError::config(format!("METRIDEX_PAGE_SIZE is not a number: {}", size))
            })?;
            self.store.page_size = size;
        }
        if let Ok(filter) = std::env::var("METRIDEX_LOG") {
            if !filter.is_empty() {
                self.logging.filter = Some(filter);
            }
        }
        self.validate()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.staleness_window.is_zero() {
            return Err(MetridexError::config(
                "catalog.staleness_window must be greater than zero",
            ));
        }
        if self.catalog.ingest_channel_capacity == 0 {
            return Err(MetridexError::config(
                "catalog.ingest_channel_capacity must be greater than zero",
            ));
        }
        if self.store.page_size == 0 {
            return Err(MetridexError::config("store.page_size must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog.staleness_window, Duration::from_secs(21600));
        assert_eq!(config.store.page_size, 500);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = r#"
catalog:
  staleness_window: 30m
store:
  page_size: 100
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.catalog.staleness_window, Duration::from_secs(1800));
        assert_eq!(config.store.page_size, 100);
        // Untouched sections keep their defaults.
        assert_eq!(config.catalog.ingest_channel_capacity, 1024);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: debug").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = Config::default();
        config.store.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.catalog.staleness_window = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
