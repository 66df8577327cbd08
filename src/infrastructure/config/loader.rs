//! Hierarchical configuration loading.
//!
//! Defaults, then the YAML file, then `ATC_` environment variables with `__`
//! separating nested keys.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Default location of the control plane's configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/captain/atc/config.yaml";

/// Prefix for environment overrides, e.g. `ATC_DRIVERS__ACTIVE=dummy`.
pub const ENV_PREFIX: &str = "ATC_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `logging.level` is not a tracing level
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// `logging.format` is neither json nor pretty
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// `database.path` is blank
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    /// `database.max_connections` is zero
    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    /// `reconciler.interval_secs` is zero
    #[error("Invalid interval_secs: {0}. Must be at least 1")]
    InvalidInterval(u64),

    /// `reconciler.max_parallel_operations` is zero
    #[error("Invalid max_parallel_operations: {0}. Must be at least 1")]
    InvalidParallelism(usize),

    /// `drivers.active` is set but blank
    #[error("Active driver tag cannot be blank")]
    BlankActiveDriver,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Build the figment for a config file.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. The YAML file at `path` (missing file is not an error)
    /// 3. Environment variables (`ATC_*`, nested keys split on `__`)
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from the default path.
    pub fn load() -> Result<Config> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from `path` with environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Self::figment(path.as_ref())
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, ignoring the environment.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Resolve the config path from an explicit flag, falling back to the default.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), Path::to_path_buf)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.reconciler.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval(config.reconciler.interval_secs));
        }

        if config.reconciler.max_parallel_operations == 0 {
            return Err(ConfigError::InvalidParallelism(
                config.reconciler.max_parallel_operations,
            ));
        }

        // An unknown tag is only detected per cycle, against the registry.
        if matches!(&config.drivers.active, Some(tag) if tag.trim().is_empty()) {
            return Err(ConfigError::BlankActiveDriver);
        }

        Ok(())
    }
}
