//! Configuration model shared by the loader and the services.

use serde::{Deserialize, Serialize};

/// Main configuration structure for atc
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Provider driver selection
    #[serde(default)]
    pub drivers: DriversConfig,

    /// Reconciliation loop tuning
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    "/var/lib/captain/atc/atc.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Provider driver selection.
///
/// `active` holds the YAML tag of the one driver allowed to build new
/// instances. It is re-read every reconciliation cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DriversConfig {
    /// YAML tag of the active build driver
    #[serde(default)]
    pub active: Option<String>,
}

/// Reconciliation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReconcilerConfig {
    /// Seconds between full reconciliation passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Concurrent build/destroy calls allowed within one formation's cycle
    #[serde(default = "default_max_parallel_operations")]
    pub max_parallel_operations: usize,

    /// Consecutive failed passes before the daemon gives up
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

const fn default_interval_secs() -> u64 {
    30
}

const fn default_max_parallel_operations() -> usize {
    4
}

const fn default_max_consecutive_failures() -> u32 {
    5
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_parallel_operations: default_max_parallel_operations(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}
