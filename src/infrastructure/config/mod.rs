//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation
//! - Live driver selection re-read per cycle

pub mod driver_source;
pub mod loader;

pub use driver_source::{FigmentDriverSource, StaticDriverSource};
pub use loader::{ConfigError, ConfigLoader, DEFAULT_CONFIG_PATH, ENV_PREFIX};
