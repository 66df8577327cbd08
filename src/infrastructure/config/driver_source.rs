//! Configuration sources for the active build driver.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DriversConfig;
use crate::domain::ports::DriverConfigSource;

use super::loader::ConfigLoader;

/// Reads `drivers.active` from the config file and environment on every call.
pub struct FigmentDriverSource {
    path: PathBuf,
}

impl FigmentDriverSource {
    /// Read from the config file at `path` plus `ATC_` overrides.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DriverConfigSource for FigmentDriverSource {
    fn active_driver_tag(&self) -> DomainResult<Option<String>> {
        let drivers: DriversConfig = ConfigLoader::figment(&self.path)
            .extract_inner("drivers")
            .map_err(|e| {
                DomainError::Configuration(format!(
                    "failed to read drivers from {}: {e}",
                    self.path.display()
                ))
            })?;

        Ok(drivers
            .active
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty()))
    }
}

/// In-memory source whose value can be swapped at runtime.
#[derive(Default)]
pub struct StaticDriverSource {
    active: RwLock<Option<String>>,
}

impl StaticDriverSource {
    /// Start with `active` as the configured tag.
    pub fn new(active: Option<&str>) -> Self {
        Self {
            active: RwLock::new(active.map(str::to_string)),
        }
    }

    /// Replace the configured tag.
    pub fn set(&self, active: Option<&str>) {
        if let Ok(mut guard) = self.active.write() {
            *guard = active.map(str::to_string);
        }
    }
}

impl DriverConfigSource for StaticDriverSource {
    fn active_driver_tag(&self) -> DomainResult<Option<String>> {
        self.active
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| DomainError::Configuration("driver source lock poisoned".to_string()))
    }
}
