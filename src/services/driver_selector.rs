//! Active build driver selection and destroy routing.
//!
//! Builds go to whichever driver configuration currently names. Destroys go
//! to the driver that built the instance, read back from the CUID prefix, so
//! switching the active driver never orphans existing instances.

use std::sync::Arc;

use crate::adapters::drivers::DriverRegistry;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Cuid;
use crate::domain::ports::{DriverConfigSource, ProviderDriver};

/// Picks the driver for each build and destroy.
pub struct DriverSelector {
    registry: Arc<DriverRegistry>,
    config: Arc<dyn DriverConfigSource>,
}

impl DriverSelector {
    /// Create a selector over a fixed registry and a live config source.
    pub fn new(registry: Arc<DriverRegistry>, config: Arc<dyn DriverConfigSource>) -> Self {
        Self { registry, config }
    }

    /// Driver that new instances are built on.
    ///
    /// The configured tag is re-read on every call. A missing tag or one that
    /// no registered driver answers to is a configuration error.
    pub fn active_build_driver(&self) -> DomainResult<Arc<dyn ProviderDriver>> {
        let tag = self.config.active_driver_tag()?.ok_or_else(|| {
            DomainError::Configuration("no active build driver configured".to_string())
        })?;

        self.registry.lookup_by_yaml_tag(&tag).map_err(|_| {
            DomainError::Configuration(format!(
                "active build driver '{tag}' is not registered"
            ))
        })
    }

    /// Driver responsible for tearing down `cuid`, chosen by its prefix.
    pub fn destroy_driver(&self, cuid: &Cuid) -> DomainResult<Arc<dyn ProviderDriver>> {
        let prefix = cuid.prefix()?;
        self.registry.lookup_by_cuid_prefix(prefix)
    }
}
