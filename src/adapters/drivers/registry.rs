//! Driver registry and lookups.
//!
//! Built once at startup from a static list of drivers and never mutated
//! afterwards, so lookups are pure functions of its contents and need no
//! synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult, DriverKey};
use crate::domain::ports::ProviderDriver;

use super::dummy::DummyDriver;
use super::proxmox_lxc::ProxmoxLxcDriver;

/// Immutable table of registered provider drivers.
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn ProviderDriver>>,
    by_yaml_tag: HashMap<String, usize>,
    by_cuid_prefix: HashMap<String, usize>,
}

impl DriverRegistry {
    /// Build a registry from a list of drivers.
    ///
    /// Fails if two drivers share a YAML tag or a CUID prefix.
    pub fn new(drivers: Vec<Arc<dyn ProviderDriver>>) -> DomainResult<Self> {
        let mut by_yaml_tag = HashMap::with_capacity(drivers.len());
        let mut by_cuid_prefix = HashMap::with_capacity(drivers.len());

        for (index, driver) in drivers.iter().enumerate() {
            let tag = driver.yaml_tag().to_string();
            if by_yaml_tag.insert(tag.clone(), index).is_some() {
                return Err(DomainError::DuplicateDriver {
                    key: DriverKey::YamlTag,
                    value: tag,
                });
            }

            let prefix = driver.cuid_prefix().to_string();
            if by_cuid_prefix.insert(prefix.clone(), index).is_some() {
                return Err(DomainError::DuplicateDriver {
                    key: DriverKey::CuidPrefix,
                    value: prefix,
                });
            }
        }

        Ok(Self {
            drivers,
            by_yaml_tag,
            by_cuid_prefix,
        })
    }

    /// The drivers compiled into this binary.
    pub fn builtin() -> DomainResult<Self> {
        Self::new(vec![
            Arc::new(DummyDriver::new()),
            Arc::new(ProxmoxLxcDriver::new()),
        ])
    }

    /// Find the driver whose configuration tag equals `tag`.
    pub fn lookup_by_yaml_tag(&self, tag: &str) -> DomainResult<Arc<dyn ProviderDriver>> {
        self.by_yaml_tag
            .get(tag)
            .map(|&index| Arc::clone(&self.drivers[index]))
            .ok_or_else(|| DomainError::UnknownDriver {
                key: DriverKey::YamlTag,
                value: tag.to_string(),
            })
    }

    /// Find the driver whose CUID prefix equals `prefix`.
    pub fn lookup_by_cuid_prefix(&self, prefix: &str) -> DomainResult<Arc<dyn ProviderDriver>> {
        self.by_cuid_prefix
            .get(prefix)
            .map(|&index| Arc::clone(&self.drivers[index]))
            .ok_or_else(|| DomainError::UnknownDriver {
                key: DriverKey::CuidPrefix,
                value: prefix.to_string(),
            })
    }

    /// Registered drivers in registration order.
    pub fn drivers(&self) -> impl Iterator<Item = &Arc<dyn ProviderDriver>> {
        self.drivers.iter()
    }

    /// Number of registered drivers.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Whether no driver is registered.
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.drivers
                    .iter()
                    .map(|d| format!("{} ({})", d.yaml_tag(), d.cuid_prefix())),
            )
            .finish()
    }
}
