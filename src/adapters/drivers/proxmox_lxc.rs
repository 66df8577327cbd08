//! Proxmox LXC container driver.
//!
//! Registered so that its configuration tag can be selected and so that
//! instances carrying the `proxmox.lxc` prefix route here for destroy. The
//! Proxmox API client itself is not part of this crate; build and destroy
//! report a provisioning error until one is wired in.

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Cuid, FormationSpec};
use crate::domain::ports::ProviderDriver;

/// Configuration tag of the Proxmox LXC driver.
pub const PROXMOX_LXC_YAML_TAG: &str = "proxmoxlxc";
/// Provenance prefix of Proxmox LXC instances.
pub const PROXMOX_LXC_CUID_PREFIX: &str = "proxmox.lxc";

/// Driver for Proxmox LXC containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProxmoxLxcDriver;

impl ProxmoxLxcDriver {
    /// Create the driver.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProviderDriver for ProxmoxLxcDriver {
    fn yaml_tag(&self) -> &str {
        PROXMOX_LXC_YAML_TAG
    }

    fn cuid_prefix(&self) -> &str {
        PROXMOX_LXC_CUID_PREFIX
    }

    async fn build(&self, spec: &FormationSpec) -> DomainResult<Cuid> {
        tracing::warn!(formation = %spec.name, "proxmox lxc backend is not available");
        Err(DomainError::provisioning(
            PROXMOX_LXC_YAML_TAG,
            "proxmox api backend is not available in this build",
        ))
    }

    async fn destroy(&self, cuid: &Cuid) -> DomainResult<()> {
        tracing::warn!(%cuid, "proxmox lxc backend is not available");
        Err(DomainError::provisioning(
            PROXMOX_LXC_YAML_TAG,
            "proxmox api backend is not available in this build",
        ))
    }
}
