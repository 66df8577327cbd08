//! Provider driver port - interface for infrastructure backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Cuid, FormationSpec};

/// Trait for infrastructure backends that provision Planes.
///
/// A driver reports two identities: the YAML tag operators put in
/// configuration to make it the active build driver, and the CUID prefix it
/// stamps on every instance it builds. The prefix is what routes a later
/// destroy back to this driver, so it must never change once instances
/// carrying it exist.
#[async_trait]
pub trait ProviderDriver: Send + Sync {
    /// Configuration-facing identifier (e.g. `dummy`, `proxmoxlxc`).
    fn yaml_tag(&self) -> &str;

    /// Provenance identifier embedded in every CUID this driver produces.
    fn cuid_prefix(&self) -> &str;

    /// Provision one instance matching the formation spec.
    ///
    /// The returned CUID's prefix equals [`Self::cuid_prefix`]. An error
    /// means no usable instance exists.
    async fn build(&self, spec: &FormationSpec) -> DomainResult<Cuid>;

    /// Tear down the instance identified by `cuid`.
    ///
    /// Returns `DomainError::InstanceNotFound` when the instance is already
    /// gone; callers treat that as success.
    async fn destroy(&self, cuid: &Cuid) -> DomainResult<()>;
}
