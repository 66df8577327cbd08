//! Plane repository port.
//!
//! Plane records are the source of truth for how many instances a Formation
//! currently has.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Cuid, Plane, PlaneStatus};

/// Repository interface for Plane persistence.
#[async_trait]
pub trait PlaneRepository: Send + Sync {
    /// Record a newly built instance. Fails if the CUID is already recorded.
    async fn create(&self, plane: &Plane) -> DomainResult<()>;

    /// Get a plane record by CUID.
    async fn get(&self, cuid: &Cuid) -> DomainResult<Option<Plane>>;

    /// List every plane record.
    async fn list(&self) -> DomainResult<Vec<Plane>>;

    /// Planes owned by a formation, oldest first (ties by CUID).
    async fn list_by_formation(&self, formation_id: Uuid) -> DomainResult<Vec<Plane>>;

    /// Number of Plane records owned by a formation.
    async fn count_by_formation(&self, formation_id: Uuid) -> DomainResult<u64>;

    /// Change the status of a plane record.
    async fn update_status(&self, cuid: &Cuid, status: PlaneStatus) -> DomainResult<()>;

    /// Remove a plane record.
    async fn delete(&self, cuid: &Cuid) -> DomainResult<()>;
}
