//! Formation repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Formation;

/// Repository interface for Formation persistence.
#[async_trait]
pub trait FormationRepository: Send + Sync {
    /// Create a new formation.
    async fn create(&self, formation: &Formation) -> DomainResult<()>;

    /// Get a formation by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Formation>>;

    /// All formations with their current target counts.
    async fn list(&self) -> DomainResult<Vec<Formation>>;

    /// List formations owned by a flight.
    async fn list_by_flight(&self, flight_id: Uuid) -> DomainResult<Vec<Formation>>;

    /// Persist a new target count. No other column is written.
    async fn update_target_count(&self, id: Uuid, target_count: u32) -> DomainResult<()>;

    /// Delete a formation.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;
}
