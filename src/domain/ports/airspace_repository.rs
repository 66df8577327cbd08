//! Airspace repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Airspace;

/// Repository interface for Airspace persistence.
#[async_trait]
pub trait AirspaceRepository: Send + Sync {
    /// Create a new airspace.
    async fn create(&self, airspace: &Airspace) -> DomainResult<()>;

    /// Get an airspace by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Airspace>>;

    /// List all airspaces.
    async fn list(&self) -> DomainResult<Vec<Airspace>>;

    /// Update an airspace's names.
    async fn update(&self, airspace: &Airspace) -> DomainResult<()>;

    /// Delete an airspace along with its flights and formations.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;
}
