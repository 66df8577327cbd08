//! Flight repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Flight;

/// Repository interface for Flight persistence.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// Create a new flight.
    async fn create(&self, flight: &Flight) -> DomainResult<()>;

    /// Get a flight by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Flight>>;

    /// List all flights.
    async fn list(&self) -> DomainResult<Vec<Flight>>;

    /// List flights owned by an airspace.
    async fn list_by_airspace(&self, airspace_id: Uuid) -> DomainResult<Vec<Flight>>;

    /// Update a flight.
    async fn update(&self, flight: &Flight) -> DomainResult<()>;

    /// Delete a flight along with its formations.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;
}
