//! Fleet management: create, inspect and edit the desired-state hierarchy.
//!
//! Plane records are owned by the reconciler and only ever read here.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Airspace, Flight, Formation, NewFormation, Plane};
use crate::domain::ports::{
    AirspaceRepository, FlightRepository, FormationRepository, PlaneRepository,
};

/// CRUD over airspaces, flights and formations, with read access to planes.
pub struct FleetService {
    airspaces: Arc<dyn AirspaceRepository>,
    flights: Arc<dyn FlightRepository>,
    formations: Arc<dyn FormationRepository>,
    planes: Arc<dyn PlaneRepository>,
}

impl FleetService {
    /// Create a service over the given repositories.
    pub fn new(
        airspaces: Arc<dyn AirspaceRepository>,
        flights: Arc<dyn FlightRepository>,
        formations: Arc<dyn FormationRepository>,
        planes: Arc<dyn PlaneRepository>,
    ) -> Self {
        Self {
            airspaces,
            flights,
            formations,
            planes,
        }
    }

    // Airspaces

    /// Validate and persist a new airspace.
    pub async fn create_airspace(&self, human_name: &str, net_name: &str) -> DomainResult<Airspace> {
        let airspace = Airspace::new(human_name.trim(), net_name.trim());
        airspace.validate()?;
        self.airspaces.create(&airspace).await?;
        info!(airspace_id = %airspace.id, name = %airspace.human_name, "airspace created");
        Ok(airspace)
    }

    /// Fetch an airspace or fail with `AirspaceNotFound`.
    pub async fn get_airspace(&self, id: Uuid) -> DomainResult<Airspace> {
        self.airspaces
            .get(id)
            .await?
            .ok_or(DomainError::AirspaceNotFound(id))
    }

    /// Every airspace.
    pub async fn list_airspaces(&self) -> DomainResult<Vec<Airspace>> {
        self.airspaces.list().await
    }

    /// Replace an airspace's names.
    pub async fn update_airspace(
        &self,
        id: Uuid,
        human_name: &str,
        net_name: &str,
    ) -> DomainResult<Airspace> {
        let mut airspace = self.get_airspace(id).await?;
        airspace.rename(human_name.trim(), net_name.trim());
        airspace.validate()?;
        self.airspaces.update(&airspace).await?;
        Ok(airspace)
    }

    /// Delete an airspace and everything under it. Refused while any of its
    /// formations still owns planes.
    pub async fn delete_airspace(&self, id: Uuid) -> DomainResult<()> {
        self.get_airspace(id).await?;
        for flight in self.flights.list_by_airspace(id).await? {
            self.ensure_flight_empty(&flight).await?;
        }
        self.airspaces.delete(id).await?;
        info!(airspace_id = %id, "airspace deleted");
        Ok(())
    }

    // Flights

    /// Create a flight inside an existing airspace.
    pub async fn create_flight(&self, airspace_id: Uuid, name: &str) -> DomainResult<Flight> {
        self.get_airspace(airspace_id).await?;
        let flight = Flight::new(airspace_id, name.trim());
        flight.validate()?;
        self.flights.create(&flight).await?;
        info!(flight_id = %flight.id, airspace_id = %airspace_id, "flight created");
        Ok(flight)
    }

    /// Fetch a flight or fail with `FlightNotFound`.
    pub async fn get_flight(&self, id: Uuid) -> DomainResult<Flight> {
        self.flights
            .get(id)
            .await?
            .ok_or(DomainError::FlightNotFound(id))
    }

    /// All flights, or only those in `airspace_id`.
    pub async fn list_flights(&self, airspace_id: Option<Uuid>) -> DomainResult<Vec<Flight>> {
        match airspace_id {
            Some(id) => self.flights.list_by_airspace(id).await,
            None => self.flights.list().await,
        }
    }

    /// Rename a flight.
    pub async fn update_flight(&self, id: Uuid, name: &str) -> DomainResult<Flight> {
        let mut flight = self.get_flight(id).await?;
        flight.rename(name.trim());
        flight.validate()?;
        self.flights.update(&flight).await?;
        Ok(flight)
    }

    /// Delete a flight. Refused while any of its formations still owns planes.
    pub async fn delete_flight(&self, id: Uuid) -> DomainResult<()> {
        let flight = self.get_flight(id).await?;
        self.ensure_flight_empty(&flight).await?;
        self.flights.delete(id).await?;
        info!(flight_id = %id, "flight deleted");
        Ok(())
    }

    // Formations

    /// Create a formation inside an existing flight.
    pub async fn create_formation(&self, fields: NewFormation) -> DomainResult<Formation> {
        self.get_flight(fields.flight_id).await?;
        let formation = Formation::new(fields);
        formation.validate()?;
        self.formations.create(&formation).await?;
        info!(
            formation_id = %formation.id,
            flight_id = %formation.flight_id,
            target_count = formation.target_count,
            "formation created"
        );
        Ok(formation)
    }

    /// Fetch a formation or fail with `FormationNotFound`.
    pub async fn get_formation(&self, id: Uuid) -> DomainResult<Formation> {
        self.formations
            .get(id)
            .await?
            .ok_or(DomainError::FormationNotFound(id))
    }

    /// All formations, or only those in `flight_id`.
    pub async fn list_formations(&self, flight_id: Option<Uuid>) -> DomainResult<Vec<Formation>> {
        match flight_id {
            Some(id) => self.formations.list_by_flight(id).await,
            None => self.formations.list().await,
        }
    }

    /// Change a formation's target count. Sizing and naming are fixed at
    /// creation and cannot be changed here.
    pub async fn set_target_count(&self, id: Uuid, target_count: u32) -> DomainResult<Formation> {
        let mut formation = self.get_formation(id).await?;
        let previous = formation.target_count;
        self.formations.update_target_count(id, target_count).await?;
        formation.set_target_count(target_count);
        info!(formation_id = %id, previous, target_count, "formation target changed");
        Ok(formation)
    }

    /// Delete a formation. Refused while it still owns planes; scale it to
    /// zero and let the reconciler drain it first.
    pub async fn delete_formation(&self, id: Uuid) -> DomainResult<()> {
        let formation = self.get_formation(id).await?;
        self.ensure_formation_empty(&formation).await?;
        self.formations.delete(id).await?;
        info!(formation_id = %id, "formation deleted");
        Ok(())
    }

    // Planes

    /// Plane records, or only those of `formation_id`.
    pub async fn list_planes(&self, formation_id: Option<Uuid>) -> DomainResult<Vec<Plane>> {
        match formation_id {
            Some(id) => self.planes.list_by_formation(id).await,
            None => self.planes.list().await,
        }
    }

    async fn ensure_flight_empty(&self, flight: &Flight) -> DomainResult<()> {
        for formation in self.formations.list_by_flight(flight.id).await? {
            self.ensure_formation_empty(&formation).await?;
        }
        Ok(())
    }

    async fn ensure_formation_empty(&self, formation: &Formation) -> DomainResult<()> {
        let live = self.planes.count_by_formation(formation.id).await?;
        if live > 0 {
            return Err(DomainError::ValidationFailed(format!(
                "formation '{}' still has {live} plane(s); scale it to 0 first",
                formation.name
            )));
        }
        Ok(())
    }
}
