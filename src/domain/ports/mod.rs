//! Domain ports (interfaces) for the atc control plane.
//!
//! Ports define the contracts that adapters must implement: provider
//! drivers, the configuration read path and the persistence collaborators.

pub mod airspace_repository;
pub mod driver_config;
pub mod flight_repository;
pub mod formation_repository;
pub mod plane_repository;
pub mod provider_driver;

pub use airspace_repository::AirspaceRepository;
pub use driver_config::DriverConfigSource;
pub use flight_repository::FlightRepository;
pub use formation_repository::FormationRepository;
pub use plane_repository::PlaneRepository;
pub use provider_driver::ProviderDriver;
