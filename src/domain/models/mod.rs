//! Domain models.

pub mod airspace;
pub mod config;
pub mod flight;
pub mod formation;
pub mod plane;

pub use airspace::Airspace;
pub use config::{Config, DatabaseConfig, DriversConfig, LoggingConfig, ReconcilerConfig};
pub use flight::Flight;
pub use formation::{Formation, FormationSpec, NewFormation};
pub use plane::{Cuid, Plane, PlaneStatus, CUID_DELIMITER};
