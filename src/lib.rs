//! atc - fleet control plane
//!
//! Keeps every Formation at its target number of Planes by building on the
//! configured active provider driver and destroying through whichever driver
//! built each instance.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, error taxonomy and ports
//! - **Adapters** (`adapters`): provider drivers and SQLite persistence
//! - **Service Layer** (`services`): driver selection, reconciliation, fleet management
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use adapters::drivers::{DriverRegistry, DummyDriver, ProxmoxLxcDriver};
pub use domain::models::{Airspace, Config, Cuid, Flight, Formation, FormationSpec, Plane, PlaneStatus};
pub use domain::ports::{DriverConfigSource, ProviderDriver};
pub use domain::{DomainError, DomainResult, DriverKey};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{DriverSelector, FleetService, FormationReconciler, ReconcileDaemon, ReconcileReport};
