//! Domain layer for the atc control plane
//!
//! Pure models, error taxonomy and the ports (traits) that adapters and
//! services meet at.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult, DriverKey};
