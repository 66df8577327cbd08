//! CLI command implementations.

pub mod airspace;
pub mod driver;
pub mod flight;
pub mod formation;
pub mod plane;
pub mod reconcile;
pub mod serve;
