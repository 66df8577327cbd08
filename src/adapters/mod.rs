//! Adapters for external systems: provider drivers and SQLite persistence.

pub mod drivers;
pub mod sqlite;
