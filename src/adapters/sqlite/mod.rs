//! SQLite persistence adapters.

pub mod airspace_repository;
pub mod connection;
pub mod flight_repository;
pub mod formation_repository;
pub mod migrations;
pub mod plane_repository;

pub use airspace_repository::SqliteAirspaceRepository;
pub use connection::{create_pool, create_test_pool, database_url, ConnectionError, PoolConfig};
pub use flight_repository::SqliteFlightRepository;
pub use formation_repository::SqliteFormationRepository;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use plane_repository::SqlitePlaneRepository;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DatabaseConfig;

/// Parse a UUID string from a SQLite row field.
pub fn parse_uuid(s: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Fixed-width RFC3339 so that text ordering matches time ordering.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Convert a stored integer into an unsigned model field.
pub fn parse_count(column: &str, value: i64) -> DomainResult<u32> {
    u32::try_from(value).map_err(|_| {
        DomainError::SerializationError(format!("{column} out of range: {value}"))
    })
}

/// Errors raised while bringing the database up.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Opening the pool failed
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    /// Applying migrations failed
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    /// Any other query failed
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

/// Open the pool and apply pending migrations.
pub async fn initialize_database(database_url: &str, config: PoolConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, config).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Open (creating if needed) and migrate the configured database.
pub async fn initialize_from_config(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    initialize_database(&database_url(&config.path), PoolConfig::from(config)).await
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}
