//! SQLite implementation of the FlightRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Flight;
use crate::domain::ports::FlightRepository;

use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed [`FlightRepository`](crate::domain::ports::FlightRepository).
pub struct SqliteFlightRepository {
    pool: SqlitePool,
}

impl SqliteFlightRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FlightRepository for SqliteFlightRepository {
    async fn create(&self, flight: &Flight) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO flights (id, airspace_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(flight.id.to_string())
        .bind(flight.airspace_id.to_string())
        .bind(&flight.name)
        .bind(format_datetime(&flight.created_at))
        .bind(format_datetime(&flight.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Flight>> {
        let row: Option<FlightRow> = sqlx::query_as("SELECT * FROM flights WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Flight>> {
        let rows: Vec<FlightRow> = sqlx::query_as("SELECT * FROM flights ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_by_airspace(&self, airspace_id: Uuid) -> DomainResult<Vec<Flight>> {
        let rows: Vec<FlightRow> =
            sqlx::query_as("SELECT * FROM flights WHERE airspace_id = ? ORDER BY created_at, id")
                .bind(airspace_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn update(&self, flight: &Flight) -> DomainResult<()> {
        let result = sqlx::query("UPDATE flights SET name = ?, updated_at = ? WHERE id = ?")
            .bind(&flight.name)
            .bind(format_datetime(&flight.updated_at))
            .bind(flight.id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::FlightNotFound(flight.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM flights WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::FlightNotFound(id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: String,
    airspace_id: String,
    name: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<FlightRow> for Flight {
    type Error = DomainError;

    fn try_from(row: FlightRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            airspace_id: parse_uuid(&row.airspace_id)?,
            name: row.name,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteAirspaceRepository};
    use crate::domain::models::Airspace;
    use crate::domain::ports::AirspaceRepository;

    #[tokio::test]
    async fn test_list_by_airspace_filters() {
        let pool = create_migrated_test_pool().await.unwrap();
        let airspaces = SqliteAirspaceRepository::new(pool.clone());
        let repo = SqliteFlightRepository::new(pool);

        let prod = Airspace::new("Production", "prod");
        let dev = Airspace::new("Development", "dev");
        airspaces.create(&prod).await.unwrap();
        airspaces.create(&dev).await.unwrap();

        repo.create(&Flight::new(prod.id, "frontend")).await.unwrap();
        repo.create(&Flight::new(prod.id, "backend")).await.unwrap();
        repo.create(&Flight::new(dev.id, "sandbox")).await.unwrap();

        assert_eq!(repo.list_by_airspace(prod.id).await.unwrap().len(), 2);
        assert_eq!(repo.list_by_airspace(dev.id).await.unwrap().len(), 1);
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_flight_requires_existing_airspace() {
        let pool = create_migrated_test_pool().await.unwrap();
        let repo = SqliteFlightRepository::new(pool);

        let orphan = Flight::new(Uuid::new_v4(), "orphan");
        assert!(matches!(
            repo.create(&orphan).await,
            Err(DomainError::DatabaseError(_))
        ));
    }
}
