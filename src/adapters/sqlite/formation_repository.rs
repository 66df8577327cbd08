//! SQLite implementation of the FormationRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Formation;
use crate::domain::ports::FormationRepository;

use super::{format_datetime, parse_count, parse_datetime, parse_uuid};

/// SQLite-backed [`FormationRepository`](crate::domain::ports::FormationRepository).
pub struct SqliteFormationRepository {
    pool: SqlitePool,
}

impl SqliteFormationRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FormationRepository for SqliteFormationRepository {
    async fn create(&self, formation: &Formation) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO formations (id, flight_id, name, cpu, ram, disk, base_name, domain, target_count, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(formation.id.to_string())
        .bind(formation.flight_id.to_string())
        .bind(&formation.name)
        .bind(i64::from(formation.cpu))
        .bind(i64::from(formation.ram))
        .bind(i64::from(formation.disk))
        .bind(&formation.base_name)
        .bind(&formation.domain)
        .bind(i64::from(formation.target_count))
        .bind(format_datetime(&formation.created_at))
        .bind(format_datetime(&formation.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Formation>> {
        let row: Option<FormationRow> = sqlx::query_as("SELECT * FROM formations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Formation>> {
        let rows: Vec<FormationRow> =
            sqlx::query_as("SELECT * FROM formations ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_by_flight(&self, flight_id: Uuid) -> DomainResult<Vec<Formation>> {
        let rows: Vec<FormationRow> =
            sqlx::query_as("SELECT * FROM formations WHERE flight_id = ? ORDER BY created_at, id")
                .bind(flight_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn update_target_count(&self, id: Uuid, target_count: u32) -> DomainResult<()> {
        let result =
            sqlx::query("UPDATE formations SET target_count = ?, updated_at = ? WHERE id = ?")
                .bind(i64::from(target_count))
                .bind(format_datetime(&Utc::now()))
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::FormationNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM formations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::FormationNotFound(id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct FormationRow {
    id: String,
    flight_id: String,
    name: String,
    cpu: i64,
    ram: i64,
    disk: i64,
    base_name: String,
    domain: String,
    target_count: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<FormationRow> for Formation {
    type Error = DomainError;

    fn try_from(row: FormationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            flight_id: parse_uuid(&row.flight_id)?,
            name: row.name,
            cpu: parse_count("cpu", row.cpu)?,
            ram: parse_count("ram", row.ram)?,
            disk: parse_count("disk", row.disk)?,
            base_name: row.base_name,
            domain: row.domain,
            target_count: parse_count("target_count", row.target_count)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteAirspaceRepository, SqliteFlightRepository,
    };
    use crate::domain::models::{Airspace, Flight, NewFormation};
    use crate::domain::ports::{AirspaceRepository, FlightRepository};

    async fn setup() -> (SqliteFormationRepository, Uuid) {
        let pool = create_migrated_test_pool().await.unwrap();
        let airspace = Airspace::new("Production", "prod");
        SqliteAirspaceRepository::new(pool.clone())
            .create(&airspace)
            .await
            .unwrap();
        let flight = Flight::new(airspace.id, "frontend");
        SqliteFlightRepository::new(pool.clone())
            .create(&flight)
            .await
            .unwrap();
        (SqliteFormationRepository::new(pool), flight.id)
    }

    fn formation(flight_id: Uuid, target_count: u32) -> Formation {
        Formation::new(NewFormation {
            flight_id,
            name: "web".to_string(),
            cpu: 2,
            ram: 2048,
            disk: 20,
            base_name: "web".to_string(),
            domain: "prod.internal".to_string(),
            target_count,
        })
    }

    #[tokio::test]
    async fn test_create_and_get_formation() {
        let (repo, flight_id) = setup().await;
        let created = formation(flight_id, 3);
        repo.create(&created).await.unwrap();

        let retrieved = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(retrieved.target_count, 3);
        assert_eq!(retrieved.ram, 2048);
        assert_eq!(retrieved.domain, "prod.internal");
    }

    #[tokio::test]
    async fn test_update_target_count_leaves_sizing() {
        let (repo, flight_id) = setup().await;
        let created = formation(flight_id, 1);
        repo.create(&created).await.unwrap();

        repo.update_target_count(created.id, 7).await.unwrap();

        let retrieved = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(retrieved.target_count, 7);
        assert_eq!(retrieved.cpu, created.cpu);
        assert_eq!(retrieved.base_name, created.base_name);
    }

    #[tokio::test]
    async fn test_update_target_count_missing_formation() {
        let (repo, _) = setup().await;
        let result = repo.update_target_count(Uuid::new_v4(), 1).await;
        assert!(matches!(result, Err(DomainError::FormationNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_flight() {
        let (repo, flight_id) = setup().await;
        repo.create(&formation(flight_id, 1)).await.unwrap();
        repo.create(&formation(flight_id, 2)).await.unwrap();

        assert_eq!(repo.list_by_flight(flight_id).await.unwrap().len(), 2);
        assert!(repo.list_by_flight(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
