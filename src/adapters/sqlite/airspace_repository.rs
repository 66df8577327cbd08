//! SQLite implementation of the AirspaceRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Airspace;
use crate::domain::ports::AirspaceRepository;

use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed [`AirspaceRepository`](crate::domain::ports::AirspaceRepository).
pub struct SqliteAirspaceRepository {
    pool: SqlitePool,
}

impl SqliteAirspaceRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AirspaceRepository for SqliteAirspaceRepository {
    async fn create(&self, airspace: &Airspace) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO airspaces (id, human_name, net_name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(airspace.id.to_string())
        .bind(&airspace.human_name)
        .bind(&airspace.net_name)
        .bind(format_datetime(&airspace.created_at))
        .bind(format_datetime(&airspace.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Airspace>> {
        let row: Option<AirspaceRow> = sqlx::query_as("SELECT * FROM airspaces WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Airspace>> {
        let rows: Vec<AirspaceRow> =
            sqlx::query_as("SELECT * FROM airspaces ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn update(&self, airspace: &Airspace) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE airspaces SET human_name = ?, net_name = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&airspace.human_name)
        .bind(&airspace.net_name)
        .bind(format_datetime(&airspace.updated_at))
        .bind(airspace.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AirspaceNotFound(airspace.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM airspaces WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AirspaceNotFound(id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct AirspaceRow {
    id: String,
    human_name: String,
    net_name: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<AirspaceRow> for Airspace {
    type Error = DomainError;

    fn try_from(row: AirspaceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            human_name: row.human_name,
            net_name: row.net_name,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
