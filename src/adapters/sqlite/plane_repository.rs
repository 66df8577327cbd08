//! SQLite implementation of the PlaneRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Cuid, Plane, PlaneStatus};
use crate::domain::ports::PlaneRepository;

use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed [`PlaneRepository`](crate::domain::ports::PlaneRepository).
pub struct SqlitePlaneRepository {
    pool: SqlitePool,
}

impl SqlitePlaneRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaneRepository for SqlitePlaneRepository {
    async fn create(&self, plane: &Plane) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO planes (cuid, formation_id, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(plane.cuid.as_str())
        .bind(plane.formation_id.to_string())
        .bind(plane.status.as_str())
        .bind(format_datetime(&plane.created_at))
        .bind(format_datetime(&plane.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, cuid: &Cuid) -> DomainResult<Option<Plane>> {
        let row: Option<PlaneRow> = sqlx::query_as("SELECT * FROM planes WHERE cuid = ?")
            .bind(cuid.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Plane>> {
        let rows: Vec<PlaneRow> =
            sqlx::query_as("SELECT * FROM planes ORDER BY formation_id, created_at, cuid")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_by_formation(&self, formation_id: Uuid) -> DomainResult<Vec<Plane>> {
        let rows: Vec<PlaneRow> = sqlx::query_as(
            "SELECT * FROM planes WHERE formation_id = ? ORDER BY created_at, cuid",
        )
        .bind(formation_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn count_by_formation(&self, formation_id: Uuid) -> DomainResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM planes WHERE formation_id = ?")
            .bind(formation_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count).map_err(|e| DomainError::SerializationError(e.to_string()))
    }

    async fn update_status(&self, cuid: &Cuid, status: PlaneStatus) -> DomainResult<()> {
        let result = sqlx::query("UPDATE planes SET status = ?, updated_at = ? WHERE cuid = ?")
            .bind(status.as_str())
            .bind(format_datetime(&Utc::now()))
            .bind(cuid.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::PlaneNotFound(cuid.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, cuid: &Cuid) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM planes WHERE cuid = ?")
            .bind(cuid.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::PlaneNotFound(cuid.to_string()));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct PlaneRow {
    cuid: String,
    formation_id: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<PlaneRow> for Plane {
    type Error = DomainError;

    fn try_from(row: PlaneRow) -> Result<Self, Self::Error> {
        let status = PlaneStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid plane status: {}", row.status))
        })?;

        Ok(Self {
            cuid: Cuid::from_raw(row.cuid),
            formation_id: parse_uuid(&row.formation_id)?,
            status,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
