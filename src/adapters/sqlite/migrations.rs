//! SQLite schema migrations embedded in the binary.

use sqlx::SqlitePool;
use thiserror::Error;

/// Errors raised while migrating the schema.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A migration's SQL failed; nothing from it was applied
    #[error("Failed to execute migration {version}: {source}")]
    ExecutionError {
        /// Version of the failed migration
        version: i64,
        /// Underlying sqlx error
        #[source]
        source: sqlx::Error,
    },
    /// The recorded schema version could not be read
    #[error("Failed to get schema version: {0}")]
    VersionCheckError(#[source] sqlx::Error),
}

/// One versioned schema change.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Monotonic schema version
    pub version: i64,
    /// Human-readable summary
    pub description: String,
    /// SQL applied in a single transaction
    pub sql: String,
}

/// Applies embedded migrations to a pool.
pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    /// Create a migrator for `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply every migration newer than the recorded schema version.
    ///
    /// Returns the number of migrations applied.
    pub async fn run_embedded_migrations(&self, migrations: Vec<Migration>) -> Result<usize, MigrationError> {
        self.ensure_migrations_table().await?;
        let current_version = self.get_current_version().await?;
        let mut pending: Vec<_> = migrations.into_iter().filter(|m| m.version > current_version).collect();
        pending.sort_by_key(|m| m.version);

        for migration in &pending {
            self.apply_migration(migration).await?;
            tracing::debug!(version = migration.version, description = %migration.description, "applied migration");
        }

        Ok(pending.len())
    }

    async fn ensure_migrations_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                description TEXT
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MigrationError::ExecutionError { version: 0, source: e })?;
        Ok(())
    }

    /// Highest applied version, or 0 for a fresh database.
    pub async fn get_current_version(&self) -> Result<i64, MigrationError> {
        let result: Option<(i64,)> = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
            .fetch_optional(&self.pool)
            .await
            .map_err(MigrationError::VersionCheckError)?;
        Ok(result.map_or(0, |(v,)| v))
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<(), MigrationError> {
        let version = migration.version;
        let wrap = |source| MigrationError::ExecutionError { version, source };

        let mut tx = self.pool.begin().await.map_err(wrap)?;
        sqlx::raw_sql(&migration.sql).execute(&mut *tx).await.map_err(wrap)?;
        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(wrap)?;
        tx.commit().await.map_err(wrap)?;
        Ok(())
    }
}

/// Tables for airspaces, flights, formations and planes.
pub fn initial_schema_migration() -> Migration {
    Migration {
        version: 1,
        description: "Airspaces, flights, formations and planes".to_string(),
        sql: include_str!("../../../migrations/001_initial_schema.sql").to_string(),
    }
}

/// Every migration compiled into the binary, oldest first.
pub fn all_embedded_migrations() -> Vec<Migration> {
    vec![initial_schema_migration()]
}
