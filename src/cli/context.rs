//! Shared wiring for CLI commands: configuration, database and services.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::adapters::drivers::DriverRegistry;
use crate::adapters::sqlite::{
    initialize_from_config, SqliteAirspaceRepository, SqliteFlightRepository,
    SqliteFormationRepository, SqlitePlaneRepository,
};
use crate::domain::models::Config;
use crate::infrastructure::config::{ConfigLoader, FigmentDriverSource};
use crate::services::{DriverSelector, FleetService, FormationReconciler};

/// Configuration shared by every command.
pub struct AppContext {
    /// Validated configuration
    pub config: Config,
    /// File the configuration was loaded from; re-read for the active driver
    pub config_path: PathBuf,
}

impl AppContext {
    /// Load and validate configuration from `config_path`, or the default path.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = ConfigLoader::resolve_path(config_path);
        let config = ConfigLoader::load_from(&config_path)?;
        Ok(Self {
            config,
            config_path,
        })
    }

    /// Open the configured database and apply pending migrations.
    pub async fn open_database(&self) -> Result<SqlitePool> {
        initialize_from_config(&self.config.database)
            .await
            .with_context(|| format!("Failed to open database at {}", self.config.database.path))
    }

    /// Registry holding every built-in driver.
    pub fn registry() -> Result<Arc<DriverRegistry>> {
        Ok(Arc::new(
            DriverRegistry::builtin().context("Failed to assemble driver registry")?,
        ))
    }

    /// Selector reading the active driver from this context's config file.
    pub fn selector(&self) -> Result<Arc<DriverSelector>> {
        let source = Arc::new(FigmentDriverSource::new(&self.config_path));
        Ok(Arc::new(DriverSelector::new(Self::registry()?, source)))
    }

    /// Fleet service over SQLite repositories.
    pub fn fleet_service(pool: &SqlitePool) -> FleetService {
        FleetService::new(
            Arc::new(SqliteAirspaceRepository::new(pool.clone())),
            Arc::new(SqliteFlightRepository::new(pool.clone())),
            Arc::new(SqliteFormationRepository::new(pool.clone())),
            Arc::new(SqlitePlaneRepository::new(pool.clone())),
        )
    }

    /// Reconciler over SQLite repositories that stops when `stop_flag` is set.
    pub fn reconciler(
        &self,
        pool: &SqlitePool,
        stop_flag: Arc<AtomicBool>,
    ) -> Result<Arc<FormationReconciler>> {
        Ok(Arc::new(
            FormationReconciler::new(
                Arc::new(SqliteFormationRepository::new(pool.clone())),
                Arc::new(SqlitePlaneRepository::new(pool.clone())),
                self.selector()?,
                &self.config.reconciler,
            )
            .with_stop_flag(stop_flag),
        ))
    }
}
