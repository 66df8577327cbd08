//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use atc::adapters::drivers::{DriverRegistry, DummyDriver, PROXMOX_LXC_CUID_PREFIX, PROXMOX_LXC_YAML_TAG};
use atc::adapters::sqlite::{
    create_migrated_test_pool, SqliteAirspaceRepository, SqliteFlightRepository,
    SqliteFormationRepository, SqlitePlaneRepository,
};
use atc::domain::models::{Cuid, Formation, NewFormation, Plane, ReconcilerConfig};
use atc::domain::ports::{PlaneRepository, ProviderDriver};
use atc::infrastructure::config::StaticDriverSource;
use atc::services::{DriverSelector, FleetService, FormationReconciler};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Options for building a [`Harness`].
pub struct HarnessOptions {
    pub active: Option<&'static str>,
    pub max_parallel_operations: usize,
    pub extra_drivers: Vec<Arc<dyn ProviderDriver>>,
    pub dummy: DummyDriver,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            active: Some("dummy"),
            max_parallel_operations: 4,
            extra_drivers: Vec::new(),
            dummy: DummyDriver::new(),
        }
    }
}

/// A reconciler over an in-memory database with two recording drivers:
/// `dummy` and a stand-in answering to the `proxmoxlxc` identity.
pub struct Harness {
    pub pool: SqlitePool,
    pub fleet: FleetService,
    pub planes: Arc<SqlitePlaneRepository>,
    pub dummy: Arc<DummyDriver>,
    pub lxc: Arc<DummyDriver>,
    pub source: Arc<StaticDriverSource>,
    pub selector: Arc<DriverSelector>,
    pub reconciler: Arc<FormationReconciler>,
    pub stop_flag: Arc<AtomicBool>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_options(HarnessOptions::default()).await
    }

    pub async fn with_options(options: HarnessOptions) -> Self {
        let pool = create_migrated_test_pool()
            .await
            .expect("Failed to create test database");

        let dummy = Arc::new(options.dummy);
        let lxc = Arc::new(DummyDriver::named(PROXMOX_LXC_YAML_TAG, PROXMOX_LXC_CUID_PREFIX));
        let mut drivers: Vec<Arc<dyn ProviderDriver>> = vec![
            dummy.clone() as Arc<dyn ProviderDriver>,
            lxc.clone() as Arc<dyn ProviderDriver>,
        ];
        drivers.extend(options.extra_drivers);
        let registry = Arc::new(DriverRegistry::new(drivers).expect("Failed to build registry"));

        let source = Arc::new(StaticDriverSource::new(options.active));
        let selector = Arc::new(DriverSelector::new(registry, source.clone()));

        let planes = Arc::new(SqlitePlaneRepository::new(pool.clone()));
        let stop_flag = Arc::new(AtomicBool::new(false));
        let config = ReconcilerConfig {
            max_parallel_operations: options.max_parallel_operations,
            ..ReconcilerConfig::default()
        };
        let reconciler = Arc::new(
            FormationReconciler::new(
                Arc::new(SqliteFormationRepository::new(pool.clone())),
                planes.clone(),
                selector.clone(),
                &config,
            )
            .with_stop_flag(stop_flag.clone()),
        );

        let fleet = FleetService::new(
            Arc::new(SqliteAirspaceRepository::new(pool.clone())),
            Arc::new(SqliteFlightRepository::new(pool.clone())),
            Arc::new(SqliteFormationRepository::new(pool.clone())),
            planes.clone(),
        );

        Self {
            pool,
            fleet,
            planes,
            dummy,
            lxc,
            source,
            selector,
            reconciler,
            stop_flag,
        }
    }

    /// Create an airspace, flight and formation with the given target.
    pub async fn formation(&self, target_count: u32) -> Formation {
        let airspace = self
            .fleet
            .create_airspace("Production", "prod")
            .await
            .expect("Failed to create airspace");
        let flight = self
            .fleet
            .create_flight(airspace.id, "frontend")
            .await
            .expect("Failed to create flight");
        self.fleet
            .create_formation(NewFormation {
                flight_id: flight.id,
                name: "web".to_string(),
                cpu: 2,
                ram: 2048,
                disk: 20,
                base_name: "web".to_string(),
                domain: "prod.internal".to_string(),
                target_count,
            })
            .await
            .expect("Failed to create formation")
    }

    /// Record a plane as if it had been built `age_secs` ago, and make the
    /// matching recording driver aware of it.
    pub async fn seed_plane(&self, formation_id: Uuid, cuid: &str, age_secs: i64) -> Plane {
        let cuid = Cuid::from_raw(cuid);
        let mut plane = Plane::built(cuid.clone(), formation_id);
        plane.created_at = Utc::now() - Duration::seconds(age_secs);
        plane.updated_at = plane.created_at;
        self.planes.create(&plane).await.expect("Failed to seed plane");

        match cuid.prefix() {
            Ok("dummy") => self.dummy.adopt(&cuid).await,
            Ok(PROXMOX_LXC_CUID_PREFIX) => self.lxc.adopt(&cuid).await,
            _ => {}
        }
        plane
    }

    pub async fn live(&self, formation_id: Uuid) -> u64 {
        self.planes
            .count_by_formation(formation_id)
            .await
            .expect("Failed to count planes")
    }

    pub async fn cuids(&self, formation_id: Uuid) -> Vec<String> {
        self.planes
            .list_by_formation(formation_id)
            .await
            .expect("Failed to list planes")
            .into_iter()
            .map(|p| p.cuid.to_string())
            .collect()
    }
}
