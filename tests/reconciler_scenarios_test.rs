//! End-to-end reconciliation scenarios against recording drivers.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use atc::adapters::drivers::{DriverCall, DummyDriver};
use atc::adapters::sqlite::{SqliteFormationRepository, SqlitePlaneRepository};
use atc::domain::errors::{DomainError, DomainResult};
use atc::domain::models::{Cuid, FormationSpec, Plane, PlaneStatus, ReconcilerConfig};
use atc::domain::ports::{PlaneRepository, ProviderDriver};
use atc::services::{FormationReconciler, ReconcileAction};
use uuid::Uuid;

use common::{Harness, HarnessOptions};

#[tokio::test]
async fn test_converged_formation_makes_no_driver_calls() {
    let h = Harness::new().await;
    let formation = h.formation(2).await;
    h.seed_plane(formation.id, "dummy:a", 60).await;
    h.seed_plane(formation.id, "proxmox.lxc:b", 30).await;

    for _ in 0..2 {
        let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();
        assert_eq!(report.action, ReconcileAction::None);
        assert!(report.is_converged());
    }

    assert!(h.dummy.calls().await.is_empty());
    assert!(h.lxc.calls().await.is_empty());
}

#[tokio::test]
async fn test_scale_up_builds_only_the_deficit_on_the_active_driver() {
    let h = Harness::new().await;
    let formation = h.formation(1).await;
    h.seed_plane(formation.id, "dummy:seed", 60).await;

    h.fleet.set_target_count(formation.id, 3).await.unwrap();
    let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();

    assert_eq!(report.action, ReconcileAction::ScaleUp);
    assert_eq!(report.builds_succeeded, 2);
    assert_eq!(h.dummy.build_count().await, 2);
    assert!(h.lxc.calls().await.is_empty());

    let cuids = h.cuids(formation.id).await;
    assert_eq!(cuids.len(), 3);
    assert!(cuids.iter().all(|c| c.starts_with("dummy:")));

    // Second cycle is a no-op.
    h.dummy.clear_calls().await;
    let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();
    assert_eq!(report.action, ReconcileAction::None);
    assert!(h.dummy.calls().await.is_empty());
}

#[tokio::test]
async fn test_scale_down_routes_each_destroy_by_provenance() {
    let h = Harness::new().await;
    let formation = h.formation(3).await;
    h.seed_plane(formation.id, "dummy:oldest", 300).await;
    h.seed_plane(formation.id, "proxmox.lxc:middle", 200).await;
    h.seed_plane(formation.id, "dummy:newest", 100).await;

    h.fleet.set_target_count(formation.id, 1).await.unwrap();
    let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();

    assert_eq!(report.action, ReconcileAction::ScaleDown);
    assert_eq!(report.destroys_succeeded, 2);
    assert_eq!(h.dummy.destroyed().await, vec![Cuid::from_raw("dummy:oldest")]);
    assert_eq!(h.lxc.destroyed().await, vec![Cuid::from_raw("proxmox.lxc:middle")]);
    assert_eq!(h.dummy.build_count().await, 0);
    assert_eq!(h.cuids(formation.id).await, vec!["dummy:newest"]);
}

#[tokio::test]
async fn test_destroy_ignores_active_driver_setting() {
    let h = Harness::new().await;
    let formation = h.formation(0).await;
    h.seed_plane(formation.id, "proxmox.lxc:1", 10).await;
    h.source.set(Some("dummy"));

    h.reconciler.reconcile_formation(formation.id).await.unwrap();

    assert_eq!(h.lxc.destroyed().await, vec![Cuid::from_raw("proxmox.lxc:1")]);
    assert!(h.dummy.calls().await.is_empty());
}

#[tokio::test]
async fn test_partial_build_failure_is_retried_next_cycle() {
    let h = Harness::new().await;
    let formation = h.formation(2).await;
    h.dummy.fail_next_builds(1);

    let first = h.reconciler.reconcile_formation(formation.id).await.unwrap();
    assert_eq!(first.builds_succeeded, 1);
    assert_eq!(first.builds_failed, 1);
    assert_eq!(first.failures.len(), 1);
    assert!(!first.is_converged());
    assert_eq!(h.live(formation.id).await, 1);

    h.dummy.clear_calls().await;
    let second = h.reconciler.reconcile_formation(formation.id).await.unwrap();
    assert_eq!(second.live_before, 1);
    assert_eq!(second.builds_succeeded, 1);
    assert_eq!(h.dummy.build_count().await, 1);
    assert_eq!(h.live(formation.id).await, 2);
}

#[tokio::test]
async fn test_failed_destroy_keeps_record_running() {
    let h = Harness::new().await;
    let formation = h.formation(1).await;
    h.seed_plane(formation.id, "dummy:old", 100).await;
    h.seed_plane(formation.id, "dummy:new", 10).await;
    h.dummy.fail_next_destroys(1);

    let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();
    assert_eq!(report.destroys_failed, 1);
    assert_eq!(h.live(formation.id).await, 2);

    let kept = h.planes.get(&Cuid::from_raw("dummy:old")).await.unwrap().unwrap();
    assert_eq!(kept.status, PlaneStatus::Running);

    let retry = h.reconciler.reconcile_formation(formation.id).await.unwrap();
    assert_eq!(retry.destroys_succeeded, 1);
    assert_eq!(h.cuids(formation.id).await, vec!["dummy:new"]);
}

#[tokio::test]
async fn test_already_gone_instance_counts_as_destroyed() {
    let h = Harness::new().await;
    let formation = h.formation(0).await;
    // Recorded but never adopted by the driver.
    h.planes
        .create(&Plane::built(Cuid::from_raw("dummy:ghost"), formation.id))
        .await
        .unwrap();

    let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();

    assert_eq!(report.destroys_succeeded, 1);
    assert_eq!(report.destroys_failed, 0);
    assert_eq!(h.live(formation.id).await, 0);
}

#[tokio::test]
async fn test_unroutable_plane_is_reported_and_kept() {
    let h = Harness::new().await;
    let formation = h.formation(0).await;
    h.seed_plane(formation.id, "legacy:0", 10).await;
    h.seed_plane(formation.id, "nodelimiter", 5).await;

    let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();

    assert_eq!(report.destroys_failed, 2);
    assert!(report.failures.iter().any(|f| f.contains("legacy")));
    assert!(report.failures.iter().any(|f| f.contains("nodelimiter")));
    assert_eq!(h.live(formation.id).await, 2);
}

#[tokio::test]
async fn test_missing_active_driver_skips_builds_every_cycle() {
    let h = Harness::with_options(HarnessOptions {
        active: None,
        ..HarnessOptions::default()
    })
    .await;
    let formation = h.formation(2).await;

    for _ in 0..2 {
        let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();
        assert_eq!(report.action, ReconcileAction::ScaleUp);
        assert!(report.skip_reason.is_some());
    }
    assert!(h.dummy.calls().await.is_empty());

    h.source.set(Some("no-such-driver"));
    let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();
    assert!(report.skip_reason.unwrap().contains("no-such-driver"));

    h.source.set(Some("dummy"));
    let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();
    assert_eq!(report.builds_succeeded, 2);
}

#[tokio::test]
async fn test_switching_active_driver_between_cycles() {
    let h = Harness::new().await;
    let formation = h.formation(1).await;
    h.reconciler.reconcile_formation(formation.id).await.unwrap();

    h.source.set(Some("proxmoxlxc"));
    h.fleet.set_target_count(formation.id, 2).await.unwrap();
    h.reconciler.reconcile_formation(formation.id).await.unwrap();

    let cuids = h.cuids(formation.id).await;
    assert_eq!(cuids.iter().filter(|c| c.starts_with("dummy:")).count(), 1);
    assert_eq!(cuids.iter().filter(|c| c.starts_with("proxmox.lxc:")).count(), 1);

    h.fleet.set_target_count(formation.id, 0).await.unwrap();
    h.reconciler.reconcile_formation(formation.id).await.unwrap();

    assert_eq!(h.dummy.destroyed().await.len(), 1);
    assert_eq!(h.lxc.destroyed().await.len(), 1);
    assert_eq!(h.live(formation.id).await, 0);
}

#[tokio::test]
async fn test_concurrent_cycle_for_same_formation_is_skipped() {
    let h = Harness::with_options(HarnessOptions {
        dummy: DummyDriver::new().with_latency(Duration::from_millis(100)),
        ..HarnessOptions::default()
    })
    .await;
    let formation = h.formation(2).await;

    let (a, b) = tokio::join!(
        h.reconciler.reconcile_formation(formation.id),
        h.reconciler.reconcile_formation(formation.id)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let skipped = [&a, &b]
        .iter()
        .filter(|r| r.action == ReconcileAction::Skipped)
        .count();
    assert_eq!(skipped, 1);
    assert_eq!(a.builds_succeeded + b.builds_succeeded, 2);
    assert_eq!(h.dummy.build_count().await, 2);
}

#[tokio::test]
async fn test_different_formations_reconcile_in_one_pass() {
    let h = Harness::new().await;
    let first = h.formation(1).await;
    let second = h.formation(2).await;

    let pass = h.reconciler.reconcile_all().await.unwrap();

    assert!(pass.is_clean());
    assert_eq!(pass.reports.len(), 2);
    assert_eq!(h.live(first.id).await, 1);
    assert_eq!(h.live(second.id).await, 2);
}

#[tokio::test]
async fn test_stop_lets_in_flight_builds_finish() {
    let h = Harness::with_options(HarnessOptions {
        max_parallel_operations: 1,
        dummy: DummyDriver::new().with_latency(Duration::from_millis(300)),
        ..HarnessOptions::default()
    })
    .await;
    let formation = h.formation(3).await;

    let reconciler = h.reconciler.clone();
    let id = formation.id;
    let cycle = tokio::spawn(async move { reconciler.reconcile_formation(id).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    h.reconciler.stop();
    let report = cycle.await.unwrap().unwrap();

    assert!(report.cancelled);
    assert_eq!(report.builds_succeeded, 1);
    assert_eq!(h.dummy.build_count().await, 1);
    assert_eq!(h.live(formation.id).await, 1);
}

/// Driver that tracks how many builds run at once.
struct GaugeDriver {
    current: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ProviderDriver for GaugeDriver {
    fn yaml_tag(&self) -> &str {
        "gauge"
    }

    fn cuid_prefix(&self) -> &str {
        "gauge"
    }

    async fn build(&self, _spec: &FormationSpec) -> DomainResult<Cuid> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(Cuid::new("gauge", Uuid::new_v4().to_string()))
    }

    async fn destroy(&self, _cuid: &Cuid) -> DomainResult<()> {
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_builds_are_bounded_by_worker_count() {
    let gauge = Arc::new(GaugeDriver {
        current: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let h = Harness::with_options(HarnessOptions {
        active: Some("gauge"),
        max_parallel_operations: 2,
        extra_drivers: vec![gauge.clone() as Arc<dyn ProviderDriver>],
        ..HarnessOptions::default()
    })
    .await;
    let formation = h.formation(6).await;

    let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();

    assert_eq!(report.builds_succeeded, 6);
    assert!(gauge.peak.load(Ordering::SeqCst) <= 2);
    assert!(gauge.peak.load(Ordering::SeqCst) >= 1);
}

/// Plane store whose inserts always fail.
struct BrokenInserts {
    inner: SqlitePlaneRepository,
}

#[async_trait]
impl PlaneRepository for BrokenInserts {
    async fn create(&self, _plane: &Plane) -> DomainResult<()> {
        Err(DomainError::DatabaseError("disk I/O error".to_string()))
    }

    async fn get(&self, cuid: &Cuid) -> DomainResult<Option<Plane>> {
        self.inner.get(cuid).await
    }

    async fn list(&self) -> DomainResult<Vec<Plane>> {
        self.inner.list().await
    }

    async fn list_by_formation(&self, formation_id: Uuid) -> DomainResult<Vec<Plane>> {
        self.inner.list_by_formation(formation_id).await
    }

    async fn count_by_formation(&self, formation_id: Uuid) -> DomainResult<u64> {
        self.inner.count_by_formation(formation_id).await
    }

    async fn update_status(&self, cuid: &Cuid, status: PlaneStatus) -> DomainResult<()> {
        self.inner.update_status(cuid, status).await
    }

    async fn delete(&self, cuid: &Cuid) -> DomainResult<()> {
        self.inner.delete(cuid).await
    }
}

fn reconciler_with_broken_inserts(h: &Harness, max_parallel_operations: usize) -> FormationReconciler {
    FormationReconciler::new(
        Arc::new(SqliteFormationRepository::new(h.pool.clone())),
        Arc::new(BrokenInserts {
            inner: SqlitePlaneRepository::new(h.pool.clone()),
        }),
        h.selector.clone(),
        &ReconcilerConfig {
            max_parallel_operations,
            ..ReconcilerConfig::default()
        },
    )
}

#[tokio::test]
async fn test_unrecorded_build_stops_cycle_and_is_torn_down() {
    let h = Harness::new().await;
    let formation = h.formation(10).await;
    let reconciler = reconciler_with_broken_inserts(&h, 1);

    let first = reconciler.reconcile_formation(formation.id).await;

    assert!(matches!(first, Err(DomainError::DatabaseError(_))));
    assert_eq!(h.dummy.build_count().await, 1);
    assert_eq!(h.dummy.destroyed().await.len(), 1);
    assert_eq!(h.dummy.live_count().await, 0);
    assert_eq!(h.live(formation.id).await, 0);

    // The next cycle fails the same way without piling up instances.
    let second = reconciler.reconcile_formation(formation.id).await;

    assert!(second.is_err());
    assert_eq!(h.dummy.build_count().await, 2);
    assert_eq!(h.dummy.live_count().await, 0);
}

#[tokio::test]
async fn test_unrecorded_parallel_builds_are_all_torn_down() {
    let h = Harness::new().await;
    let formation = h.formation(10).await;
    let reconciler = reconciler_with_broken_inserts(&h, 4);

    let result = reconciler.reconcile_formation(formation.id).await;

    assert!(matches!(result, Err(DomainError::DatabaseError(_))));
    let builds = h
        .dummy
        .calls()
        .await
        .into_iter()
        .filter(|c| matches!(c, DriverCall::Build { .. }))
        .count();
    assert!((1..=4).contains(&builds));
    assert_eq!(h.dummy.destroyed().await.len(), builds);
    assert_eq!(h.dummy.live_count().await, 0);
    assert_eq!(h.live(formation.id).await, 0);
}

/// Driver that hands back identifiers under someone else's prefix.
struct StrayDriver;

#[async_trait]
impl ProviderDriver for StrayDriver {
    fn yaml_tag(&self) -> &str {
        "stray"
    }

    fn cuid_prefix(&self) -> &str {
        "stray"
    }

    async fn build(&self, _spec: &FormationSpec) -> DomainResult<Cuid> {
        Ok(Cuid::from_raw("other:x"))
    }

    async fn destroy(&self, _cuid: &Cuid) -> DomainResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_build_with_foreign_prefix_is_not_recorded() {
    let h = Harness::with_options(HarnessOptions {
        active: Some("stray"),
        extra_drivers: vec![Arc::new(StrayDriver) as Arc<dyn ProviderDriver>],
        ..HarnessOptions::default()
    })
    .await;
    let formation = h.formation(1).await;

    let report = h.reconciler.reconcile_formation(formation.id).await.unwrap();

    assert_eq!(report.builds_succeeded, 0);
    assert_eq!(report.builds_failed, 1);
    assert!(report.failures.iter().any(|f| f.contains("other:x")));
    assert_eq!(h.live(formation.id).await, 0);
    assert!(h.planes.get(&Cuid::from_raw("other:x")).await.unwrap().is_none());
}
