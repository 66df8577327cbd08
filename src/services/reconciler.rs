//! Formation reconciliation.
//!
//! A cycle compares a Formation's target count with its persisted Plane
//! records and issues builds or destroys to close the gap. Plane records are
//! the only view of what exists; drivers are never enumerated.
//!
//! Each Formation has two locks. The cycle lock is held for a whole cycle and
//! is only ever try-locked, so a second request for a busy Formation is
//! skipped rather than queued. The intent lock guards reading and writing the
//! Plane records and is released while driver calls are in flight.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use serde::Serialize;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Cuid, Formation, FormationSpec, Plane, PlaneStatus, ReconcilerConfig};
use crate::domain::ports::{FormationRepository, PlaneRepository, ProviderDriver};
use crate::services::driver_selector::DriverSelector;

/// What a cycle has to do, derived only from the target and current records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilePlan {
    /// Live count already equals the target
    Noop,
    /// Build this many instances
    ScaleUp {
        /// Number of builds to issue
        count: usize,
    },
    /// Destroy these instances, in order
    ScaleDown {
        /// Planes picked for destruction
        victims: Vec<Cuid>,
    },
}

/// Diff a Formation's target against its Plane records.
///
/// Scale-down victims are chosen in a fixed order: planes already marked
/// `destroying` first, then oldest by creation time, ties broken by CUID.
pub fn plan_reconciliation(target: u32, planes: &[Plane]) -> ReconcilePlan {
    let live = planes.len();
    let target = usize::try_from(target).unwrap_or(usize::MAX);

    match live.cmp(&target) {
        CmpOrdering::Equal => ReconcilePlan::Noop,
        CmpOrdering::Less => ReconcilePlan::ScaleUp {
            count: target - live,
        },
        CmpOrdering::Greater => {
            let mut ordered: Vec<&Plane> = planes.iter().collect();
            ordered.sort_by(|a, b| destroy_order(a, b));
            ReconcilePlan::ScaleDown {
                victims: ordered
                    .into_iter()
                    .take(live - target)
                    .map(|p| p.cuid.clone())
                    .collect(),
            }
        }
    }
}

fn destroy_order(a: &Plane, b: &Plane) -> CmpOrdering {
    let rank = |p: &Plane| u8::from(p.status != PlaneStatus::Destroying);
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.cuid.cmp(&b.cuid))
}

/// What a cycle did, as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// Nothing to do
    None,
    /// Builds were attempted
    ScaleUp,
    /// Destroys were attempted
    ScaleDown,
    /// The cycle did not run; see `skip_reason`
    Skipped,
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::ScaleUp => "scale_up",
            Self::ScaleDown => "scale_down",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Outcome of one reconciliation cycle for one Formation.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// Formation the cycle ran for
    pub formation_id: Uuid,
    /// Plane records when the cycle started
    pub live_before: usize,
    /// Target count the cycle worked toward
    pub target: u32,
    /// What the cycle did
    pub action: ReconcileAction,
    /// Builds that were recorded
    pub builds_succeeded: usize,
    /// Builds the driver failed or answered with a foreign CUID
    pub builds_failed: usize,
    /// Destroys whose record was removed
    pub destroys_succeeded: usize,
    /// Destroys that failed or could not be routed
    pub destroys_failed: usize,
    /// Per-instance failure messages
    pub failures: Vec<String>,
    /// Why the cycle or its build phase did nothing
    pub skip_reason: Option<String>,
    /// Stop was requested before every planned operation started
    pub cancelled: bool,
}

impl ReconcileReport {
    fn new(formation_id: Uuid) -> Self {
        Self {
            formation_id,
            live_before: 0,
            target: 0,
            action: ReconcileAction::None,
            builds_succeeded: 0,
            builds_failed: 0,
            destroys_succeeded: 0,
            destroys_failed: 0,
            failures: Vec::new(),
            skip_reason: None,
            cancelled: false,
        }
    }

    fn skipped(formation_id: Uuid, reason: &str) -> Self {
        Self {
            action: ReconcileAction::Skipped,
            skip_reason: Some(reason.to_string()),
            ..Self::new(formation_id)
        }
    }

    /// Plane records left after the cycle's successful operations.
    pub const fn live_after(&self) -> usize {
        (self.live_before + self.builds_succeeded).saturating_sub(self.destroys_succeeded)
    }

    /// Whether the cycle ran and left the Formation at its target.
    pub fn is_converged(&self) -> bool {
        self.action != ReconcileAction::Skipped
            && usize::try_from(self.target).is_ok_and(|t| t == self.live_after())
    }
}

/// A Formation whose cycle ended in an error during a full pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassError {
    /// Formation whose cycle failed
    pub formation_id: Uuid,
    /// Error text
    pub message: String,
}

/// Results of reconciling every Formation once.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    /// Cycles that completed, skipped ones included
    pub reports: Vec<ReconcileReport>,
    /// Cycles that ended in an error
    pub errors: Vec<PassError>,
}

impl PassReport {
    /// No cycle ended in an error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Successful builds across the pass.
    pub fn builds(&self) -> usize {
        self.reports.iter().map(|r| r.builds_succeeded).sum()
    }

    /// Successful destroys across the pass.
    pub fn destroys(&self) -> usize {
        self.reports.iter().map(|r| r.destroys_succeeded).sum()
    }
}

enum Outcome {
    Built,
    BuildFailed(String),
    Destroyed,
    DestroyFailed(Cuid, String),
    PersistFailed(DomainError),
}

#[derive(Clone, Default)]
struct FormationLocks {
    cycle: Arc<Mutex<()>>,
    intent: Arc<Mutex<()>>,
}

/// State shared by the operations of one cycle.
#[derive(Clone)]
struct Cycle {
    intent: Arc<Mutex<()>>,
    /// Set once a record could not be written; no further operation starts.
    aborted: Arc<AtomicBool>,
}

impl Cycle {
    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }
}

/// Drives Formations toward their target counts.
pub struct FormationReconciler {
    formations: Arc<dyn FormationRepository>,
    planes: Arc<dyn PlaneRepository>,
    selector: Arc<DriverSelector>,
    max_parallel: usize,
    locks: StdMutex<HashMap<Uuid, FormationLocks>>,
    stop_flag: Arc<AtomicBool>,
}

impl FormationReconciler {
    /// Create a reconciler with its own stop flag.
    pub fn new(
        formations: Arc<dyn FormationRepository>,
        planes: Arc<dyn PlaneRepository>,
        selector: Arc<DriverSelector>,
        config: &ReconcilerConfig,
    ) -> Self {
        Self {
            formations,
            planes,
            selector,
            max_parallel: config.max_parallel_operations.max(1),
            locks: StdMutex::new(HashMap::new()),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a stop flag with an owner such as the daemon.
    #[must_use]
    pub fn with_stop_flag(mut self, stop_flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = stop_flag;
        self
    }

    /// Stop starting new operations. In-flight ones still finish and are
    /// recorded.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// Whether stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    fn locks_for(&self, formation_id: Uuid) -> FormationLocks {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(formation_id)
            .or_default()
            .clone()
    }

    fn forget_locks(&self, formation_id: Uuid) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&formation_id);
    }

    /// Drop lock entries for Formations that no longer exist. Entries still
    /// referenced by a running cycle are kept.
    fn prune_locks(&self, formations: &[Formation]) {
        let live: HashSet<Uuid> = formations.iter().map(|f| f.id).collect();
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, locks| live.contains(id) || Arc::strong_count(&locks.cycle) > 1);
    }

    /// Run one cycle for a Formation.
    ///
    /// Driver failures are reported per instance and never fail the cycle.
    /// The first persistence failure stops new operations from starting and
    /// fails the cycle once every in-flight operation has been joined.
    pub async fn reconcile_formation(&self, formation_id: Uuid) -> DomainResult<ReconcileReport> {
        let locks = self.locks_for(formation_id);
        let Ok(_cycle) = locks.cycle.clone().try_lock_owned() else {
            debug!(formation_id = %formation_id, "cycle already running, skipping");
            return Ok(ReconcileReport::skipped(formation_id, "cycle already running"));
        };

        if self.is_stopped() {
            let mut report = ReconcileReport::skipped(formation_id, "reconciler stopped");
            report.cancelled = true;
            return Ok(report);
        }

        let mut report = ReconcileReport::new(formation_id);
        let (formation, plan) = {
            let _intent = locks.intent.lock().await;
            let Some(formation) = self.formations.get(formation_id).await? else {
                self.forget_locks(formation_id);
                return Err(DomainError::FormationNotFound(formation_id));
            };
            let planes = self.planes.list_by_formation(formation_id).await?;
            report.live_before = planes.len();
            report.target = formation.target_count;
            let plan = plan_reconciliation(formation.target_count, &planes);
            (formation, plan)
        };

        let cycle = Cycle {
            intent: locks.intent.clone(),
            aborted: Arc::new(AtomicBool::new(false)),
        };
        let result = match plan {
            ReconcilePlan::Noop => Ok(()),
            ReconcilePlan::ScaleUp { count } => {
                report.action = ReconcileAction::ScaleUp;
                self.scale_up(&formation, count, &cycle, &mut report).await
            }
            ReconcilePlan::ScaleDown { victims } => {
                report.action = ReconcileAction::ScaleDown;
                self.scale_down(victims, &cycle, &mut report).await
            }
        };

        log_report(&report);
        result.map(|()| report)
    }

    async fn scale_up(
        &self,
        formation: &Formation,
        count: usize,
        cycle: &Cycle,
        report: &mut ReconcileReport,
    ) -> DomainResult<()> {
        let driver = match self.selector.active_build_driver() {
            Ok(driver) => driver,
            Err(e) => {
                warn!(
                    formation_id = %formation.id,
                    deficit = count,
                    error = %e,
                    "build phase skipped"
                );
                report.skip_reason = Some(e.to_string());
                return Ok(());
            }
        };

        let spec = formation.spec();
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut handles = Vec::with_capacity(count);

        for _ in 0..count {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            if self.is_stopped() || cycle.is_aborted() {
                break;
            }

            let driver = driver.clone();
            let spec = spec.clone();
            let planes = self.planes.clone();
            let cycle = cycle.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                build_one(driver, spec, planes, cycle).await
            }));
        }

        report.cancelled = handles.len() < count;
        collect(handles, report).await
    }

    async fn scale_down(
        &self,
        victims: Vec<Cuid>,
        cycle: &Cycle,
        report: &mut ReconcileReport,
    ) -> DomainResult<()> {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let total = victims.len();
        let mut handles = Vec::with_capacity(total);

        for cuid in victims {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            if self.is_stopped() || cycle.is_aborted() {
                break;
            }

            let selector = self.selector.clone();
            let planes = self.planes.clone();
            let cycle = cycle.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                destroy_one(selector, cuid, planes, cycle).await
            }));
        }

        report.cancelled = handles.len() < total;
        collect(handles, report).await
    }

    /// Reconcile every Formation once, concurrently.
    ///
    /// A Formation deleted mid-pass is ignored. Other per-Formation errors
    /// are collected into the pass report; only failing to list Formations
    /// fails the pass itself.
    pub async fn reconcile_all(self: &Arc<Self>) -> DomainResult<PassReport> {
        let formations = self.formations.list().await?;
        self.prune_locks(&formations);
        let mut handles = Vec::with_capacity(formations.len());

        for formation in formations {
            if self.is_stopped() {
                break;
            }
            let this = Arc::clone(self);
            let id = formation.id;
            handles.push((id, tokio::spawn(async move { this.reconcile_formation(id).await })));
        }

        let mut pass = PassReport::default();
        for (formation_id, handle) in handles {
            match handle.await {
                Ok(Ok(report)) => pass.reports.push(report),
                Ok(Err(DomainError::FormationNotFound(_))) => {
                    debug!(formation_id = %formation_id, "formation removed during pass");
                }
                Ok(Err(e)) => {
                    error!(formation_id = %formation_id, error = %e, "reconcile cycle aborted");
                    pass.errors.push(PassError {
                        formation_id,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(formation_id = %formation_id, error = %e, "reconcile task failed");
                    pass.errors.push(PassError {
                        formation_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(pass)
    }
}

async fn build_one(
    driver: Arc<dyn ProviderDriver>,
    spec: FormationSpec,
    planes: Arc<dyn PlaneRepository>,
    cycle: Cycle,
) -> Outcome {
    let cuid = match driver.build(&spec).await {
        Ok(cuid) => cuid,
        Err(e) => {
            warn!(
                formation_id = %spec.formation_id,
                driver = driver.yaml_tag(),
                error = %e,
                "build failed"
            );
            return Outcome::BuildFailed(e.to_string());
        }
    };

    if cuid.prefix().ok() != Some(driver.cuid_prefix()) {
        error!(
            cuid = %cuid,
            driver = driver.yaml_tag(),
            "driver returned an identifier outside its prefix; instance not recorded"
        );
        return Outcome::BuildFailed(format!(
            "{cuid} does not carry prefix '{}'",
            driver.cuid_prefix()
        ));
    }

    let plane = Plane::built(cuid, spec.formation_id);
    let recorded = {
        let _intent = cycle.intent.lock().await;
        planes.create(&plane).await
    };

    match recorded {
        Ok(()) => {
            info!(
                formation_id = %spec.formation_id,
                cuid = %plane.cuid,
                driver = driver.yaml_tag(),
                "plane built"
            );
            Outcome::Built
        }
        Err(e) => {
            cycle.abort();
            error!(cuid = %plane.cuid, error = %e, "built instance could not be recorded, tearing it down");
            // An instance with no record would never be counted or destroyed.
            match driver.destroy(&plane.cuid).await {
                Ok(()) | Err(DomainError::InstanceNotFound(_)) => {
                    info!(cuid = %plane.cuid, "unrecorded instance destroyed");
                }
                Err(destroy_err) => {
                    error!(
                        cuid = %plane.cuid,
                        driver = driver.yaml_tag(),
                        error = %destroy_err,
                        "unrecorded instance could not be destroyed and is now untracked"
                    );
                }
            }
            Outcome::PersistFailed(e)
        }
    }
}

async fn destroy_one(
    selector: Arc<DriverSelector>,
    cuid: Cuid,
    planes: Arc<dyn PlaneRepository>,
    cycle: Cycle,
) -> Outcome {
    let driver = match selector.destroy_driver(&cuid) {
        Ok(driver) => driver,
        Err(e) => {
            warn!(cuid = %cuid, error = %e, "no driver for plane, record kept");
            return Outcome::DestroyFailed(cuid, e.to_string());
        }
    };

    {
        let _intent = cycle.intent.lock().await;
        if let Err(e) = planes.update_status(&cuid, PlaneStatus::Destroying).await {
            cycle.abort();
            return Outcome::PersistFailed(e);
        }
    }

    let result = driver.destroy(&cuid).await;

    let _intent = cycle.intent.lock().await;
    match result {
        Ok(()) | Err(DomainError::InstanceNotFound(_)) => {
            if let Err(e) = planes.delete(&cuid).await {
                cycle.abort();
                error!(cuid = %cuid, error = %e, "destroyed instance could not be forgotten");
                return Outcome::PersistFailed(e);
            }
            info!(cuid = %cuid, driver = driver.yaml_tag(), "plane destroyed");
            Outcome::Destroyed
        }
        Err(e) => {
            warn!(cuid = %cuid, driver = driver.yaml_tag(), error = %e, "destroy failed, record kept");
            if let Err(persist) = planes.update_status(&cuid, PlaneStatus::Running).await {
                cycle.abort();
                return Outcome::PersistFailed(persist);
            }
            Outcome::DestroyFailed(cuid, e.to_string())
        }
    }
}

async fn collect(handles: Vec<JoinHandle<Outcome>>, report: &mut ReconcileReport) -> DomainResult<()> {
    let mut persistence_error = None;

    for handle in handles {
        match handle.await {
            Ok(Outcome::Built) => report.builds_succeeded += 1,
            Ok(Outcome::BuildFailed(message)) => {
                report.builds_failed += 1;
                report.failures.push(message);
            }
            Ok(Outcome::Destroyed) => report.destroys_succeeded += 1,
            Ok(Outcome::DestroyFailed(cuid, message)) => {
                report.destroys_failed += 1;
                report.failures.push(format!("{cuid}: {message}"));
            }
            Ok(Outcome::PersistFailed(e)) => {
                report.failures.push(e.to_string());
                if persistence_error.is_none() {
                    persistence_error = Some(e);
                }
            }
            Err(e) => report.failures.push(format!("operation task failed: {e}")),
        }
    }

    persistence_error.map_or(Ok(()), Err)
}

fn log_report(report: &ReconcileReport) {
    if report.action == ReconcileAction::None {
        debug!(
            formation_id = %report.formation_id,
            live = report.live_before,
            "formation converged"
        );
        return;
    }

    info!(
        formation_id = %report.formation_id,
        action = %report.action,
        live_before = report.live_before,
        target = report.target,
        builds_succeeded = report.builds_succeeded,
        builds_failed = report.builds_failed,
        destroys_succeeded = report.destroys_succeeded,
        destroys_failed = report.destroys_failed,
        cancelled = report.cancelled,
        skip_reason = report.skip_reason.as_deref().unwrap_or(""),
        "reconcile cycle finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::drivers::{DriverRegistry, DummyDriver};
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteAirspaceRepository, SqliteFlightRepository,
        SqliteFormationRepository, SqlitePlaneRepository,
    };
    use crate::domain::models::{Airspace, Flight, NewFormation};
    use crate::domain::ports::{AirspaceRepository, FlightRepository};
    use crate::infrastructure::config::StaticDriverSource;
    use chrono::{Duration, Utc};

    fn plane(cuid: &str, age_secs: i64, status: PlaneStatus) -> Plane {
        let mut plane = Plane::built(Cuid::from_raw(cuid), Uuid::nil());
        plane.created_at = Utc::now() - Duration::seconds(age_secs);
        plane.status = status;
        plane
    }

    #[test]
    fn test_plan_equal_is_noop() {
        let planes = vec![plane("dummy:a", 10, PlaneStatus::Running)];
        assert_eq!(plan_reconciliation(1, &planes), ReconcilePlan::Noop);
        assert_eq!(plan_reconciliation(0, &[]), ReconcilePlan::Noop);
    }

    #[test]
    fn test_plan_scale_up_counts_deficit() {
        let planes = vec![plane("dummy:a", 10, PlaneStatus::Running)];
        assert_eq!(
            plan_reconciliation(3, &planes),
            ReconcilePlan::ScaleUp { count: 2 }
        );
    }

    #[test]
    fn test_plan_scale_down_prefers_destroying_then_oldest() {
        let planes = vec![
            plane("dummy:new", 5, PlaneStatus::Running),
            plane("proxmox.lxc:old", 500, PlaneStatus::Running),
            plane("dummy:stuck", 1, PlaneStatus::Destroying),
            plane("dummy:mid", 50, PlaneStatus::Running),
        ];

        let ReconcilePlan::ScaleDown { victims } = plan_reconciliation(1, &planes) else {
            panic!("expected scale down");
        };
        let victims: Vec<&str> = victims.iter().map(Cuid::as_str).collect();
        assert_eq!(victims, vec!["dummy:stuck", "proxmox.lxc:old", "dummy:mid"]);
    }

    #[test]
    fn test_plan_scale_down_ties_break_on_cuid() {
        let now = Utc::now();
        let mut a = plane("dummy:b", 0, PlaneStatus::Running);
        let mut b = plane("dummy:a", 0, PlaneStatus::Running);
        a.created_at = now;
        b.created_at = now;

        assert_eq!(
            plan_reconciliation(1, &[a, b]),
            ReconcilePlan::ScaleDown {
                victims: vec![Cuid::from_raw("dummy:a")]
            }
        );
    }

    struct Fixture {
        reconciler: Arc<FormationReconciler>,
        dummy: Arc<DummyDriver>,
        source: Arc<StaticDriverSource>,
        planes: Arc<SqlitePlaneRepository>,
        formation_id: Uuid,
    }

    async fn fixture(target_count: u32) -> Fixture {
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

        let formation = Formation::new(NewFormation {
            flight_id: flight.id,
            name: "web".to_string(),
            cpu: 1,
            ram: 512,
            disk: 8,
            base_name: "web".to_string(),
            domain: "prod.internal".to_string(),
            target_count,
        });
        let formations = Arc::new(SqliteFormationRepository::new(pool.clone()));
        formations.create(&formation).await.unwrap();

        let dummy = Arc::new(DummyDriver::new());
        let registry = DriverRegistry::new(vec![dummy.clone() as Arc<dyn ProviderDriver>]).unwrap();
        let source = Arc::new(StaticDriverSource::new(Some("dummy")));
        let selector = Arc::new(DriverSelector::new(Arc::new(registry), source.clone()));
        let planes = Arc::new(SqlitePlaneRepository::new(pool));

        let reconciler = Arc::new(FormationReconciler::new(
            formations,
            planes.clone(),
            selector,
            &ReconcilerConfig::default(),
        ));

        Fixture {
            reconciler,
            dummy,
            source,
            planes,
            formation_id: formation.id,
        }
    }

    #[tokio::test]
    async fn test_scale_up_from_zero() {
        let fx = fixture(3).await;

        let report = fx.reconciler.reconcile_formation(fx.formation_id).await.unwrap();

        assert_eq!(report.action, ReconcileAction::ScaleUp);
        assert_eq!(report.builds_succeeded, 3);
        assert!(report.is_converged());
        assert_eq!(fx.dummy.build_count().await, 3);
        assert_eq!(fx.planes.count_by_formation(fx.formation_id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_missing_config_skips_build_phase() {
        let fx = fixture(2).await;
        fx.source.set(None);

        let report = fx.reconciler.reconcile_formation(fx.formation_id).await.unwrap();

        assert_eq!(report.action, ReconcileAction::ScaleUp);
        assert!(report.skip_reason.is_some());
        assert!(!report.is_converged());
        assert_eq!(fx.dummy.build_count().await, 0);
    }

    #[tokio::test]
    async fn test_busy_formation_is_skipped() {
        let fx = fixture(2).await;
        let locks = fx.reconciler.locks_for(fx.formation_id);
        let _held = locks.cycle.lock().await;

        let report = fx.reconciler.reconcile_formation(fx.formation_id).await.unwrap();

        assert_eq!(report.action, ReconcileAction::Skipped);
        assert_eq!(report.skip_reason.as_deref(), Some("cycle already running"));
        assert!(fx.dummy.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_stopped_reconciler_starts_nothing() {
        let fx = fixture(2).await;
        fx.reconciler.stop();

        let report = fx.reconciler.reconcile_formation(fx.formation_id).await.unwrap();

        assert!(report.cancelled);
        assert!(fx.dummy.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_all_covers_every_formation() {
        let fx = fixture(2).await;

        let pass = fx.reconciler.reconcile_all().await.unwrap();

        assert!(pass.is_clean());
        assert_eq!(pass.reports.len(), 1);
        assert_eq!(pass.builds(), 2);
    }

    #[tokio::test]
    async fn test_missing_formation_is_an_error() {
        let fx = fixture(0).await;
        let result = fx.reconciler.reconcile_formation(Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::FormationNotFound(_))));
        assert!(fx.reconciler.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pass_drops_locks_of_deleted_formations() {
        let fx = fixture(0).await;
        fx.reconciler.reconcile_formation(fx.formation_id).await.unwrap();
        assert!(fx.reconciler.locks.lock().unwrap().contains_key(&fx.formation_id));

        fx.reconciler.formations.delete(fx.formation_id).await.unwrap();
        let pass = fx.reconciler.reconcile_all().await.unwrap();

        assert!(pass.reports.is_empty());
        assert!(fx.reconciler.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prune_keeps_locks_of_running_cycles() {
        let fx = fixture(0).await;
        let stale = Uuid::new_v4();
        let locks = fx.reconciler.locks_for(stale);
        let running = locks.cycle.clone().try_lock_owned().unwrap();

        fx.reconciler.prune_locks(&[]);

        assert!(fx.reconciler.locks.lock().unwrap().contains_key(&stale));
        drop(running);
        drop(locks);
        fx.reconciler.prune_locks(&[]);
        assert!(fx.reconciler.locks.lock().unwrap().is_empty());
    }
}
