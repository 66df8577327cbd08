//! Reconciliation background daemon.
//!
//! Runs a full pass over every Formation on a fixed interval until asked to
//! stop, or until too many passes in a row fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::domain::models::ReconcilerConfig;
use crate::services::reconciler::{FormationReconciler, PassReport};

/// Configuration for the reconcile daemon.
#[derive(Debug, Clone)]
pub struct ReconcileDaemonConfig {
    /// Interval between passes.
    pub pass_interval: Duration,
    /// Maximum consecutive failed passes before stopping.
    pub max_consecutive_failures: u32,
}

impl Default for ReconcileDaemonConfig {
    fn default() -> Self {
        Self::from(&ReconcilerConfig::default())
    }
}

impl From<&ReconcilerConfig> for ReconcileDaemonConfig {
    fn from(config: &ReconcilerConfig) -> Self {
        Self {
            pass_interval: Duration::from_secs(config.interval_secs.max(1)),
            max_consecutive_failures: config.max_consecutive_failures.max(1),
        }
    }
}

impl ReconcileDaemonConfig {
    /// Defaults with a different pass interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            pass_interval: interval,
            ..Default::default()
        }
    }
}

/// Event emitted by the reconcile daemon.
#[derive(Debug, Clone)]
pub enum ReconcileDaemonEvent {
    /// The loop is running
    Started,
    /// A pass is about to list formations
    PassStarted {
        /// 1-based pass counter
        pass_number: u64,
    },
    /// A pass finished with no cycle errors
    PassCompleted {
        /// 1-based pass counter
        pass_number: u64,
        /// Per-formation results
        report: PassReport,
        /// Wall time of the pass
        duration_ms: u64,
    },
    /// A pass could not list formations or a cycle ended in an error
    PassFailed {
        /// 1-based pass counter
        pass_number: u64,
        /// Error text
        error: String,
    },
    /// The loop has exited
    Stopped {
        /// Why it exited
        reason: StopReason,
    },
}

/// Reason the daemon stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// [`DaemonHandle::stop`] was called
    Requested,
    /// `max_consecutive_failures` passes in a row failed
    TooManyFailures,
}

/// Status of the reconcile daemon.
#[derive(Debug, Clone, Default)]
pub struct DaemonStatus {
    /// Whether the loop is running
    pub running: bool,
    /// Passes started
    pub total_passes: u64,
    /// Passes in which no cycle ended in an error
    pub successful_passes: u64,
    /// Passes that could not list formations or had a cycle error
    pub failed_passes: u64,
    /// When the last pass finished
    pub last_pass: Option<Instant>,
    /// Successful builds across all passes
    pub total_builds: u64,
    /// Successful destroys across all passes
    pub total_destroys: u64,
}

/// Handle to control the reconcile daemon.
#[derive(Clone)]
pub struct DaemonHandle {
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
    status: Arc<RwLock<DaemonStatus>>,
}

impl DaemonHandle {
    /// Request the daemon to stop. A pass in progress finishes its in-flight
    /// operations and starts no new ones.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Snapshot of the daemon's counters.
    pub async fn status(&self) -> DaemonStatus {
        self.status.read().await.clone()
    }
}

/// Recurring reconciliation scheduler.
pub struct ReconcileDaemon {
    reconciler: Arc<FormationReconciler>,
    config: ReconcileDaemonConfig,
    status: Arc<RwLock<DaemonStatus>>,
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl ReconcileDaemon {
    /// The reconciler must have been built with `stop_flag` via
    /// [`FormationReconciler::with_stop_flag`] for a stop request to reach
    /// passes already under way.
    pub fn new(
        reconciler: Arc<FormationReconciler>,
        config: ReconcileDaemonConfig,
        stop_flag: Arc<AtomicBool>,
    ) -> Self {
        Self {
            reconciler,
            config,
            status: Arc::new(RwLock::new(DaemonStatus::default())),
            stop_flag,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Handle for stopping the daemon and reading its status.
    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            stop_flag: self.stop_flag.clone(),
            wake: self.wake.clone(),
            status: self.status.clone(),
        }
    }

    /// Run the daemon in the background, returning a channel for events.
    pub fn run(self) -> mpsc::Receiver<ReconcileDaemonEvent> {
        let (tx, rx) = mpsc::channel(100);

        tokio::spawn(async move {
            self.run_loop(tx).await;
        });

        rx
    }

    async fn run_loop(self, tx: mpsc::Sender<ReconcileDaemonEvent>) {
        self.status.write().await.running = true;
        let _ = tx.send(ReconcileDaemonEvent::Started).await;
        tracing::info!(
            interval_secs = self.config.pass_interval.as_secs(),
            "reconcile daemon started"
        );

        let mut consecutive_failures = 0u32;
        let mut ticker = interval(self.config.pass_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = self.wake.notified() => {}
            }
            if self.is_stop_requested() {
                break StopReason::Requested;
            }

            self.run_pass(&tx, &mut consecutive_failures).await;

            if consecutive_failures >= self.config.max_consecutive_failures {
                tracing::error!(
                    consecutive_failures,
                    "reconcile daemon giving up after repeated failures"
                );
                break StopReason::TooManyFailures;
            }
            if self.is_stop_requested() {
                break StopReason::Requested;
            }
        };

        self.status.write().await.running = false;
        tracing::info!(reason = ?reason, "reconcile daemon stopped");
        let _ = tx.send(ReconcileDaemonEvent::Stopped { reason }).await;
    }

    fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    async fn run_pass(&self, tx: &mpsc::Sender<ReconcileDaemonEvent>, consecutive_failures: &mut u32) {
        let pass_number = {
            let mut status = self.status.write().await;
            status.total_passes += 1;
            status.total_passes
        };

        let _ = tx.send(ReconcileDaemonEvent::PassStarted { pass_number }).await;

        let start = Instant::now();
        let result = self.reconciler.reconcile_all().await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let failure = match &result {
            Ok(report) if report.is_clean() => None,
            Ok(report) => Some(
                report
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", e.formation_id, e.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Err(e) => Some(e.to_string()),
        };

        {
            let mut status = self.status.write().await;
            status.last_pass = Some(Instant::now());
            if let Ok(report) = &result {
                status.total_builds += report.builds() as u64;
                status.total_destroys += report.destroys() as u64;
            }
            if failure.is_some() {
                status.failed_passes += 1;
            } else {
                status.successful_passes += 1;
            }
        }

        match (result, failure) {
            (Ok(report), None) => {
                *consecutive_failures = 0;
                let _ = tx
                    .send(ReconcileDaemonEvent::PassCompleted {
                        pass_number,
                        report,
                        duration_ms,
                    })
                    .await;
            }
            (_, failure) => {
                *consecutive_failures += 1;
                let error = failure.unwrap_or_default();
                tracing::warn!(pass_number, error = %error, "reconcile pass failed");
                let _ = tx
                    .send(ReconcileDaemonEvent::PassFailed { pass_number, error })
                    .await;
            }
        }
    }
}
