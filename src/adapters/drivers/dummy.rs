//! No-op driver for tests and dry runs.
//!
//! Builds nothing real: every build mints a fresh local id and remembers it,
//! every destroy forgets it. All calls are recorded so tests can assert on
//! exactly what the reconciler asked for.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Cuid, FormationSpec};
use crate::domain::ports::ProviderDriver;

/// Configuration tag of the built-in dummy driver.
pub const DUMMY_YAML_TAG: &str = "dummy";
/// Provenance prefix of instances the dummy driver builds.
pub const DUMMY_CUID_PREFIX: &str = "dummy";

/// A call received by the dummy driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// A build for the given formation
    Build {
        /// Formation the instance was built for
        formation_id: Uuid,
    },
    /// A destroy of one instance
    Destroy {
        /// Instance the destroy was issued for
        cuid: Cuid,
    },
}

/// Recording no-op driver.
pub struct DummyDriver {
    yaml_tag: String,
    cuid_prefix: String,
    instances: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<DriverCall>>>,
    failing_builds: AtomicUsize,
    failing_destroys: AtomicUsize,
    latency: Option<Duration>,
}

impl DummyDriver {
    /// Driver registered under the `dummy` tag and prefix.
    pub fn new() -> Self {
        Self::named(DUMMY_YAML_TAG, DUMMY_CUID_PREFIX)
    }

    /// A recording driver registered under a different identity.
    ///
    /// Useful for standing in for a decommissioned or historical backend.
    pub fn named(yaml_tag: impl Into<String>, cuid_prefix: impl Into<String>) -> Self {
        Self {
            yaml_tag: yaml_tag.into(),
            cuid_prefix: cuid_prefix.into(),
            instances: Arc::new(RwLock::new(HashSet::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            failing_builds: AtomicUsize::new(0),
            failing_destroys: AtomicUsize::new(0),
            latency: None,
        }
    }

    /// Sleep this long inside every build and destroy.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next `count` builds fail with a provisioning error.
    pub fn fail_next_builds(&self, count: usize) {
        self.failing_builds.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` destroys fail with a provisioning error.
    pub fn fail_next_destroys(&self, count: usize) {
        self.failing_destroys.store(count, Ordering::SeqCst);
    }

    /// Register an instance as existing without a build call.
    pub async fn adopt(&self, cuid: &Cuid) {
        if let Ok(local) = cuid.local_id() {
            self.instances.write().await.insert(local.to_string());
        }
    }

    /// All calls received so far, in arrival order.
    pub async fn calls(&self) -> Vec<DriverCall> {
        self.calls.read().await.clone()
    }

    /// Number of build calls received, failed ones included.
    pub async fn build_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, DriverCall::Build { .. }))
            .count()
    }

    /// Instances a destroy call was received for, in call order.
    pub async fn destroyed(&self) -> Vec<Cuid> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                DriverCall::Destroy { cuid } => Some(cuid.clone()),
                DriverCall::Build { .. } => None,
            })
            .collect()
    }

    /// Number of instances this driver currently believes exist.
    pub async fn live_count(&self) -> usize {
        self.instances.read().await.len()
    }

    /// Clear recorded calls, keeping live instances.
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for DummyDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderDriver for DummyDriver {
    fn yaml_tag(&self) -> &str {
        &self.yaml_tag
    }

    fn cuid_prefix(&self) -> &str {
        &self.cuid_prefix
    }

    async fn build(&self, spec: &FormationSpec) -> DomainResult<Cuid> {
        self.calls.write().await.push(DriverCall::Build {
            formation_id: spec.formation_id,
        });
        self.simulate_latency().await;

        if Self::take_failure(&self.failing_builds) {
            return Err(DomainError::provisioning(
                &self.yaml_tag,
                format!("injected build failure for formation {}", spec.name),
            ));
        }

        let local = Uuid::new_v4().simple().to_string();
        self.instances.write().await.insert(local.clone());
        let cuid = Cuid::new(&self.cuid_prefix, &local);
        tracing::debug!(
            cuid = %cuid,
            hostname = %spec.hostname(&local[..8]),
            "dummy instance built"
        );
        Ok(cuid)
    }

    async fn destroy(&self, cuid: &Cuid) -> DomainResult<()> {
        self.calls
            .write()
            .await
            .push(DriverCall::Destroy { cuid: cuid.clone() });
        self.simulate_latency().await;

        if Self::take_failure(&self.failing_destroys) {
            return Err(DomainError::provisioning(
                &self.yaml_tag,
                format!("injected destroy failure for {cuid}"),
            ));
        }

        let (prefix, local) = cuid.parts()?;
        if prefix != self.cuid_prefix {
            return Err(DomainError::provisioning(
                &self.yaml_tag,
                format!("{cuid} was not built by this driver"),
            ));
        }

        if self.instances.write().await.remove(local) {
            Ok(())
        } else {
            Err(DomainError::InstanceNotFound(cuid.to_string()))
        }
    }
}
