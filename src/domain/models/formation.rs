//! Formation domain model.
//!
//! A Formation is the declarative desired-state unit: a homogeneous pool of
//! Planes sharing sizing, naming and domain. After creation only the target
//! count may change; rolling changes to sizing are not supported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Desired-state pool of identical instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    /// Unique identifier
    pub id: Uuid,
    /// Owning flight
    pub flight_id: Uuid,
    /// Formation name
    pub name: String,
    /// vCPU count per instance
    pub cpu: u32,
    /// Memory per instance, in MiB
    pub ram: u32,
    /// Disk per instance, in GiB
    pub disk: u32,
    /// Prefix for generated instance names
    pub base_name: String,
    /// DNS suffix for generated hostnames
    pub domain: String,
    /// Desired number of live instances
    pub target_count: u32,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

/// Everything a driver needs to provision one instance of a Formation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationSpec {
    /// Formation the instance belongs to
    pub formation_id: Uuid,
    /// Formation name
    pub name: String,
    /// vCPU count
    pub cpu: u32,
    /// Memory, in MiB
    pub ram: u32,
    /// Disk, in GiB
    pub disk: u32,
    /// Prefix for the instance name
    pub base_name: String,
    /// DNS suffix for the hostname
    pub domain: String,
}

/// Fields accepted when creating a Formation. Each has the meaning of the
/// [`Formation`] field of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct NewFormation {
    pub flight_id: Uuid,
    pub name: String,
    pub cpu: u32,
    pub ram: u32,
    pub disk: u32,
    pub base_name: String,
    pub domain: String,
    pub target_count: u32,
}

impl Formation {
    /// Create a formation with a fresh ID.
    pub fn new(fields: NewFormation) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            flight_id: fields.flight_id,
            name: fields.name,
            cpu: fields.cpu,
            ram: fields.ram,
            disk: fields.disk,
            base_name: fields.base_name,
            domain: fields.domain,
            target_count: fields.target_count,
            created_at: now,
            updated_at: now,
        }
    }

    /// Names must be non-blank and every size must be positive.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Formation name cannot be empty".to_string(),
            ));
        }
        if self.cpu == 0 || self.ram == 0 || self.disk == 0 {
            return Err(DomainError::ValidationFailed(format!(
                "Formation '{}' sizing must be positive (cpu={}, ram={}, disk={})",
                self.name, self.cpu, self.ram, self.disk
            )));
        }
        if self.base_name.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Formation base name cannot be empty".to_string(),
            ));
        }
        if self.domain.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Formation domain cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Change the desired instance count. This is the only mutation allowed
    /// after creation.
    pub fn set_target_count(&mut self, target_count: u32) {
        self.target_count = target_count;
        self.updated_at = Utc::now();
    }

    /// Build input handed to provider drivers.
    pub fn spec(&self) -> FormationSpec {
        FormationSpec {
            formation_id: self.id,
            name: self.name.clone(),
            cpu: self.cpu,
            ram: self.ram,
            disk: self.disk,
            base_name: self.base_name.clone(),
            domain: self.domain.clone(),
        }
    }
}

impl FormationSpec {
    /// Fully qualified hostname for an instance with the given local name.
    pub fn hostname(&self, local: &str) -> String {
        format!("{}-{}.{}", self.base_name, local, self.domain)
    }
}
