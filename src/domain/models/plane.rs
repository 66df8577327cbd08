//! Plane domain model and the compound instance identifier.
//!
//! A CUID has the wire form `<provenance-prefix>:<local-id>`. The prefix names
//! the driver that built the instance and is fixed at build time; only the
//! first `:` is significant, so local ids may themselves contain colons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Separator between provenance prefix and local id.
pub const CUID_DELIMITER: char = ':';

/// Compound instance identifier.
///
/// Stored verbatim; structure is only checked when it is split, so records
/// holding a malformed value can still be loaded and reported.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cuid(String);

impl Cuid {
    /// Join a driver prefix and a driver-local id.
    pub fn new(prefix: &str, local_id: impl AsRef<str>) -> Self {
        Self(format!("{prefix}{CUID_DELIMITER}{}", local_id.as_ref()))
    }

    /// Wrap a raw string without checking its structure.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split at the first delimiter into `(prefix, local_id)`.
    pub fn parts(&self) -> DomainResult<(&str, &str)> {
        self.0
            .split_once(CUID_DELIMITER)
            .ok_or_else(|| DomainError::MalformedIdentifier(self.0.clone()))
    }

    /// Provenance prefix naming the driver that built the instance.
    pub fn prefix(&self) -> DomainResult<&str> {
        self.parts().map(|(prefix, _)| prefix)
    }

    /// Driver-local part after the first delimiter.
    pub fn local_id(&self) -> DomainResult<&str> {
        self.parts().map(|(_, local)| local)
    }
}

impl std::fmt::Display for Cuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cuid {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}

/// Lifecycle status of a Plane record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneStatus {
    /// Built and counted toward the formation
    Running,
    /// A destroy call has been issued or is about to be
    Destroying,
}

impl Default for PlaneStatus {
    fn default() -> Self {
        Self::Running
    }
}

impl PlaneStatus {
    /// Stored form of the status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Destroying => "destroying",
        }
    }

    /// Parse a stored status, ignoring case.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "running" => Some(Self::Running),
            "destroying" => Some(Self::Destroying),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlaneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete instance belonging to a Formation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plane {
    /// Instance identifier, unique across the fleet
    pub cuid: Cuid,
    /// Owning formation
    pub formation_id: Uuid,
    /// Lifecycle status
    pub status: PlaneStatus,
    /// When the build was recorded
    pub created_at: DateTime<Utc>,
    /// When the status last changed
    pub updated_at: DateTime<Utc>,
}

impl Plane {
    /// Record for an instance a driver has just built.
    pub fn built(cuid: Cuid, formation_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            cuid,
            formation_id,
            status: PlaneStatus::Running,
            created_at: now,
            updated_at: now,
        }
    }
}
