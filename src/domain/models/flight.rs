//! Flight domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Named grouping of Formations inside one Airspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Unique identifier
    pub id: Uuid,
    /// Owning airspace
    pub airspace_id: Uuid,
    /// Flight name
    pub name: String,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Flight {
    /// Create a new flight inside `airspace_id`.
    pub fn new(airspace_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            airspace_id,
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The name must be non-blank.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Flight name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Change the name and bump `updated_at`.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }
}
