//! Airspace domain model.
//!
//! An Airspace is the top-level isolation namespace. Flights live inside
//! exactly one Airspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Top-level isolation namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airspace {
    /// Unique identifier, never changes after creation
    pub id: Uuid,
    /// Human-readable name
    pub human_name: String,
    /// Network name used by backends to isolate instances
    pub net_name: String,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Airspace {
    /// Create a new airspace with a fresh ID.
    pub fn new(human_name: impl Into<String>, net_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            human_name: human_name.into(),
            net_name: net_name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Both names must be non-blank.
    pub fn validate(&self) -> DomainResult<()> {
        if self.human_name.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Airspace name cannot be empty".to_string(),
            ));
        }
        if self.net_name.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Airspace network name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Rename the airspace. The identifier is left untouched.
    pub fn rename(&mut self, human_name: impl Into<String>, net_name: impl Into<String>) {
        self.human_name = human_name.into();
        self.net_name = net_name.into();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_keeps_id() {
        let mut airspace = Airspace::new("Production", "prod");
        let id = airspace.id;
        airspace.rename("Prod EU", "prod-eu");

        assert_eq!(airspace.id, id);
        assert_eq!(airspace.human_name, "Prod EU");
        assert_eq!(airspace.net_name, "prod-eu");
    }

    #[test]
    fn test_validate_rejects_blank_names() {
        assert!(Airspace::new("", "net").validate().is_err());
        assert!(Airspace::new("name", "  ").validate().is_err());
        assert!(Airspace::new("name", "net").validate().is_ok());
    }
}
