//! Domain errors for the atc control plane.

use thiserror::Error;
use uuid::Uuid;

/// Which registry key a failed driver lookup was keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKey {
    /// Configuration-facing YAML tag.
    YamlTag,
    /// Provenance prefix embedded in CUIDs.
    CuidPrefix,
}

impl std::fmt::Display for DriverKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YamlTag => write!(f, "yaml tag"),
            Self::CuidPrefix => write!(f, "cuid prefix"),
        }
    }
}

/// Domain-level errors that can occur in the control plane.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No registered driver answers to the key
    #[error("Unknown driver for {key} '{value}'")]
    UnknownDriver {
        /// Which key was looked up
        key: DriverKey,
        /// The value that matched nothing
        value: String,
    },

    /// Two drivers claimed the same key at registration
    #[error("Duplicate driver registration for {key} '{value}'")]
    DuplicateDriver {
        /// Which key collided
        key: DriverKey,
        /// The contested value
        value: String,
    },

    /// A CUID without a prefix delimiter
    #[error("Malformed instance identifier: '{0}'")]
    MalformedIdentifier(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A driver's backend refused or failed an operation
    #[error("Provisioning failed on driver '{driver}': {message}")]
    Provisioning {
        /// Tag of the failing driver
        driver: String,
        /// Backend error text
        message: String,
    },

    /// The backend has no such instance
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    /// No airspace with this ID
    #[error("Airspace not found: {0}")]
    AirspaceNotFound(Uuid),

    /// No flight with this ID
    #[error("Flight not found: {0}")]
    FlightNotFound(Uuid),

    /// No formation with this ID
    #[error("Formation not found: {0}")]
    FormationNotFound(Uuid),

    /// No plane record with this CUID
    #[error("Plane not found: {0}")]
    PlaneNotFound(String),

    /// A model failed its own validation
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A query failed or a constraint was violated
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored value could not be decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Convenience constructor for backend-level failures.
    pub fn provisioning(driver: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provisioning {
            driver: driver.into(),
            message: message.into(),
        }
    }

    /// Persistence failures abort a reconciliation cycle.
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::SerializationError(_))
    }
}

/// Result alias used throughout the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
