//! Configuration port for active build driver selection.

use crate::domain::errors::DomainResult;

/// Read path for the active build driver's YAML tag.
///
/// Implementations must re-read their backing source on every call so that
/// an operator's change takes effect on the next cycle without a restart.
pub trait DriverConfigSource: Send + Sync {
    /// The configured tag, or `None` when nothing is configured.
    fn active_driver_tag(&self) -> DomainResult<Option<String>>;
}
