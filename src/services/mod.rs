//! Service layer: driver selection, reconciliation and fleet management.

pub mod driver_selector;
pub mod fleet_service;
pub mod reconcile_daemon;
pub mod reconciler;

pub use driver_selector::DriverSelector;
pub use fleet_service::FleetService;
pub use reconcile_daemon::{
    DaemonHandle, DaemonStatus, ReconcileDaemon, ReconcileDaemonConfig, ReconcileDaemonEvent,
    StopReason,
};
pub use reconciler::{
    plan_reconciliation, FormationReconciler, PassError, PassReport, ReconcileAction,
    ReconcilePlan, ReconcileReport,
};
