//! One-shot reconciliation command.

use anyhow::Result;
use clap::Args;
use comfy_table::Cell;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::services::{PassError, PassReport, ReconcileReport};

/// Arguments for `atc reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Reconcile only this formation
    #[arg(long)]
    pub formation: Option<Uuid>,
}

/// Result of `atc reconcile`.
#[derive(Debug, serde::Serialize)]
pub struct ReconcileOutput {
    /// One report per formation that ran a cycle
    pub reports: Vec<ReconcileReport>,
    /// Formations whose cycle ended in an error
    pub errors: Vec<PassError>,
}

impl From<PassReport> for ReconcileOutput {
    fn from(pass: PassReport) -> Self {
        Self {
            reports: pass.reports,
            errors: pass.errors,
        }
    }
}

impl CommandOutput for ReconcileOutput {
    fn to_human(&self) -> String {
        if self.reports.is_empty() && self.errors.is_empty() {
            return "No formations to reconcile.".to_string();
        }

        let formatter = TableFormatter::new();
        let mut table = formatter.table(&[
            "FORMATION", "ACTION", "LIVE", "TARGET", "BUILT", "DESTROYED",
        ]);
        let mut notes = Vec::new();
        for r in &self.reports {
            table.add_row(vec![
                Cell::new(r.formation_id),
                formatter.action_cell(r.action, !r.failures.is_empty()),
                Cell::new(r.live_before),
                Cell::new(r.target),
                Cell::new(r.builds_succeeded),
                Cell::new(r.destroys_succeeded),
            ]);
            if let Some(ref reason) = r.skip_reason {
                notes.push(format!("{}  skipped: {reason}", r.formation_id));
            }
            for failure in &r.failures {
                notes.push(format!("{}  failed: {failure}", r.formation_id));
            }
        }
        for e in &self.errors {
            notes.push(format!("{}  error: {}", e.formation_id, e.message));
        }

        let mut lines = Vec::new();
        if !self.reports.is_empty() {
            lines.push(table.to_string());
        }
        lines.extend(notes);
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run one reconcile pass, or one cycle for a single formation.
pub async fn execute(args: ReconcileArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let pool = ctx.open_database().await?;
    let reconciler = ctx.reconciler(&pool, Arc::new(AtomicBool::new(false)))?;

    let pass = match args.formation {
        Some(id) => PassReport {
            reports: vec![reconciler.reconcile_formation(id).await?],
            errors: Vec::new(),
        },
        None => reconciler.reconcile_all().await?,
    };

    let failed = !pass.is_clean();
    output(&ReconcileOutput::from(pass), json_mode);
    if failed {
        anyhow::bail!("one or more formations failed to reconcile");
    }
    Ok(())
}
