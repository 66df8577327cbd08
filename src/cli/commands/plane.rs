//! Plane CLI commands (read-only).

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::Cell;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, short_id, CommandOutput, TableFormatter};
use crate::domain::models::Plane;

/// Arguments for `atc plane`.
#[derive(Args, Debug)]
pub struct PlaneArgs {
    /// Plane subcommand
    #[command(subcommand)]
    pub command: PlaneCommands,
}

/// Plane subcommands.
#[derive(Subcommand, Debug)]
pub enum PlaneCommands {
    /// List recorded planes
    List {
        /// Only planes belonging to this formation
        #[arg(long)]
        formation: Option<Uuid>,
    },
}

/// One plane record as printed by the CLI.
#[derive(Debug, serde::Serialize)]
pub struct PlaneOutput {
    /// Compound instance identifier
    pub cuid: String,
    /// Owning formation ID
    pub formation_id: String,
    /// `running` or `destroying`
    pub status: String,
    /// Creation time, RFC 3339
    pub created_at: String,
}

impl From<&Plane> for PlaneOutput {
    fn from(plane: &Plane) -> Self {
        Self {
            cuid: plane.cuid.to_string(),
            formation_id: plane.formation_id.to_string(),
            status: plane.status.to_string(),
            created_at: plane.created_at.to_rfc3339(),
        }
    }
}

/// Result of `atc plane list`.
#[derive(Debug, serde::Serialize)]
pub struct PlaneListOutput {
    /// Plane records
    pub planes: Vec<PlaneOutput>,
    /// Number of records listed
    pub total: usize,
}

impl CommandOutput for PlaneListOutput {
    fn to_human(&self) -> String {
        if self.planes.is_empty() {
            return "No planes found.".to_string();
        }

        let formatter = TableFormatter::new();
        let mut table = formatter.table(&["CUID", "FORMATION", "STATUS", "CREATED"]);
        for p in &self.planes {
            table.add_row(vec![
                Cell::new(&p.cuid),
                Cell::new(short_id(&p.formation_id)),
                formatter.plane_status_cell(&p.status),
                Cell::new(&p.created_at),
            ]);
        }
        format!("Found {} plane(s):\n{table}", self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run a plane subcommand.
pub async fn execute(args: PlaneArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let pool = ctx.open_database().await?;
    let service = AppContext::fleet_service(&pool);

    match args.command {
        PlaneCommands::List { formation } => {
            let planes = service.list_planes(formation).await?;
            let out = PlaneListOutput {
                total: planes.len(),
                planes: planes.iter().map(PlaneOutput::from).collect(),
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
