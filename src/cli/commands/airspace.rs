//! Airspace CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, truncate, ActionOutput, CommandOutput, TableFormatter};
use crate::domain::models::Airspace;

/// Arguments for `atc airspace`.
#[derive(Args, Debug)]
pub struct AirspaceArgs {
    /// Airspace subcommand
    #[command(subcommand)]
    pub command: AirspaceCommands,
}

/// Airspace subcommands.
#[derive(Subcommand, Debug)]
pub enum AirspaceCommands {
    /// Create an airspace
    Create {
        /// Human-readable name
        name: String,
        /// Network name used to isolate instances
        net_name: String,
    },
    /// List airspaces
    List,
    /// Show airspace details
    Show {
        /// Airspace ID
        id: Uuid,
    },
    /// Rename an airspace
    Update {
        /// Airspace ID
        id: Uuid,
        /// New human-readable name
        name: String,
        /// New network name
        net_name: String,
    },
    /// Delete an airspace and everything under it
    Delete {
        /// Airspace ID
        id: Uuid,
    },
}

/// One airspace as printed by the CLI.
#[derive(Debug, serde::Serialize)]
pub struct AirspaceOutput {
    /// Airspace ID
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Network name
    pub net_name: String,
    /// Creation time, RFC 3339
    pub created_at: String,
}

impl From<&Airspace> for AirspaceOutput {
    fn from(airspace: &Airspace) -> Self {
        Self {
            id: airspace.id.to_string(),
            name: airspace.human_name.clone(),
            net_name: airspace.net_name.clone(),
            created_at: airspace.created_at.to_rfc3339(),
        }
    }
}

/// Result of `atc airspace list`.
#[derive(Debug, serde::Serialize)]
pub struct AirspaceListOutput {
    /// Airspaces, ordered by name
    pub airspaces: Vec<AirspaceOutput>,
    /// Number of airspaces listed
    pub total: usize,
}

impl CommandOutput for AirspaceListOutput {
    fn to_human(&self) -> String {
        if self.airspaces.is_empty() {
            return "No airspaces found.".to_string();
        }

        let mut table = TableFormatter::new().table(&["ID", "NAME", "NETWORK"]);
        for a in &self.airspaces {
            table.add_row(vec![a.id.clone(), truncate(&a.name, 24), truncate(&a.net_name, 16)]);
        }
        format!("Found {} airspace(s):\n{table}", self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl CommandOutput for AirspaceOutput {
    fn to_human(&self) -> String {
        [
            format!("Airspace: {}", self.name),
            format!("ID: {}", self.id),
            format!("Network: {}", self.net_name),
            format!("Created: {}", self.created_at),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run an airspace subcommand.
pub async fn execute(args: AirspaceArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let pool = ctx.open_database().await?;
    let service = AppContext::fleet_service(&pool);

    match args.command {
        AirspaceCommands::Create { name, net_name } => {
            let airspace = service.create_airspace(&name, &net_name).await?;
            let out = ActionOutput {
                success: true,
                message: format!("Airspace created: {}", airspace.id),
                item: Some(AirspaceOutput::from(&airspace)),
            };
            output(&out, json_mode);
        }
        AirspaceCommands::List => {
            let airspaces = service.list_airspaces().await?;
            let out = AirspaceListOutput {
                total: airspaces.len(),
                airspaces: airspaces.iter().map(AirspaceOutput::from).collect(),
            };
            output(&out, json_mode);
        }
        AirspaceCommands::Show { id } => {
            let airspace = service.get_airspace(id).await?;
            output(&AirspaceOutput::from(&airspace), json_mode);
        }
        AirspaceCommands::Update { id, name, net_name } => {
            let airspace = service.update_airspace(id, &name, &net_name).await?;
            let out = ActionOutput {
                success: true,
                message: format!("Airspace updated: {}", airspace.id),
                item: Some(AirspaceOutput::from(&airspace)),
            };
            output(&out, json_mode);
        }
        AirspaceCommands::Delete { id } => {
            service.delete_airspace(id).await?;
            let out: ActionOutput<AirspaceOutput> = ActionOutput {
                success: true,
                message: format!("Airspace deleted: {id}"),
                item: None,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
