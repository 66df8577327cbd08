//! Formation CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{
    output, short_id, truncate, ActionOutput, CommandOutput, TableFormatter,
};
use crate::domain::models::{Formation, NewFormation};

/// Arguments for `atc formation`.
#[derive(Args, Debug)]
pub struct FormationArgs {
    /// Formation subcommand
    #[command(subcommand)]
    pub command: FormationCommands,
}

/// Formation subcommands.
#[derive(Subcommand, Debug)]
pub enum FormationCommands {
    /// Create a formation inside a flight
    Create {
        /// Owning flight ID
        flight_id: Uuid,
        /// Formation name
        name: String,
        /// vCPUs per instance
        #[arg(long)]
        cpu: u32,
        /// Memory per instance, in MiB
        #[arg(long)]
        ram: u32,
        /// Disk per instance, in GiB
        #[arg(long)]
        disk: u32,
        /// Prefix for instance names
        #[arg(long)]
        base_name: String,
        /// DNS suffix for instance hostnames
        #[arg(long)]
        domain: String,
        /// Desired number of instances
        #[arg(long, default_value_t = 0)]
        target_count: u32,
    },
    /// List formations
    List {
        /// Only formations in this flight
        #[arg(long)]
        flight: Option<Uuid>,
    },
    /// Show formation details
    Show {
        /// Formation ID
        id: Uuid,
    },
    /// Change the desired instance count
    Scale {
        /// Formation ID
        id: Uuid,
        /// New desired instance count
        target_count: u32,
    },
    /// Delete a formation that has no planes left
    Delete {
        /// Formation ID
        id: Uuid,
    },
}

/// One formation as printed by the CLI.
#[derive(Debug, serde::Serialize)]
pub struct FormationOutput {
    /// Formation ID
    pub id: String,
    /// Owning flight ID
    pub flight_id: String,
    /// Formation name
    pub name: String,
    /// vCPUs per instance
    pub cpu: u32,
    /// MiB of memory per instance
    pub ram: u32,
    /// GiB of disk per instance
    pub disk: u32,
    /// Instance name prefix
    pub base_name: String,
    /// Hostname DNS suffix
    pub domain: String,
    /// Desired instance count
    pub target_count: u32,
    /// Creation time, RFC 3339
    pub created_at: String,
}

impl From<&Formation> for FormationOutput {
    fn from(f: &Formation) -> Self {
        Self {
            id: f.id.to_string(),
            flight_id: f.flight_id.to_string(),
            name: f.name.clone(),
            cpu: f.cpu,
            ram: f.ram,
            disk: f.disk,
            base_name: f.base_name.clone(),
            domain: f.domain.clone(),
            target_count: f.target_count,
            created_at: f.created_at.to_rfc3339(),
        }
    }
}

impl CommandOutput for FormationOutput {
    fn to_human(&self) -> String {
        [
            format!("Formation: {}", self.name),
            format!("ID: {}", self.id),
            format!("Flight: {}", self.flight_id),
            format!("Size: {} vCPU, {} MiB RAM, {} GiB disk", self.cpu, self.ram, self.disk),
            format!("Naming: {}-*.{}", self.base_name, self.domain),
            format!("Target: {}", self.target_count),
            format!("Created: {}", self.created_at),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Result of `atc formation list`.
#[derive(Debug, serde::Serialize)]
pub struct FormationListOutput {
    /// Formations, ordered by name
    pub formations: Vec<FormationOutput>,
    /// Number of formations listed
    pub total: usize,
}

impl CommandOutput for FormationListOutput {
    fn to_human(&self) -> String {
        if self.formations.is_empty() {
            return "No formations found.".to_string();
        }

        let mut table =
            TableFormatter::new().table(&["ID", "FLIGHT", "NAME", "TARGET", "DOMAIN"]);
        for f in &self.formations {
            table.add_row(vec![
                f.id.clone(),
                short_id(&f.flight_id).to_string(),
                truncate(&f.name, 20),
                f.target_count.to_string(),
                truncate(&f.domain, 20),
            ]);
        }
        format!("Found {} formation(s):\n{table}", self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run a formation subcommand.
pub async fn execute(args: FormationArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let pool = ctx.open_database().await?;
    let service = AppContext::fleet_service(&pool);

    match args.command {
        FormationCommands::Create {
            flight_id,
            name,
            cpu,
            ram,
            disk,
            base_name,
            domain,
            target_count,
        } => {
            let formation = service
                .create_formation(NewFormation {
                    flight_id,
                    name,
                    cpu,
                    ram,
                    disk,
                    base_name,
                    domain,
                    target_count,
                })
                .await?;
            let out = ActionOutput {
                success: true,
                message: format!("Formation created: {}", formation.id),
                item: Some(FormationOutput::from(&formation)),
            };
            output(&out, json_mode);
        }
        FormationCommands::List { flight } => {
            let formations = service.list_formations(flight).await?;
            let out = FormationListOutput {
                total: formations.len(),
                formations: formations.iter().map(FormationOutput::from).collect(),
            };
            output(&out, json_mode);
        }
        FormationCommands::Show { id } => {
            let formation = service.get_formation(id).await?;
            output(&FormationOutput::from(&formation), json_mode);
        }
        FormationCommands::Scale { id, target_count } => {
            let formation = service.set_target_count(id, target_count).await?;
            let out = ActionOutput {
                success: true,
                message: format!(
                    "Formation {} target set to {}; applied on the next reconcile pass",
                    formation.name, formation.target_count
                ),
                item: Some(FormationOutput::from(&formation)),
            };
            output(&out, json_mode);
        }
        FormationCommands::Delete { id } => {
            service.delete_formation(id).await?;
            let out: ActionOutput<FormationOutput> = ActionOutput {
                success: true,
                message: format!("Formation deleted: {id}"),
                item: None,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
