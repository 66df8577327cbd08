//! Flight CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{
    output, short_id, truncate, ActionOutput, CommandOutput, TableFormatter,
};
use crate::domain::models::Flight;

/// Arguments for `atc flight`.
#[derive(Args, Debug)]
pub struct FlightArgs {
    /// Flight subcommand
    #[command(subcommand)]
    pub command: FlightCommands,
}

/// Flight subcommands.
#[derive(Subcommand, Debug)]
pub enum FlightCommands {
    /// Create a flight inside an airspace
    Create {
        /// Owning airspace ID
        airspace_id: Uuid,
        /// Flight name
        name: String,
    },
    /// List flights
    List {
        /// Only flights in this airspace
        #[arg(long)]
        airspace: Option<Uuid>,
    },
    /// Show flight details
    Show {
        /// Flight ID
        id: Uuid,
    },
    /// Rename a flight
    Update {
        /// Flight ID
        id: Uuid,
        /// New name
        name: String,
    },
    /// Delete a flight and its formations
    Delete {
        /// Flight ID
        id: Uuid,
    },
}

/// One flight as printed by the CLI.
#[derive(Debug, serde::Serialize)]
pub struct FlightOutput {
    /// Flight ID
    pub id: String,
    /// Owning airspace ID
    pub airspace_id: String,
    /// Flight name
    pub name: String,
    /// Creation time, RFC 3339
    pub created_at: String,
}

impl From<&Flight> for FlightOutput {
    fn from(flight: &Flight) -> Self {
        Self {
            id: flight.id.to_string(),
            airspace_id: flight.airspace_id.to_string(),
            name: flight.name.clone(),
            created_at: flight.created_at.to_rfc3339(),
        }
    }
}

impl CommandOutput for FlightOutput {
    fn to_human(&self) -> String {
        [
            format!("Flight: {}", self.name),
            format!("ID: {}", self.id),
            format!("Airspace: {}", self.airspace_id),
            format!("Created: {}", self.created_at),
        ]
        .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Result of `atc flight list`.
#[derive(Debug, serde::Serialize)]
pub struct FlightListOutput {
    /// Flights, ordered by name
    pub flights: Vec<FlightOutput>,
    /// Number of flights listed
    pub total: usize,
}

impl CommandOutput for FlightListOutput {
    fn to_human(&self) -> String {
        if self.flights.is_empty() {
            return "No flights found.".to_string();
        }

        let mut table = TableFormatter::new().table(&["ID", "AIRSPACE", "NAME"]);
        for f in &self.flights {
            table.add_row(vec![
                f.id.clone(),
                short_id(&f.airspace_id).to_string(),
                truncate(&f.name, 24),
            ]);
        }
        format!("Found {} flight(s):\n{table}", self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run a flight subcommand.
pub async fn execute(args: FlightArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let pool = ctx.open_database().await?;
    let service = AppContext::fleet_service(&pool);

    match args.command {
        FlightCommands::Create { airspace_id, name } => {
            let flight = service.create_flight(airspace_id, &name).await?;
            let out = ActionOutput {
                success: true,
                message: format!("Flight created: {}", flight.id),
                item: Some(FlightOutput::from(&flight)),
            };
            output(&out, json_mode);
        }
        FlightCommands::List { airspace } => {
            let flights = service.list_flights(airspace).await?;
            let out = FlightListOutput {
                total: flights.len(),
                flights: flights.iter().map(FlightOutput::from).collect(),
            };
            output(&out, json_mode);
        }
        FlightCommands::Show { id } => {
            let flight = service.get_flight(id).await?;
            output(&FlightOutput::from(&flight), json_mode);
        }
        FlightCommands::Update { id, name } => {
            let flight = service.update_flight(id, &name).await?;
            let out = ActionOutput {
                success: true,
                message: format!("Flight updated: {}", flight.id),
                item: Some(FlightOutput::from(&flight)),
            };
            output(&out, json_mode);
        }
        FlightCommands::Delete { id } => {
            service.delete_flight(id).await?;
            let out: ActionOutput<FlightOutput> = ActionOutput {
                success: true,
                message: format!("Flight deleted: {id}"),
                item: None,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
