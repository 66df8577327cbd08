//! Command-line interface for the atc control plane.

pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::airspace::AirspaceArgs;
use commands::driver::DriverArgs;
use commands::flight::FlightArgs;
use commands::formation::FormationArgs;
use commands::plane::PlaneArgs;
use commands::reconcile::ReconcileArgs;
use commands::serve::ServeArgs;

pub use context::AppContext;
pub use output::{output, CommandOutput};

/// Top-level command line.
#[derive(Parser, Debug)]
#[command(name = "atc")]
#[command(about = "Fleet control plane: keeps formations at their target size", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "ATC_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage airspaces
    Airspace(AirspaceArgs),
    /// Manage flights
    Flight(FlightArgs),
    /// Manage formations
    Formation(FormationArgs),
    /// Inspect planes
    Plane(PlaneArgs),
    /// Inspect provider drivers
    Driver(DriverArgs),
    /// Run one reconcile pass and exit
    Reconcile(ReconcileArgs),
    /// Run the reconcile daemon until interrupted
    Serve(ServeArgs),
}

/// Dispatch a parsed command.
pub async fn run(command: Commands, ctx: &AppContext, json_mode: bool) -> anyhow::Result<()> {
    match command {
        Commands::Airspace(args) => commands::airspace::execute(args, ctx, json_mode).await,
        Commands::Flight(args) => commands::flight::execute(args, ctx, json_mode).await,
        Commands::Formation(args) => commands::formation::execute(args, ctx, json_mode).await,
        Commands::Plane(args) => commands::plane::execute(args, ctx, json_mode).await,
        Commands::Driver(args) => commands::driver::execute(args, ctx, json_mode),
        Commands::Reconcile(args) => commands::reconcile::execute(args, ctx, json_mode).await,
        Commands::Serve(args) => commands::serve::execute(args, ctx).await,
    }
}

/// Print an error in the requested format and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
