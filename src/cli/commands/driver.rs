//! Driver CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::Cell;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::ports::{DriverConfigSource, ProviderDriver};
use crate::infrastructure::config::FigmentDriverSource;

/// Arguments for `atc driver`.
#[derive(Args, Debug)]
pub struct DriverArgs {
    /// Driver subcommand
    #[command(subcommand)]
    pub command: DriverCommands,
}

/// Driver subcommands.
#[derive(Subcommand, Debug)]
pub enum DriverCommands {
    /// List registered drivers and show which one builds new instances
    List,
}

/// One registered driver as printed by the CLI.
#[derive(Debug, serde::Serialize)]
pub struct DriverOutput {
    /// Tag used to select the driver in configuration
    pub yaml_tag: String,
    /// Prefix of CUIDs the driver issues
    pub cuid_prefix: String,
    /// Whether new instances are built on this driver
    pub active: bool,
}

/// Result of `atc driver list`.
#[derive(Debug, serde::Serialize)]
pub struct DriverListOutput {
    /// Registered drivers in registration order
    pub drivers: Vec<DriverOutput>,
    /// Configured active tag, if any
    pub active: Option<String>,
    /// Set when the configured tag matches no registered driver
    pub warning: Option<String>,
}

impl CommandOutput for DriverListOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let mut table = formatter.table(&["TAG", "CUID PREFIX", "ACTIVE"]);
        for d in &self.drivers {
            table.add_row(vec![
                Cell::new(&d.yaml_tag),
                Cell::new(&d.cuid_prefix),
                formatter.active_cell(d.active),
            ]);
        }
        let mut lines = vec![table.to_string()];
        match (&self.active, &self.warning) {
            (_, Some(warning)) => lines.push(format!("\nWarning: {warning}")),
            (None, None) => lines.push("\nNo active build driver configured.".to_string()),
            (Some(_), None) => {}
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run a driver subcommand.
pub fn execute(args: DriverArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        DriverCommands::List => {
            let registry = AppContext::registry()?;
            let active = FigmentDriverSource::new(&ctx.config_path).active_driver_tag()?;

            let drivers: Vec<DriverOutput> = registry
                .drivers()
                .map(|d| DriverOutput {
                    yaml_tag: d.yaml_tag().to_string(),
                    cuid_prefix: d.cuid_prefix().to_string(),
                    active: active.as_deref() == Some(d.yaml_tag()),
                })
                .collect();

            let warning = active
                .as_ref()
                .filter(|_| !drivers.iter().any(|d| d.active))
                .map(|tag| format!("active driver '{tag}' is not registered"));

            output(
                &DriverListOutput {
                    drivers,
                    active,
                    warning,
                },
                json_mode,
            );
        }
    }

    Ok(())
}
