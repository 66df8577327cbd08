//! Table output formatting for CLI commands
//!
//! Every human-readable listing goes through [`TableFormatter`] so that borders,
//! header styling and colour handling stay consistent across commands.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::domain::models::PlaneStatus;
use crate::services::ReconcileAction;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Create a table with the common settings and a bold header row.
    pub fn table(&self, headers: &[&str]) -> Table {
        let mut table = self.create_base_table();
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        table
    }

    /// Cell for a plane status as rendered by `PlaneStatus::to_string`.
    pub fn plane_status_cell(&self, status: &str) -> Cell {
        let parsed = PlaneStatus::from_str(status);
        if self.use_colors {
            match parsed {
                Some(PlaneStatus::Running) => Cell::new(status).fg(Color::Green),
                Some(PlaneStatus::Destroying) => Cell::new(status).fg(Color::Yellow),
                None => Cell::new(status),
            }
        } else {
            let icon = match parsed {
                Some(PlaneStatus::Running) => "●",
                Some(PlaneStatus::Destroying) => "⟳",
                None => "?",
            };
            Cell::new(format!("{icon} {status}"))
        }
    }

    /// Cell for the action a reconcile cycle took.
    pub fn action_cell(&self, action: ReconcileAction, failed: bool) -> Cell {
        let cell = Cell::new(action.to_string());
        if !self.use_colors {
            return cell;
        }
        if failed {
            return cell.fg(Color::Red);
        }
        match action {
            ReconcileAction::None => cell.fg(Color::DarkGrey),
            ReconcileAction::ScaleUp => cell.fg(Color::Green),
            ReconcileAction::ScaleDown => cell.fg(Color::Cyan),
            ReconcileAction::Skipped => cell.fg(Color::Yellow),
        }
    }

    /// Cell marking the active build driver.
    pub fn active_cell(&self, active: bool) -> Cell {
        match (active, self.use_colors) {
            (true, true) => Cell::new("yes").fg(Color::Green),
            (true, false) => Cell::new("✓ yes"),
            (false, _) => Cell::new("-"),
        }
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}
