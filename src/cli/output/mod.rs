//! Output formatting utilities for the CLI.

pub mod table;

use serde::Serialize;

pub use table::TableFormatter;

/// A command result that can be printed for people or for scripts.
pub trait CommandOutput: Serialize {
    /// Human-readable rendering, usually a table.
    fn to_human(&self) -> String;
    /// Machine-readable rendering for `--json`.
    fn to_json(&self) -> serde_json::Value;
}

/// Print a command result in the requested format.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to a maximum length, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// First eight characters of an identifier, for table columns.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Generic success/failure message for mutating commands.
#[derive(Debug, Serialize)]
pub struct ActionOutput<T: Serialize> {
    /// Whether the command did what was asked
    pub success: bool,
    /// One-line summary shown to people
    pub message: String,
    /// The affected record, if there still is one
    pub item: Option<T>,
}

impl<T: Serialize> CommandOutput for ActionOutput<T> {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
