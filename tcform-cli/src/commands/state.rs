//! Persisted state command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use serde_json::Value as JsonValue;
use tcform_core::state::{PersistedState, upgrade_state};

use crate::commands::{print_json, read_json};

/// State subcommands
#[derive(Subcommand)]
pub enum StateCommands {
    /// Rewrite a persisted state document in the current schema
    Upgrade {
        /// Path to the state document (JSON)
        file: String,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Handle state commands; none of them talk to the server
pub fn handle_state_command(command: StateCommands) -> Result<()> {
    match command {
        StateCommands::Upgrade { file, output } => upgrade(&file, output.as_deref()),
    }
}

fn upgrade(file: &str, output: Option<&str>) -> Result<()> {
    let raw: JsonValue = read_json(file)?;
    let from_version = raw
        .get("schema_version")
        .and_then(JsonValue::as_u64)
        .unwrap_or(0);

    let state = upgrade_state(raw).with_context(|| format!("Failed to upgrade {}", file))?;
    let envelope = PersistedState::current(&state)?;

    eprintln!(
        "{}",
        format!(
            "✓ Upgraded {} from schema {} to {} ({} step(s))",
            state.id, from_version, envelope.schema_version, state.steps.len()
        )
        .green()
        .bold()
    );

    match output {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&envelope)?)
                .with_context(|| format!("Failed to write file: {}", path))?;
            Ok(())
        }
        None => print_json(&envelope),
    }
}
