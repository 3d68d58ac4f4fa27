//! Build configuration command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::sync::Arc;
use tcform_core::domain::build_config::DesiredBuildConfig;
use tcform_core::state::{BuildConfigStateV1, PersistedState};
use tcform_engine::repository::HttpBuildTypeRepository;
use tcform_engine::{BuildConfigCoordinator, Observed};

use crate::commands::{print_json, read_json};
use crate::config::Config;

/// Build configuration subcommands
#[derive(Subcommand)]
pub enum BuildConfigCommands {
    /// Create or converge a build configuration from a JSON description
    Apply {
        /// Path to the desired configuration (JSON)
        file: String,

        /// ID of an existing build configuration; creates one if omitted
        #[arg(long)]
        id: Option<String>,

        /// Write the resulting persisted state to this file
        #[arg(long)]
        state: Option<String>,
    },
    /// Show the observed state of a build configuration
    Read {
        /// Build configuration ID
        id: String,
    },
    /// Delete a build configuration
    Delete {
        /// Build configuration ID
        id: String,
    },
}

/// Handle build configuration commands
pub async fn handle_build_config_command(
    command: BuildConfigCommands,
    config: &Config,
) -> Result<()> {
    let repo = HttpBuildTypeRepository::new(config.client()?);
    let coordinator = BuildConfigCoordinator::new(Arc::new(repo));

    match command {
        BuildConfigCommands::Apply { file, id, state } => {
            apply(&coordinator, &file, id.as_deref(), state.as_deref()).await
        }
        BuildConfigCommands::Read { id } => read(&coordinator, &id).await,
        BuildConfigCommands::Delete { id } => delete(&coordinator, &id).await,
    }
}

async fn apply(
    coordinator: &BuildConfigCoordinator,
    file: &str,
    id: Option<&str>,
    state_path: Option<&str>,
) -> Result<()> {
    let desired: DesiredBuildConfig = read_json(file)?;

    let outcome = match coordinator.apply(id, &desired).await {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some(created) = err.created_id() {
                eprintln!(
                    "{}",
                    format!(
                        "! Build configuration {} was created; re-run with --id {}",
                        created, created
                    )
                    .yellow()
                );
            }
            return Err(err.into());
        }
    };

    let verb = if id.is_some() { "converged" } else { "created" };
    eprintln!(
        "{}",
        format!("✓ Build configuration {} {}", outcome.observed.id, verb)
            .green()
            .bold()
    );
    eprintln!("  Changes: {}", outcome.changes.to_string().cyan());
    if outcome.settings_computed {
        eprintln!(
            "  {}",
            format!(
                "Build counter taken from server: {}",
                outcome.observed.settings.build_counter
            )
            .dimmed()
        );
    }

    if let Some(path) = state_path {
        let envelope = PersistedState::current(&BuildConfigStateV1::from(&outcome.observed))?;
        std::fs::write(path, serde_json::to_string_pretty(&envelope)?)
            .with_context(|| format!("Failed to write state file: {}", path))?;
        eprintln!("  State:   {}", path.dimmed());
    }

    print_json(&outcome.observed)
}

async fn read(coordinator: &BuildConfigCoordinator, id: &str) -> Result<()> {
    match coordinator.read(id).await? {
        Observed::Present(observed) => print_json(&observed),
        Observed::Absent => {
            eprintln!("{}", format!("Build configuration {} not found", id).yellow());
            Ok(())
        }
    }
}

async fn delete(coordinator: &BuildConfigCoordinator, id: &str) -> Result<()> {
    coordinator.delete(id).await?;

    eprintln!(
        "{}",
        format!("✓ Build configuration {} deleted", id).green().bold()
    );
    Ok(())
}
