//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod build_config;
mod feature;
mod state;

pub use build_config::BuildConfigCommands;
pub use feature::FeatureCommands;
pub use state::StateCommands;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build configuration management
    BuildConfig {
        #[command(subcommand)]
        command: BuildConfigCommands,
    },
    /// Project feature management (Slack connection / notifier)
    Feature {
        #[command(subcommand)]
        command: FeatureCommands,
    },
    /// Persisted state maintenance
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::BuildConfig { command } => {
            build_config::handle_build_config_command(command, config).await
        }
        Commands::Feature { command } => feature::handle_feature_command(command, config).await,
        Commands::State { command } => state::handle_state_command(command),
    }
}

/// Reads and parses a JSON file
fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path))?;
    tracing::debug!("Read {} bytes from {}", content.len(), path);
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON in {}", path))
}

/// Prints a value as pretty JSON on stdout
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
