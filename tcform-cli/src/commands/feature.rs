//! Project feature command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use std::sync::Arc;
use tcform_core::domain::project_feature::{DesiredProjectFeature, ImportId};
use tcform_engine::repository::HttpProjectFeatureRepository;
use tcform_engine::{Observed, ProjectFeatureCoordinator};

use crate::commands::{print_json, read_json};
use crate::config::Config;

/// Project feature subcommands
#[derive(Subcommand)]
pub enum FeatureCommands {
    /// Create or update a project feature from a JSON description
    Apply {
        /// Path to the desired feature (JSON)
        file: String,

        /// Feature ID within the project; creates one if omitted
        #[arg(long)]
        id: Option<String>,
    },
    /// Show a project feature
    Read {
        /// Feature identifier as <project-id>/<feature-id>
        id: String,
    },
    /// Adopt an existing project feature
    Import {
        /// Feature identifier as <project-id>/<feature-id>
        id: String,
    },
    /// Delete a project feature (succeeds if already gone)
    Delete {
        /// Feature identifier as <project-id>/<feature-id>
        id: String,
    },
}

/// Handle project feature commands
pub async fn handle_feature_command(command: FeatureCommands, config: &Config) -> Result<()> {
    let repo = HttpProjectFeatureRepository::new(config.client()?);
    let coordinator = ProjectFeatureCoordinator::new(Arc::new(repo));

    match command {
        FeatureCommands::Apply { file, id } => {
            let desired: DesiredProjectFeature = read_json(&file)?;
            let observed = coordinator.apply(id.as_deref(), &desired).await?;

            eprintln!(
                "{}",
                format!("✓ {} {}/{} applied", observed.kind, observed.project_id, observed.id)
                    .green()
                    .bold()
            );
            print_json(&observed)
        }
        FeatureCommands::Read { id } => {
            let id = ImportId::parse(&id)?;
            let observed = coordinator
                .read(&id.project_id, &id.feature_id, None)
                .await?;
            print_observed(&id, observed)
        }
        FeatureCommands::Import { id } => {
            let observed = coordinator.import(&id).await?;
            let id = ImportId::parse(&id)?;
            if !observed.is_absent() {
                eprintln!("{}", format!("✓ Imported {}", id).green().bold());
            }
            print_observed(&id, observed)
        }
        FeatureCommands::Delete { id } => {
            let id = ImportId::parse(&id)?;
            coordinator.delete(&id.project_id, &id.feature_id).await?;
            eprintln!("{}", format!("✓ Project feature {} deleted", id).green().bold());
            Ok(())
        }
    }
}

fn print_observed<T: serde::Serialize>(id: &ImportId, observed: Observed<T>) -> Result<()> {
    match observed {
        Observed::Present(value) => print_json(&value),
        Observed::Absent => {
            eprintln!("{}", format!("Project feature {} not found", id).yellow());
            Ok(())
        }
    }
}
