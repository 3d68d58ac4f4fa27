//! Reconciliation engine for TeamCity build configurations and project
//! features
//!
//! Given a desired configuration and a handle to the server, the engine
//! reads the current state, works out the difference and issues the remote
//! calls that converge one to the other, one call at a time.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tcform_client::{ClientConfig, TeamCityClient};
//! use tcform_core::domain::build_config::DesiredBuildConfig;
//! use tcform_engine::BuildConfigCoordinator;
//! use tcform_engine::repository::HttpBuildTypeRepository;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = TeamCityClient::new(&ClientConfig::from_env()?)?;
//! let coordinator = BuildConfigCoordinator::new(Arc::new(HttpBuildTypeRepository::new(client)));
//!
//! let desired = DesiredBuildConfig::new("Proj", "Build");
//! let outcome = coordinator.apply(None, &desired).await?;
//! println!("Converged {}", outcome.observed.id);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod repository;
pub mod service;

#[cfg(test)]
mod test_support;

pub use error::{Collection, ReconcileError, Result, Stage};
pub use service::{ApplyOutcome, BuildConfigCoordinator, Observed, ProjectFeatureCoordinator};
