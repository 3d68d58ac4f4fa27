//! Build configuration coordinator
//!
//! Drives one build configuration through its lifecycle:
//! - `create`: validate, create the shell, then converge like `update`
//! - `update`: converge base fields and settings, VCS roots, steps and
//!   templates, then read back
//! - `read`: flattened observed state, or `Absent` if the server lost it
//! - `delete`: a single remote delete
//!
//! Every remote call is awaited before the next one is issued.

use std::sync::Arc;

use tcform_core::domain::build_config::{BuildConfig, DesiredBuildConfig, ObservedBuildConfig};
use tcform_client::ClientError;
use tracing::{debug, info};

use crate::error::{ReconcileError, Result, Stage};
use crate::repository::BuildTypeRepository;
use crate::service::Observed;
use crate::service::options::stabilize;
use crate::service::steps::reconcile_steps;
use crate::service::templates::reconcile_templates;
use crate::service::vcs_roots::reconcile_vcs_roots;

/// Result of a successful apply
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    /// State read back after converging
    pub observed: ObservedBuildConfig,
    /// The build counter was taken from the server rather than the operator
    pub settings_computed: bool,
    /// Remote mutations issued by this apply, creation included
    pub changes: usize,
}

/// Single update for name, description, parameters and settings
#[derive(Debug, Clone, PartialEq)]
pub struct BaseFieldPlan {
    pub target: BuildConfig,
    pub changed: bool,
    pub settings_computed: bool,
}

/// Works out the base-field update for `desired` against `current`
pub fn plan_base_fields(current: &BuildConfig, desired: &DesiredBuildConfig) -> Result<BaseFieldPlan> {
    let mut target = current.clone();
    let mut changed = false;
    let mut settings_computed = false;

    if desired.name != current.name {
        debug!("change detected for name of '{}'", current.id);
        target.name = desired.name.clone();
        changed = true;
    }

    if !current.is_template {
        if let Some(description) = &desired.description {
            if *description != current.description {
                debug!("change detected for description of '{}'", current.id);
                target.description = description.clone();
                changed = true;
            }
        }
    }

    let parameters = desired.parameters()?;
    if !parameters.same_entries(&current.parameters) {
        debug!("change detected for parameters of '{}'", current.id);
        target.parameters = parameters;
        changed = true;
    }

    if let Some(options) = desired.options()? {
        let stabilized = stabilize(&current.options, options);
        settings_computed = stabilized.computed;
        target.options = stabilized.options;
        changed |= stabilized.changed;
    }

    Ok(BaseFieldPlan {
        target,
        changed,
        settings_computed,
    })
}

pub struct BuildConfigCoordinator {
    repo: Arc<dyn BuildTypeRepository>,
}

impl BuildConfigCoordinator {
    pub fn new(repo: Arc<dyn BuildTypeRepository>) -> Self {
        Self { repo }
    }

    /// Creates when `id` is `None`, updates otherwise
    pub async fn apply(&self, id: Option<&str>, desired: &DesiredBuildConfig) -> Result<ApplyOutcome> {
        match id {
            Some(id) => self.update(id, desired).await,
            None => self.create(desired).await,
        }
    }

    /// Creates the shell with base fields and parameters, then converges the
    /// rest
    pub async fn create(&self, desired: &DesiredBuildConfig) -> Result<ApplyOutcome> {
        desired.validate()?;

        let new = desired.to_new()?;
        let shell = self
            .repo
            .create(&new)
            .await
            .map_err(|e| ReconcileError::remote(&desired.name, Stage::Create, e))?;

        info!(
            "Created build configuration '{}' in project '{}'",
            shell.id, shell.project_id
        );

        let mut outcome = self.update(&shell.id, desired).await.map_err(|e| {
            ReconcileError::CreatedIncomplete {
                id: shell.id.clone(),
                source: Box::new(e),
            }
        })?;
        outcome.changes += 1;
        Ok(outcome)
    }

    /// Converges an existing build configuration
    ///
    /// Order: base fields and settings, VCS roots, steps, templates. The
    /// first failure aborts the rest.
    pub async fn update(&self, id: &str, desired: &DesiredBuildConfig) -> Result<ApplyOutcome> {
        desired.validate()?;

        let current = self
            .repo
            .get(id)
            .await
            .map_err(|e| ReconcileError::remote(id, Stage::Read, e))?;

        if current.is_template != desired.is_template {
            return Err(ReconcileError::InvalidConfiguration(format!(
                "'is_template' of '{}' cannot change after creation",
                id
            )));
        }

        let mut changes = 0;

        let plan = plan_base_fields(&current, desired)?;
        if plan.changed {
            self.repo
                .update(&plan.target)
                .await
                .map_err(|e| ReconcileError::remote(id, Stage::BaseFields, e))?;
            changes += 1;
            debug!("updated base fields of '{}'", id);
        }

        changes += reconcile_vcs_roots(self.repo.as_ref(), id, &desired.vcs_roots).await?;

        if let Some(steps) = &desired.steps {
            let observed_steps = self
                .repo
                .get_steps(id)
                .await
                .map_err(|e| ReconcileError::remote(id, Stage::Steps, e))?;
            changes += reconcile_steps(self.repo.as_ref(), id, &observed_steps, steps).await?;
        }

        changes +=
            reconcile_templates(self.repo.as_ref(), id, &current.templates, &desired.templates)
                .await?;

        let observed = match self.read(id).await? {
            Observed::Present(observed) => observed,
            Observed::Absent => {
                return Err(ReconcileError::remote(
                    id,
                    Stage::Read,
                    ClientError::NotFound(id.to_string()),
                ));
            }
        };

        Ok(ApplyOutcome {
            observed,
            settings_computed: plan.settings_computed,
            changes,
        })
    }

    /// Reads the configuration and its steps
    ///
    /// A configuration the server no longer knows is `Absent`, not an error.
    pub async fn read(&self, id: &str) -> Result<Observed<ObservedBuildConfig>> {
        let config = match self.repo.get(id).await {
            Ok(config) => config,
            Err(e) if e.is_not_found() => {
                debug!("build configuration '{}' not found, removing from state", id);
                return Ok(Observed::Absent);
            }
            Err(e) => return Err(ReconcileError::remote(id, Stage::Read, e)),
        };

        let steps = match self.repo.get_steps(id).await {
            Ok(steps) => steps,
            Err(e) if e.is_not_found() => {
                debug!("build configuration '{}' not found, removing from state", id);
                return Ok(Observed::Absent);
            }
            Err(e) => return Err(ReconcileError::remote(id, Stage::Read, e)),
        };

        Ok(Observed::Present(ObservedBuildConfig::from_remote(
            &config, &steps,
        )))
    }

    /// Deletes the configuration; deleting it twice fails the second time
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.repo
            .delete(id)
            .await
            .map_err(|e| ReconcileError::remote(id, Stage::Delete, e))?;

        info!("Deleted build configuration '{}'", id);
        Ok(())
    }
}
