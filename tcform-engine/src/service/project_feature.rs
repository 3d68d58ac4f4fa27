//! Project feature coordinator
//!
//! Manages Slack connection and Slack notifier features of a project. Unlike
//! build configurations a feature is written whole on every update, and
//! deleting one that is already gone succeeds.

use std::sync::Arc;

use tcform_client::ClientError;
use tcform_core::DomainError;
use tcform_core::domain::project_feature::{
    DesiredProjectFeature, FeatureKind, ImportId, ObservedProjectFeature,
};
use tracing::{debug, info};

use crate::error::{ReconcileError, Result, Stage};
use crate::repository::ProjectFeatureRepository;
use crate::service::Observed;

fn resource_id(project_id: &str, feature_id: &str) -> String {
    format!("{}/{}", project_id, feature_id)
}

/// A feature the client cannot decode is a configuration error, not a remote one
fn read_failure(project_id: &str, feature_id: &str, err: ClientError) -> ReconcileError {
    match err {
        ClientError::Unsupported(DomainError::InvalidConfiguration(msg)) => {
            ReconcileError::InvalidConfiguration(msg)
        }
        other => ReconcileError::remote(resource_id(project_id, feature_id), Stage::Read, other),
    }
}

pub struct ProjectFeatureCoordinator {
    repo: Arc<dyn ProjectFeatureRepository>,
}

impl ProjectFeatureCoordinator {
    pub fn new(repo: Arc<dyn ProjectFeatureRepository>) -> Self {
        Self { repo }
    }

    /// Creates when `feature_id` is `None`, updates otherwise
    pub async fn apply(
        &self,
        feature_id: Option<&str>,
        desired: &DesiredProjectFeature,
    ) -> Result<ObservedProjectFeature> {
        match feature_id {
            Some(feature_id) => self.update(feature_id, desired).await,
            None => self.create(desired).await,
        }
    }

    pub async fn create(&self, desired: &DesiredProjectFeature) -> Result<ObservedProjectFeature> {
        desired.validate()?;

        let created = self
            .repo
            .create(&desired.to_feature(String::new()))
            .await
            .map_err(|e| ReconcileError::remote(&desired.project_id, Stage::Create, e))?;

        info!(
            "Created {} '{}' in project '{}'",
            desired.kind, created.id, desired.project_id
        );

        self.read_back(&desired.project_id, &created.id, desired.kind)
            .await
    }

    pub async fn update(
        &self,
        feature_id: &str,
        desired: &DesiredProjectFeature,
    ) -> Result<ObservedProjectFeature> {
        desired.validate()?;

        self.repo
            .update(&desired.to_feature(feature_id))
            .await
            .map_err(|e| {
                ReconcileError::remote(
                    resource_id(&desired.project_id, feature_id),
                    Stage::Update,
                    e,
                )
            })?;

        debug!(
            "updated {} '{}'",
            desired.kind,
            resource_id(&desired.project_id, feature_id)
        );

        self.read_back(&desired.project_id, feature_id, desired.kind)
            .await
    }

    /// Reads a feature; gone is `Absent`
    ///
    /// With `expected` set, a feature of another kind under the same ID is an
    /// invalid configuration.
    pub async fn read(
        &self,
        project_id: &str,
        feature_id: &str,
        expected: Option<FeatureKind>,
    ) -> Result<Observed<ObservedProjectFeature>> {
        let feature = match self.repo.get(project_id, feature_id).await {
            Ok(feature) => feature,
            Err(e) if e.is_not_found() => {
                debug!(
                    "project feature '{}' not found, removing from state",
                    resource_id(project_id, feature_id)
                );
                return Ok(Observed::Absent);
            }
            Err(e) => return Err(read_failure(project_id, feature_id, e)),
        };

        if let Some(kind) = expected {
            if feature.kind != kind {
                return Err(ReconcileError::InvalidConfiguration(format!(
                    "project feature '{}' is a {}, not a {}",
                    resource_id(project_id, feature_id),
                    feature.kind,
                    kind
                )));
            }
        }

        Ok(Observed::Present(ObservedProjectFeature::from(&feature)))
    }

    async fn read_back(
        &self,
        project_id: &str,
        feature_id: &str,
        kind: FeatureKind,
    ) -> Result<ObservedProjectFeature> {
        match self.read(project_id, feature_id, Some(kind)).await? {
            Observed::Present(observed) => Ok(observed),
            Observed::Absent => Err(ReconcileError::remote(
                resource_id(project_id, feature_id),
                Stage::Read,
                ClientError::NotFound(resource_id(project_id, feature_id)),
            )),
        }
    }

    /// Deletes a feature of any type; already gone counts as deleted
    pub async fn delete(&self, project_id: &str, feature_id: &str) -> Result<()> {
        let id = resource_id(project_id, feature_id);

        match self.repo.delete(project_id, feature_id).await {
            Ok(()) => {
                info!("Deleted project feature '{}'", id);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!("project feature '{}' already gone", id);
                Ok(())
            }
            Err(e) => Err(ReconcileError::remote(id, Stage::Delete, e)),
        }
    }

    /// Adopts an existing feature named `<project-id>/<feature-id>`
    pub async fn import(&self, raw_id: &str) -> Result<Observed<ObservedProjectFeature>> {
        let id = ImportId::parse(raw_id)?;
        self.read(&id.project_id, &id.feature_id, None).await
    }
}
