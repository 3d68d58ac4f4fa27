//! Project feature repository

use async_trait::async_trait;
use tcform_client::{Result, TeamCityClient};
use tcform_core::domain::project_feature::ProjectFeature;

/// Repository trait for project feature operations
#[async_trait]
pub trait ProjectFeatureRepository: Send + Sync {
    async fn get(&self, project_id: &str, feature_id: &str) -> Result<ProjectFeature>;

    /// Creates a feature, returning it with its server-assigned ID
    async fn create(&self, feature: &ProjectFeature) -> Result<ProjectFeature>;

    /// Replaces the properties of the feature named by `feature.id`
    async fn update(&self, feature: &ProjectFeature) -> Result<ProjectFeature>;

    async fn delete(&self, project_id: &str, feature_id: &str) -> Result<()>;
}

/// HTTP implementation of ProjectFeatureRepository
pub struct HttpProjectFeatureRepository {
    client: TeamCityClient,
}

impl HttpProjectFeatureRepository {
    pub fn new(client: TeamCityClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProjectFeatureRepository for HttpProjectFeatureRepository {
    async fn get(&self, project_id: &str, feature_id: &str) -> Result<ProjectFeature> {
        self.client.get_project_feature(project_id, feature_id).await
    }

    async fn create(&self, feature: &ProjectFeature) -> Result<ProjectFeature> {
        self.client.create_project_feature(feature).await
    }

    async fn update(&self, feature: &ProjectFeature) -> Result<ProjectFeature> {
        self.client.update_project_feature(feature).await
    }

    async fn delete(&self, project_id: &str, feature_id: &str) -> Result<()> {
        self.client
            .delete_project_feature(project_id, feature_id)
            .await
    }
}
