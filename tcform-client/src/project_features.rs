//! Project feature API endpoints

use reqwest::Method;
use tcform_core::domain::project_feature::ProjectFeature;

use crate::TeamCityClient;
use crate::dto::{ProjectFeatureDto, project_feature_from_dto};
use crate::error::{ClientError, Result};

const PROJECTS: &str = "projects";
const PROJECT_FEATURES: &str = "projectFeatures";

fn locator(id: &str) -> String {
    format!("id:{}", id)
}

impl TeamCityClient {
    /// Get a project feature by project and feature ID
    pub async fn get_project_feature(
        &self,
        project_id: &str,
        feature_id: &str,
    ) -> Result<ProjectFeature> {
        let response = self
            .request(
                Method::GET,
                &[
                    PROJECTS,
                    &locator(project_id),
                    PROJECT_FEATURES,
                    &locator(feature_id),
                ],
            )?
            .send()
            .await?;

        let dto: ProjectFeatureDto = self.handle_response(response).await?;
        Ok(project_feature_from_dto(project_id, &dto)?)
    }

    /// Create a project feature
    ///
    /// # Returns
    /// The created feature with its server-assigned ID
    pub async fn create_project_feature(&self, feature: &ProjectFeature) -> Result<ProjectFeature> {
        let mut body = ProjectFeatureDto::from(feature);
        body.id.clear();

        let response = self
            .request(
                Method::POST,
                &[PROJECTS, &locator(&feature.project_id), PROJECT_FEATURES],
            )?
            .json(&body)
            .send()
            .await?;

        let dto: ProjectFeatureDto = self.handle_response(response).await?;
        tracing::debug!("Created project feature {}/{}", feature.project_id, dto.id);
        Ok(project_feature_from_dto(&feature.project_id, &dto)?)
    }

    /// Replace a project feature's properties
    pub async fn update_project_feature(&self, feature: &ProjectFeature) -> Result<ProjectFeature> {
        if feature.id.is_empty() {
            return Err(ClientError::InvalidRequest(
                "project feature update requires an id".to_string(),
            ));
        }

        let response = self
            .request(
                Method::PUT,
                &[
                    PROJECTS,
                    &locator(&feature.project_id),
                    PROJECT_FEATURES,
                    &locator(&feature.id),
                ],
            )?
            .json(&ProjectFeatureDto::from(feature))
            .send()
            .await?;

        let dto: ProjectFeatureDto = self.handle_response(response).await?;
        Ok(project_feature_from_dto(&feature.project_id, &dto)?)
    }

    /// Delete a project feature
    pub async fn delete_project_feature(&self, project_id: &str, feature_id: &str) -> Result<()> {
        let response = self
            .request(
                Method::DELETE,
                &[
                    PROJECTS,
                    &locator(project_id),
                    PROJECT_FEATURES,
                    &locator(feature_id),
                ],
            )?
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credentials;

    #[test]
    fn test_feature_url_encodes_ids() {
        let client = TeamCityClient::with_client(
            "http://localhost:8111",
            Credentials::Token("abc".to_string()),
            reqwest::Client::new(),
        );
        let request = client
            .request(
                Method::GET,
                &[
                    PROJECTS,
                    &locator("Team A"),
                    PROJECT_FEATURES,
                    &locator("PROJECT_EXT_1"),
                ],
            )
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            request.url().path(),
            "/app/rest/projects/id:Team%20A/projectFeatures/id:PROJECT_EXT_1"
        );
    }
}
