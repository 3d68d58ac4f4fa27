//! Build configuration API endpoints

use reqwest::Method;
use tcform_core::domain::build_config::{BuildConfig, NewBuildConfig};
use tcform_core::domain::step::BuildStep;
use tcform_core::domain::vcs::VcsRootEntry;

use crate::TeamCityClient;
use crate::dto::{
    BuildTypeDto, BuildTypeRefDto, CreateBuildTypeDto, PropertiesDto, StepDto, StepsDto,
    VcsRootEntryDto,
};
use crate::error::Result;

const BUILD_TYPES: &str = "buildTypes";

/// `id:<id>` locator segment
fn locator(id: &str) -> String {
    format!("id:{}", id)
}

impl TeamCityClient {
    // =============================================================================
    // Build Configuration Management
    // =============================================================================

    /// Get a build configuration by ID
    ///
    /// Steps are not part of the result; use [`TeamCityClient::get_steps`].
    pub async fn get_build_type(&self, id: &str) -> Result<BuildConfig> {
        let response = self
            .request(Method::GET, &[BUILD_TYPES, &locator(id)])?
            .send()
            .await?;

        let dto: BuildTypeDto = self.handle_response(response).await?;
        Ok(BuildConfig::try_from(dto)?)
    }

    /// Create the shell of a build configuration
    ///
    /// # Returns
    /// The created configuration with its server-assigned ID
    pub async fn create_build_type(&self, new: &NewBuildConfig) -> Result<BuildConfig> {
        let body = CreateBuildTypeDto::from(new);
        let response = self
            .request(Method::POST, &[BUILD_TYPES])?
            .json(&body)
            .send()
            .await?;

        let dto: BuildTypeDto = self.handle_response(response).await?;
        tracing::debug!("Created build configuration {}", dto.id);
        Ok(BuildConfig::try_from(dto)?)
    }

    /// Write name, description, parameters and settings, then read back
    ///
    /// Templates have no description; it is skipped for them.
    pub async fn update_build_type(&self, config: &BuildConfig) -> Result<BuildConfig> {
        let id = locator(&config.id);

        let response = self
            .request(Method::PUT, &[BUILD_TYPES, &id, "name"])?
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(config.name.clone())
            .send()
            .await?;
        self.handle_empty_response(response).await?;

        if !config.is_template {
            let response = self
                .request(Method::PUT, &[BUILD_TYPES, &id, "description"])?
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(config.description.clone())
                .send()
                .await?;
            self.handle_empty_response(response).await?;
        }

        let response = self
            .request(Method::PUT, &[BUILD_TYPES, &id, "parameters"])?
            .json(&PropertiesDto::from(&config.parameters))
            .send()
            .await?;
        self.handle_empty_response(response).await?;

        let response = self
            .request(Method::PUT, &[BUILD_TYPES, &id, "settings"])?
            .json(&PropertiesDto::from(&config.options))
            .send()
            .await?;
        self.handle_empty_response(response).await?;

        self.get_build_type(&config.id).await
    }

    /// Delete a build configuration
    pub async fn delete_build_type(&self, id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &[BUILD_TYPES, &locator(id)])?
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Build Steps
    // =============================================================================

    /// List the steps of a build configuration in server order
    pub async fn get_steps(&self, id: &str) -> Result<Vec<BuildStep>> {
        let response = self
            .request(Method::GET, &[BUILD_TYPES, &locator(id), "steps"])?
            .send()
            .await?;

        let dto: StepsDto = self.handle_response(response).await?;
        dto.step
            .iter()
            .map(|s| BuildStep::try_from(s).map_err(Into::into))
            .collect()
    }

    /// Append a step
    ///
    /// # Returns
    /// The step with its server-assigned ID
    pub async fn add_step(&self, id: &str, step: &BuildStep) -> Result<BuildStep> {
        let response = self
            .request(Method::POST, &[BUILD_TYPES, &locator(id), "steps"])?
            .json(&StepDto::from(step))
            .send()
            .await?;

        let dto: StepDto = self.handle_response(response).await?;
        Ok(BuildStep::try_from(&dto)?)
    }

    /// Delete a step by its server-assigned ID
    pub async fn delete_step(&self, id: &str, step_id: &str) -> Result<()> {
        let response = self
            .request(
                Method::DELETE,
                &[BUILD_TYPES, &locator(id), "steps", step_id],
            )?
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Templates
    // =============================================================================

    /// Attach a template to a build configuration
    pub async fn attach_template(&self, id: &str, template_id: &str) -> Result<()> {
        let body = BuildTypeRefDto {
            id: template_id.to_string(),
        };
        let response = self
            .request(Method::POST, &[BUILD_TYPES, &locator(id), "templates"])?
            .json(&body)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Detach a template from a build configuration
    pub async fn detach_template(&self, id: &str, template_id: &str) -> Result<()> {
        let response = self
            .request(
                Method::DELETE,
                &[BUILD_TYPES, &locator(id), "templates", &locator(template_id)],
            )?
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // VCS Root Entries
    // =============================================================================

    /// Attach a VCS root with its checkout rules
    ///
    /// Attaching an already attached root replaces its checkout rules.
    pub async fn attach_vcs_root_entry(&self, id: &str, entry: &VcsRootEntry) -> Result<()> {
        let response = self
            .request(
                Method::POST,
                &[BUILD_TYPES, &locator(id), "vcs-root-entries"],
            )?
            .json(&VcsRootEntryDto::from(entry))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Credentials;

    fn client() -> TeamCityClient {
        TeamCityClient::with_client(
            "http://localhost:8111",
            Credentials::Token("abc".to_string()),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_locator() {
        assert_eq!(locator("Proj_Build"), "id:Proj_Build");
    }

    #[test]
    fn test_template_detach_url_encodes_ids() {
        let request = client()
            .request(
                Method::DELETE,
                &[BUILD_TYPES, &locator("Proj_Build"), "templates", &locator("Tpl/A b")],
            )
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            request.url().path(),
            "/app/rest/buildTypes/id:Proj_Build/templates/id:Tpl%2FA%20b"
        );
    }
}
