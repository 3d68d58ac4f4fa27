//! Build configuration repository
//!
//! Handles the server calls for one build configuration:
//! - Reading, creating, updating and deleting the configuration itself
//! - Adding and deleting steps
//! - Attaching and detaching templates
//! - Attaching VCS root entries

use async_trait::async_trait;
use tcform_client::{Result, TeamCityClient};
use tcform_core::domain::build_config::{BuildConfig, NewBuildConfig};
use tcform_core::domain::step::BuildStep;
use tcform_core::domain::vcs::VcsRootEntry;

/// Repository trait for build configuration operations
#[async_trait]
pub trait BuildTypeRepository: Send + Sync {
    /// Reads a build configuration without its steps
    ///
    /// A vanished configuration yields an error for which
    /// `ClientError::is_not_found` holds.
    async fn get(&self, id: &str) -> Result<BuildConfig>;

    /// Creates the shell of a build configuration
    async fn create(&self, new: &NewBuildConfig) -> Result<BuildConfig>;

    /// Writes name, description, parameters and settings in one update
    async fn update(&self, config: &BuildConfig) -> Result<BuildConfig>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Steps in server order
    async fn get_steps(&self, id: &str) -> Result<Vec<BuildStep>>;

    /// Appends a step, returning it with its server-assigned ID
    async fn add_step(&self, id: &str, step: &BuildStep) -> Result<BuildStep>;

    async fn delete_step(&self, id: &str, step_id: &str) -> Result<()>;

    async fn attach_template(&self, id: &str, template_id: &str) -> Result<()>;

    async fn detach_template(&self, id: &str, template_id: &str) -> Result<()>;

    /// Attaches a VCS root, replacing checkout rules if already attached
    async fn attach_vcs_root_entry(&self, id: &str, entry: &VcsRootEntry) -> Result<()>;
}

/// HTTP implementation of BuildTypeRepository
pub struct HttpBuildTypeRepository {
    client: TeamCityClient,
}

impl HttpBuildTypeRepository {
    /// Creates a new HTTP build configuration repository
    pub fn new(client: TeamCityClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BuildTypeRepository for HttpBuildTypeRepository {
    async fn get(&self, id: &str) -> Result<BuildConfig> {
        self.client.get_build_type(id).await
    }

    async fn create(&self, new: &NewBuildConfig) -> Result<BuildConfig> {
        self.client.create_build_type(new).await
    }

    async fn update(&self, config: &BuildConfig) -> Result<BuildConfig> {
        self.client.update_build_type(config).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete_build_type(id).await
    }

    async fn get_steps(&self, id: &str) -> Result<Vec<BuildStep>> {
        self.client.get_steps(id).await
    }

    async fn add_step(&self, id: &str, step: &BuildStep) -> Result<BuildStep> {
        self.client.add_step(id, step).await
    }

    async fn delete_step(&self, id: &str, step_id: &str) -> Result<()> {
        self.client.delete_step(id, step_id).await
    }

    async fn attach_template(&self, id: &str, template_id: &str) -> Result<()> {
        self.client.attach_template(id, template_id).await
    }

    async fn detach_template(&self, id: &str, template_id: &str) -> Result<()> {
        self.client.detach_template(id, template_id).await
    }

    async fn attach_vcs_root_entry(&self, id: &str, entry: &VcsRootEntry) -> Result<()> {
        self.client.attach_vcs_root_entry(id, entry).await
    }
}
