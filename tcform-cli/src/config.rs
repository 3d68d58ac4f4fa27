//! Configuration module
//!
//! Server address and credentials as given on the command line or in the
//! environment. Only commands that talk to the server need them.

use anyhow::{Context, Result};
use std::time::Duration;
use tcform_client::{ClientConfig, TeamCityClient};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server base URL
    pub address: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout in seconds
    pub timeout: u64,
}

impl Config {
    /// Resolves the client configuration
    pub fn client_config(&self) -> Result<ClientConfig> {
        let address = self
            .address
            .clone()
            .filter(|a| !a.is_empty())
            .context("server address not set (use --address or TEAMCITY_ADDR)")?;

        let credentials = ClientConfig::resolve_credentials(
            self.token.clone(),
            self.username.clone(),
            self.password.clone(),
        )?;

        let config = ClientConfig::new(address, credentials)
            .with_timeout(Duration::from_secs(self.timeout));
        config.validate()?;

        Ok(config)
    }

    /// Builds a client for the configured server
    pub fn client(&self) -> Result<TeamCityClient> {
        let client = TeamCityClient::new(&self.client_config()?)
            .context("Failed to initialize TeamCity client")?;
        Ok(client)
    }
}
