//! TeamCity HTTP Client
//!
//! A typed client for the parts of the TeamCity REST API the reconciliation
//! engine needs: build configurations with their steps, templates and VCS
//! root entries, and project features.
//!
//! # Example
//!
//! ```no_run
//! use tcform_client::{ClientConfig, Credentials, TeamCityClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::new(
//!         "http://localhost:8111",
//!         Credentials::Token("token".to_string()),
//!     );
//!     let client = TeamCityClient::new(&config)?;
//!
//!     let build_type = client.get_build_type("Proj_Build").await?;
//!     println!("Read build configuration: {}", build_type.name);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dto;
pub mod error;
mod build_types;
mod project_features;

// Re-export commonly used types
pub use config::{ClientConfig, Credentials};
pub use error::{ClientError, Result};

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the TeamCity REST API
///
/// Methods are organized into groups:
/// - Build configuration management (get, create, update, delete)
/// - Build step, template and VCS root entry collections
/// - Project features
#[derive(Debug, Clone)]
pub struct TeamCityClient {
    /// Base URL of the server (e.g., "http://localhost:8111")
    base_url: String,
    /// HTTP client instance, carries the request timeout
    client: Client,
    credentials: Credentials,
}

impl TeamCityClient {
    /// Create a new client from configuration
    ///
    /// The configured timeout is applied to every request by the transport.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(
            config.address.clone(),
            config.credentials.clone(),
            client,
        ))
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        credentials: Credentials,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            credentials,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of a REST API path
    ///
    /// Each segment is percent-encoded, so IDs containing `/`, `?` or `#`
    /// stay inside their segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidRequest(format!("invalid server address '{}': {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidRequest(format!(
                    "server address '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["app", "rest"])
            .extend(segments);

        Ok(url)
    }

    /// Start an authenticated JSON request
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let builder = self
            .client
            .request(method, self.url(segments)?)
            .header(reqwest::header::ACCEPT, "application/json");

        Ok(match &self.credentials {
            Credentials::Token(token) => builder.bearer_auth(token),
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        })
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Turn a non-success status into an error
    ///
    /// 404 becomes `NotFound` so callers can tell a vanished resource apart
    /// from other failures.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("{} returned 404: {}", url, error_text);
            return Err(ClientError::NotFound(url));
        }

        Err(ClientError::api_error(status.as_u16(), error_text))
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not needed (DELETE, text PUT)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await?;
        Ok(())
    }
}
