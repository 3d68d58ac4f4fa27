//! Client configuration
//!
//! Server address, credentials and request timeout, loaded from the
//! environment or built directly.

use std::time::Duration;

/// How requests authenticate against the server
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Access token, sent as a bearer token
    Token(String),
    /// Username and password, sent as HTTP basic auth
    Basic { username: String, password: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(***)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "https://teamcity.example.com")
    pub address: String,

    pub credentials: Credentials,

    /// Per-request timeout enforced by the HTTP transport
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a new configuration with the default timeout
    pub fn new(address: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            address: address.into(),
            credentials,
            timeout: Duration::from_secs(30),
        }
    }

    /// Picks credentials from the raw values an operator supplied
    ///
    /// A non-empty token wins over username and password.
    pub fn resolve_credentials(
        token: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> anyhow::Result<Credentials> {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            return Ok(Credentials::Token(token));
        }

        match username.filter(|u| !u.is_empty()) {
            Some(username) => Ok(Credentials::Basic {
                username,
                password: password.unwrap_or_default(),
            }),
            None => anyhow::bail!(
                "Error configuring client: either a `token` or `username` must be specified"
            ),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - TEAMCITY_ADDR (required)
    /// - TEAMCITY_TOKEN (optional, wins over username/password)
    /// - TEAMCITY_USER / TEAMCITY_PASSWORD (optional)
    /// - TEAMCITY_TIMEOUT (optional, seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let address = std::env::var("TEAMCITY_ADDR")
            .map_err(|_| anyhow::anyhow!("TEAMCITY_ADDR environment variable not set"))?;

        let credentials = Self::resolve_credentials(
            std::env::var("TEAMCITY_TOKEN").ok(),
            std::env::var("TEAMCITY_USER").ok(),
            std::env::var("TEAMCITY_PASSWORD").ok(),
        )?;

        let timeout = std::env::var("TEAMCITY_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        Ok(Self {
            address,
            credentials,
            timeout,
        })
    }

    /// Sets the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.address.is_empty() {
            anyhow::bail!("address cannot be empty");
        }

        if !self.address.starts_with("http://") && !self.address.starts_with("https://") {
            anyhow::bail!("address must start with http:// or https://");
        }

        match &self.credentials {
            Credentials::Token(token) if token.is_empty() => {
                anyhow::bail!("token cannot be empty");
            }
            Credentials::Basic { username, .. } if username.is_empty() => {
                anyhow::bail!("username cannot be empty");
            }
            _ => {}
        }

        if self.timeout.is_zero() {
            anyhow::bail!("timeout must be greater than 0");
        }

        Ok(())
    }
}
