//! Project feature domain types (Slack connection / notifier)

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Which Slack integration a project feature configures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    SlackConnection,
    SlackNotifier,
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureKind::SlackConnection => write!(f, "slack connection"),
            FeatureKind::SlackNotifier => write!(f, "slack notifier"),
        }
    }
}

/// Slack app credentials and display settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackOptions {
    pub client_id: String,
    pub client_secret: String,
    pub display_name: String,
    pub token: String,
}

/// Project feature as stored by the server
///
/// The server never returns secrets, so `client_secret` and `token` are empty
/// on anything read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFeature {
    /// Server-assigned identifier, empty until created
    pub id: String,
    pub project_id: String,
    pub kind: FeatureKind,
    pub options: SlackOptions,
}

/// Operator-authored project feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredProjectFeature {
    pub project_id: String,
    pub kind: FeatureKind,
    pub client_id: String,
    pub client_secret: String,
    pub display_name: String,
    pub token: String,
}

impl DesiredProjectFeature {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("project_id", &self.project_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("display_name", &self.display_name),
            ("token", &self.token),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidConfiguration(format!(
                    "'{}' is required",
                    field
                )));
            }
        }
        Ok(())
    }

    /// Server representation carrying `id`
    pub fn to_feature(&self, id: impl Into<String>) -> ProjectFeature {
        ProjectFeature {
            id: id.into(),
            project_id: self.project_id.clone(),
            kind: self.kind,
            options: SlackOptions {
                client_id: self.client_id.clone(),
                client_secret: self.client_secret.clone(),
                display_name: self.display_name.clone(),
                token: self.token.clone(),
            },
        }
    }
}

/// Project feature as presented back to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedProjectFeature {
    pub id: String,
    pub project_id: String,
    pub kind: FeatureKind,
    pub client_id: String,
    pub display_name: String,
}

impl From<&ProjectFeature> for ObservedProjectFeature {
    fn from(feature: &ProjectFeature) -> Self {
        Self {
            id: feature.id.clone(),
            project_id: feature.project_id.clone(),
            kind: feature.kind,
            client_id: feature.options.client_id.clone(),
            display_name: feature.options.display_name.clone(),
        }
    }
}

/// External identifier of a project feature: `<project-id>/<feature-id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportId {
    pub project_id: String,
    pub feature_id: String,
}

impl ImportId {
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split('/').collect();
        match parts.as_slice() {
            [project_id, feature_id] if !project_id.is_empty() && !feature_id.is_empty() => {
                Ok(Self {
                    project_id: project_id.to_string(),
                    feature_id: feature_id.to_string(),
                })
            }
            _ => Err(DomainError::InvalidConfiguration(format!(
                "unexpected format for ID ({}), use: '<project-id>/<feature-id>'",
                raw
            ))),
        }
    }
}

impl std::str::FromStr for ImportId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        ImportId::parse(s)
    }
}

impl std::fmt::Display for ImportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project_id, self.feature_id)
    }
}
