//! Build options (the `settings` block)

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Kind of build configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigurationType {
    #[default]
    Regular,
    Deployment,
    Composite,
}

impl ConfigurationType {
    /// Server spelling of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationType::Regular => "REGULAR",
            ConfigurationType::Deployment => "DEPLOYMENT",
            ConfigurationType::Composite => "COMPOSITE",
        }
    }
}

impl std::str::FromStr for ConfigurationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "REGULAR" => Ok(ConfigurationType::Regular),
            "DEPLOYMENT" => Ok(ConfigurationType::Deployment),
            "COMPOSITE" => Ok(ConfigurationType::Composite),
            other => Err(DomainError::invalid_value(
                "configuration_type",
                format!("expected REGULAR, DEPLOYMENT or COMPOSITE, got '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for ConfigurationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar settings of a build configuration
///
/// `build_counter` is the only field the server advances on its own (every
/// executed build increments it). Zero means "not set by the operator".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub configuration_type: ConfigurationType,
    pub build_number_format: String,
    pub build_counter: u64,
    pub allow_personal_builds: bool,
    pub artifact_paths: Vec<String>,
    pub detect_hanging: bool,
    pub status_widget: bool,
    pub concurrent_limit: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            configuration_type: ConfigurationType::Regular,
            build_number_format: "%build.counter%".to_string(),
            build_counter: 0,
            allow_personal_builds: true,
            artifact_paths: Vec::new(),
            detect_hanging: true,
            status_widget: false,
            concurrent_limit: 0,
        }
    }
}

impl BuildOptions {
    /// Whether the operator left the counter unset
    pub fn counter_unset(&self) -> bool {
        self.build_counter == 0
    }

    /// Equality on every field except the build counter
    pub fn materially_eq(&self, other: &BuildOptions) -> bool {
        self.configuration_type == other.configuration_type
            && self.build_number_format == other.build_number_format
            && self.allow_personal_builds == other.allow_personal_builds
            && self.artifact_paths == other.artifact_paths
            && self.detect_hanging == other.detect_hanging
            && self.status_widget == other.status_widget
            && self.concurrent_limit == other.concurrent_limit
    }

    /// Extracts the single settings block from its list form
    ///
    /// The block is authored as a list holding at most one element; anything
    /// other than exactly one block is rejected.
    pub fn single_block(blocks: &[BuildOptions]) -> Result<&BuildOptions> {
        match blocks {
            [block] => Ok(block),
            [] => Err(DomainError::InvalidConfiguration(
                "settings block is empty".to_string(),
            )),
            _ => Err(DomainError::InvalidConfiguration(format!(
                "expected a single settings block, got {}",
                blocks.len()
            ))),
        }
    }
}
