//! Build configuration domain types
//!
//! Three shapes of the same resource:
//! - `DesiredBuildConfig`: what the operator asked for
//! - `BuildConfig`: what the server stores (steps are fetched separately)
//! - `ObservedBuildConfig`: the flattened view handed back to the operator

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::domain::options::BuildOptions;
use crate::domain::parameter::{ParameterCollection, ParameterNamespace};
use crate::domain::step::{BuildStep, StepRecord};
use crate::domain::vcs::VcsRootEntry;
use crate::error::{DomainError, Result};

/// Build configuration as stored by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub is_template: bool,
    pub parameters: ParameterCollection,
    pub options: BuildOptions,
    pub templates: Vec<String>,
    pub vcs_root_entries: Vec<VcsRootEntry>,
}

/// Request to create the shell of a build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBuildConfig {
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_template: bool,
    pub parameters: ParameterCollection,
    pub options: Option<BuildOptions>,
}

/// Operator-authored target state of a build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredBuildConfig {
    pub name: String,
    pub project_id: String,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config_params: BTreeMap<String, String>,
    #[serde(default)]
    pub env_params: BTreeMap<String, String>,
    #[serde(default)]
    pub sys_params: BTreeMap<String, String>,
    /// Settings block in list form; `None` leaves the server's settings alone
    #[serde(default)]
    pub settings: Option<Vec<BuildOptions>>,
    /// Ordered steps; `None` leaves the server's steps alone
    #[serde(default)]
    pub steps: Option<Vec<BuildStep>>,
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub vcs_roots: Vec<VcsRootEntry>,
}

impl DesiredBuildConfig {
    pub fn new(project_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            is_template: false,
            description: None,
            config_params: BTreeMap::new(),
            env_params: BTreeMap::new(),
            sys_params: BTreeMap::new(),
            settings: None,
            steps: None,
            templates: Vec::new(),
            vcs_roots: Vec::new(),
        }
    }

    /// Structural checks that must pass before any remote call
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "'name' cannot be empty".to_string(),
            ));
        }

        if self.project_id.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "'project_id' cannot be empty".to_string(),
            ));
        }

        if self.is_template && self.description.is_some() {
            return Err(DomainError::InvalidConfiguration(
                "'description' field is not supported for Build Configuration Templates"
                    .to_string(),
            ));
        }

        if let Some(blocks) = &self.settings {
            BuildOptions::single_block(blocks)?;
        }

        if self.templates.iter().any(|t| t.trim().is_empty()) {
            return Err(DomainError::InvalidConfiguration(
                "template ids cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.vcs_roots {
            if entry.id.trim().is_empty() {
                return Err(DomainError::InvalidConfiguration(
                    "vcs_root id cannot be empty".to_string(),
                ));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(DomainError::InvalidConfiguration(format!(
                    "vcs_root '{}' is listed more than once",
                    entry.id
                )));
            }
        }

        self.parameters()?;

        Ok(())
    }

    /// Merges the three parameter maps into one collection
    pub fn parameters(&self) -> Result<ParameterCollection> {
        ParameterCollection::from_maps(&self.config_params, &self.env_params, &self.sys_params)
    }

    /// The single settings block, if the operator manages settings
    pub fn options(&self) -> Result<Option<&BuildOptions>> {
        self.settings
            .as_deref()
            .map(BuildOptions::single_block)
            .transpose()
    }

    /// Shell-creation request: base fields, parameters and settings
    pub fn to_new(&self) -> Result<NewBuildConfig> {
        Ok(NewBuildConfig {
            project_id: self.project_id.clone(),
            name: self.name.clone(),
            description: if self.is_template {
                None
            } else {
                self.description.clone()
            },
            is_template: self.is_template,
            parameters: self.parameters()?,
            options: self.options()?.cloned(),
        })
    }
}

/// Build configuration as presented back to the operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedBuildConfig {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub is_template: bool,
    /// Omitted for templates, which do not support descriptions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub config_params: BTreeMap<String, String>,
    pub env_params: BTreeMap<String, String>,
    pub sys_params: BTreeMap<String, String>,
    pub settings: BuildOptions,
    pub templates: Vec<String>,
    pub vcs_roots: Vec<VcsRootEntry>,
    pub steps: Vec<StepRecord>,
}

impl ObservedBuildConfig {
    /// Flattens a server read plus its steps
    pub fn from_remote(config: &BuildConfig, steps: &[BuildStep]) -> Self {
        Self {
            id: config.id.clone(),
            project_id: config.project_id.clone(),
            name: config.name.clone(),
            is_template: config.is_template,
            description: if config.is_template {
                None
            } else {
                Some(config.description.clone())
            },
            config_params: config.parameters.filter(ParameterNamespace::Configuration),
            env_params: config.parameters.filter(ParameterNamespace::Environment),
            sys_params: config.parameters.filter(ParameterNamespace::System),
            settings: config.options.clone(),
            templates: config.templates.clone(),
            vcs_roots: config.vcs_root_entries.clone(),
            steps: steps.iter().map(BuildStep::flatten).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parameter::Parameter;

    fn remote() -> BuildConfig {
        BuildConfig {
            id: "Proj_Build".to_string(),
            project_id: "Proj".to_string(),
            name: "Build".to_string(),
            description: "builds things".to_string(),
            is_template: false,
            parameters: vec![
                Parameter::new(ParameterNamespace::Configuration, "version", "1").unwrap(),
                Parameter::new(ParameterNamespace::Environment, "CI", "true").unwrap(),
                Parameter::new(ParameterNamespace::System, "jvm", "17").unwrap(),
            ]
            .into_iter()
            .collect(),
            options: BuildOptions::default(),
            templates: vec!["Proj_Base".to_string()],
            vcs_root_entries: vec![VcsRootEntry::new("Proj_Git")],
        }
    }

    #[test]
    fn test_validate_rejects_template_description() {
        let mut desired = DesiredBuildConfig::new("Proj", "Base");
        desired.is_template = true;
        desired.description = Some("nope".to_string());

        let result = desired.validate();
        assert!(matches!(result, Err(DomainError::InvalidConfiguration(_))));
        assert!(result.unwrap_err().to_string().contains("description"));
    }

    #[test]
    fn test_validate_rejects_bad_settings_and_vcs() {
        let mut desired = DesiredBuildConfig::new("Proj", "Build");
        desired.settings = Some(vec![]);
        assert!(desired.validate().is_err());

        let mut desired = DesiredBuildConfig::new("Proj", "Build");
        desired.vcs_roots = vec![VcsRootEntry::new("A"), VcsRootEntry::new("A")];
        assert!(desired.validate().is_err());

        let mut desired = DesiredBuildConfig::new("Proj", "");
        desired.settings = Some(vec![BuildOptions::default()]);
        assert!(desired.validate().is_err());
    }

    #[test]
    fn test_validate_surfaces_parameter_errors() {
        let mut desired = DesiredBuildConfig::new("Proj", "Build");
        desired.env_params.insert("BAD NAME".to_string(), "x".to_string());
        assert!(matches!(
            desired.validate(),
            Err(DomainError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_to_new_drops_description_for_templates() {
        let mut desired = DesiredBuildConfig::new("Proj", "Base");
        desired.is_template = true;
        let new = desired.to_new().unwrap();
        assert!(new.is_template);
        assert_eq!(new.description, None);
        assert_eq!(new.options, None);
    }

    #[test]
    fn test_observed_from_remote_splits_namespaces() {
        let observed = ObservedBuildConfig::from_remote(&remote(), &[]);
        assert_eq!(observed.config_params.get("version").unwrap(), "1");
        assert_eq!(observed.env_params.get("CI").unwrap(), "true");
        assert_eq!(observed.sys_params.get("jvm").unwrap(), "17");
        assert_eq!(observed.description.as_deref(), Some("builds things"));
        assert!(observed.steps.is_empty());
    }

    #[test]
    fn test_observed_hides_description_for_templates() {
        let mut config = remote();
        config.is_template = true;
        let observed = ObservedBuildConfig::from_remote(&config, &[]);
        assert_eq!(observed.description, None);
    }

    #[test]
    fn test_desired_deserializes_minimal_json() {
        let json = r#"{
            "name": "Build",
            "project_id": "Proj",
            "steps": [{"type": "cmd_line", "file": "build.sh"}],
            "settings": [{"build_counter": 10}]
        }"#;
        let desired: DesiredBuildConfig = serde_json::from_str(json).unwrap();
        assert!(desired.validate().is_ok());
        assert_eq!(desired.steps.as_ref().unwrap().len(), 1);
        assert_eq!(desired.options().unwrap().unwrap().build_counter, 10);
        assert!(desired.templates.is_empty());
    }
}
