//! Wire types for the TeamCity REST API
//!
//! The server speaks property lists (`{"property": [{"name", "value"}]}`) for
//! parameters, settings and step configuration. This module maps those onto
//! the domain types in `tcform_core` and back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tcform_core::DomainError;
use tcform_core::domain::build_config::{BuildConfig, NewBuildConfig};
use tcform_core::domain::options::BuildOptions;
use tcform_core::domain::parameter::{Parameter, ParameterCollection};
use tcform_core::domain::project_feature::{FeatureKind, ProjectFeature, SlackOptions};
use tcform_core::domain::step::{BuildStep, StepPayload, StepSpec};
use tcform_core::domain::vcs::VcsRootEntry;

// =============================================================================
// Property lists
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDto {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertiesDto {
    #[serde(default)]
    pub property: Vec<PropertyDto>,
}

impl PropertiesDto {
    fn push(&mut self, name: &str, value: impl Into<String>) {
        self.property.push(PropertyDto {
            name: name.to_string(),
            value: value.into(),
        });
    }

    fn to_map(&self) -> BTreeMap<&str, &str> {
        self.property
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_str()))
            .collect()
    }
}

impl From<&ParameterCollection> for PropertiesDto {
    fn from(params: &ParameterCollection) -> Self {
        let mut out = PropertiesDto::default();
        for param in params.iter() {
            out.push(&param.remote_name(), param.value.clone());
        }
        out
    }
}

impl From<&PropertiesDto> for ParameterCollection {
    fn from(props: &PropertiesDto) -> Self {
        props
            .property
            .iter()
            .map(|p| Parameter::from_remote(&p.name, p.value.clone()))
            .collect()
    }
}

// =============================================================================
// Settings
// =============================================================================

pub const SETTING_CONFIGURATION_TYPE: &str = "buildConfigurationType";
pub const SETTING_NUMBER_FORMAT: &str = "buildNumberPattern";
pub const SETTING_COUNTER: &str = "buildNumberCounter";
pub const SETTING_PERSONAL_BUILDS: &str = "allowPersonalBuildTriggering";
pub const SETTING_ARTIFACT_RULES: &str = "artifactRules";
pub const SETTING_HANGING_DETECTION: &str = "enableHangingBuildsDetection";
pub const SETTING_STATUS_WIDGET: &str = "enableStatusWidget";
pub const SETTING_MAX_RUNNING: &str = "maxRunningBuilds";

/// Settings as `(name, value)` pairs in the order they are written
///
/// A zero counter is the unset sentinel and is not sent.
pub fn settings_properties(options: &BuildOptions) -> Vec<(&'static str, String)> {
    let mut out = vec![
        (
            SETTING_CONFIGURATION_TYPE,
            options.configuration_type.as_str().to_string(),
        ),
        (SETTING_NUMBER_FORMAT, options.build_number_format.clone()),
        (
            SETTING_PERSONAL_BUILDS,
            options.allow_personal_builds.to_string(),
        ),
        (SETTING_ARTIFACT_RULES, options.artifact_paths.join("\n")),
        (SETTING_HANGING_DETECTION, options.detect_hanging.to_string()),
        (SETTING_STATUS_WIDGET, options.status_widget.to_string()),
        (SETTING_MAX_RUNNING, options.concurrent_limit.to_string()),
    ];
    if !options.counter_unset() {
        out.push((SETTING_COUNTER, options.build_counter.to_string()));
    }
    out
}

impl From<&BuildOptions> for PropertiesDto {
    fn from(options: &BuildOptions) -> Self {
        let mut out = PropertiesDto::default();
        for (name, value) in settings_properties(options) {
            out.push(name, value);
        }
        out
    }
}

impl TryFrom<&PropertiesDto> for BuildOptions {
    type Error = DomainError;

    /// Settings the server omits keep their defaults
    fn try_from(props: &PropertiesDto) -> Result<Self, DomainError> {
        let map = props.to_map();
        let mut options = BuildOptions::default();

        if let Some(v) = map.get(SETTING_CONFIGURATION_TYPE) {
            options.configuration_type = v.parse()?;
        }
        if let Some(v) = map.get(SETTING_NUMBER_FORMAT) {
            options.build_number_format = v.to_string();
        }
        if let Some(v) = map.get(SETTING_COUNTER) {
            options.build_counter = parse_number(SETTING_COUNTER, v)?;
        }
        if let Some(v) = map.get(SETTING_PERSONAL_BUILDS) {
            options.allow_personal_builds = parse_bool(SETTING_PERSONAL_BUILDS, v)?;
        }
        if let Some(v) = map.get(SETTING_ARTIFACT_RULES) {
            options.artifact_paths = v
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = map.get(SETTING_HANGING_DETECTION) {
            options.detect_hanging = parse_bool(SETTING_HANGING_DETECTION, v)?;
        }
        if let Some(v) = map.get(SETTING_STATUS_WIDGET) {
            options.status_widget = parse_bool(SETTING_STATUS_WIDGET, v)?;
        }
        if let Some(v) = map.get(SETTING_MAX_RUNNING) {
            options.concurrent_limit = parse_number(SETTING_MAX_RUNNING, v)?;
        }

        Ok(options)
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, DomainError> {
    value
        .parse()
        .map_err(|_| DomainError::invalid_value(field, format!("expected a boolean, got '{}'", value)))
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, DomainError> {
    value
        .parse()
        .map_err(|_| DomainError::invalid_value(field, format!("expected a number, got '{}'", value)))
}

// =============================================================================
// Build steps
// =============================================================================

pub const RUNNER_POWERSHELL: &str = "jetbrains_powershell";
pub const RUNNER_COMMAND_LINE: &str = "simpleRunner";

const PS_MODE: &str = "jetbrains_powershell_script_mode";
const PS_FILE: &str = "jetbrains_powershell_script_file";
const PS_ARGS: &str = "jetbrains_powershell_scriptArguments";
const PS_CODE: &str = "jetbrains_powershell_script_code";
const PS_EXECUTION: &str = "jetbrains_powershell_execution";
const CMD_EXECUTABLE: &str = "command.executable";
const CMD_PARAMETERS: &str = "command.parameters";
const CMD_SCRIPT: &str = "script.content";
const CMD_USE_SCRIPT: &str = "use.custom.script";
const STEP_MODE: &str = "teamcity.step.mode";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDto {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub runner_type: String,
    #[serde(default)]
    pub properties: PropertiesDto,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepsDto {
    #[serde(default)]
    pub step: Vec<StepDto>,
}

impl From<&BuildStep> for StepDto {
    fn from(step: &BuildStep) -> Self {
        let spec = step.spec();
        let mut props = PropertiesDto::default();
        props.push(STEP_MODE, "default");

        let runner_type = match step {
            BuildStep::PowerShell(_) => {
                props.push(PS_EXECUTION, "PS1");
                match &spec.payload {
                    StepPayload::Executable { path, args } => {
                        props.push(PS_MODE, "FILE");
                        props.push(PS_FILE, path.clone());
                        if !args.is_empty() {
                            props.push(PS_ARGS, args.clone());
                        }
                    }
                    StepPayload::Script { body } => {
                        props.push(PS_MODE, "CODE");
                        props.push(PS_CODE, body.clone());
                    }
                }
                RUNNER_POWERSHELL
            }
            BuildStep::CommandLine(_) => {
                match &spec.payload {
                    StepPayload::Executable { path, args } => {
                        props.push(CMD_EXECUTABLE, path.clone());
                        if !args.is_empty() {
                            props.push(CMD_PARAMETERS, args.clone());
                        }
                    }
                    StepPayload::Script { body } => {
                        props.push(CMD_USE_SCRIPT, "true");
                        props.push(CMD_SCRIPT, body.clone());
                    }
                }
                RUNNER_COMMAND_LINE
            }
        };

        StepDto {
            id: spec.id.clone(),
            name: spec.name.clone(),
            runner_type: runner_type.to_string(),
            properties: props,
        }
    }
}

impl TryFrom<&StepDto> for BuildStep {
    type Error = DomainError;

    fn try_from(dto: &StepDto) -> Result<Self, DomainError> {
        let map = dto.properties.to_map();
        let get = |key: &str| map.get(key).map(|v| v.to_string()).unwrap_or_default();

        let step = match dto.runner_type.as_str() {
            RUNNER_POWERSHELL => {
                let payload = if map.get(PS_MODE).copied() == Some("FILE") {
                    StepPayload::Executable {
                        path: get(PS_FILE),
                        args: get(PS_ARGS),
                    }
                } else {
                    StepPayload::Script { body: get(PS_CODE) }
                };
                BuildStep::PowerShell(StepSpec {
                    id: dto.id.clone(),
                    name: dto.name.clone(),
                    payload,
                })
            }
            RUNNER_COMMAND_LINE => {
                let payload = if map.get(CMD_USE_SCRIPT).copied() == Some("true")
                    || map.contains_key(CMD_SCRIPT)
                {
                    StepPayload::Script {
                        body: get(CMD_SCRIPT),
                    }
                } else {
                    StepPayload::Executable {
                        path: get(CMD_EXECUTABLE),
                        args: get(CMD_PARAMETERS),
                    }
                };
                BuildStep::CommandLine(StepSpec {
                    id: dto.id.clone(),
                    name: dto.name.clone(),
                    payload,
                })
            }
            other => return Err(DomainError::UnsupportedStepType(other.to_string())),
        };

        Ok(step)
    }
}

// =============================================================================
// Templates and VCS root entries
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTypeRefDto {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatesDto {
    #[serde(default)]
    pub count: usize,
    #[serde(default, rename = "buildType")]
    pub build_type: Vec<BuildTypeRefDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsRootRefDto {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsRootEntryDto {
    pub id: String,
    #[serde(rename = "vcs-root")]
    pub vcs_root: VcsRootRefDto,
    #[serde(rename = "checkout-rules", default)]
    pub checkout_rules: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsRootEntriesDto {
    #[serde(default, rename = "vcs-root-entry")]
    pub entries: Vec<VcsRootEntryDto>,
}

impl From<&VcsRootEntry> for VcsRootEntryDto {
    fn from(entry: &VcsRootEntry) -> Self {
        Self {
            id: entry.id.clone(),
            vcs_root: VcsRootRefDto {
                id: entry.id.clone(),
            },
            checkout_rules: entry.rules_text(),
        }
    }
}

impl From<&VcsRootEntryDto> for VcsRootEntry {
    fn from(dto: &VcsRootEntryDto) -> Self {
        VcsRootEntry::with_rules(
            dto.vcs_root.id.clone(),
            VcsRootEntry::parse_rules(&dto.checkout_rules),
        )
    }
}

// =============================================================================
// Build types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRefDto {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTypeDto {
    pub id: String,
    pub name: String,
    pub project_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template_flag: bool,
    #[serde(default)]
    pub parameters: Option<PropertiesDto>,
    #[serde(default)]
    pub settings: Option<PropertiesDto>,
    #[serde(default)]
    pub templates: Option<TemplatesDto>,
    #[serde(default, rename = "vcs-root-entries")]
    pub vcs_root_entries: Option<VcsRootEntriesDto>,
}

impl TryFrom<BuildTypeDto> for BuildConfig {
    type Error = DomainError;

    fn try_from(dto: BuildTypeDto) -> Result<Self, DomainError> {
        let options = match &dto.settings {
            Some(settings) => BuildOptions::try_from(settings)?,
            None => BuildOptions::default(),
        };

        Ok(BuildConfig {
            id: dto.id,
            project_id: dto.project_id,
            name: dto.name,
            description: dto.description.unwrap_or_default(),
            is_template: dto.template_flag,
            parameters: dto
                .parameters
                .as_ref()
                .map(ParameterCollection::from)
                .unwrap_or_default(),
            options,
            templates: dto
                .templates
                .map(|t| t.build_type.into_iter().map(|b| b.id).collect())
                .unwrap_or_default(),
            vcs_root_entries: dto
                .vcs_root_entries
                .map(|v| v.entries.iter().map(VcsRootEntry::from).collect())
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildTypeDto {
    pub name: String,
    pub project_id: String,
    pub project: ProjectRefDto,
    pub template_flag: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: PropertiesDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<PropertiesDto>,
}

impl From<&NewBuildConfig> for CreateBuildTypeDto {
    fn from(new: &NewBuildConfig) -> Self {
        Self {
            name: new.name.clone(),
            project_id: new.project_id.clone(),
            project: ProjectRefDto {
                id: new.project_id.clone(),
            },
            template_flag: new.is_template,
            description: new.description.clone(),
            parameters: PropertiesDto::from(&new.parameters),
            settings: new.options.as_ref().map(PropertiesDto::from),
        }
    }
}

// =============================================================================
// Project features
// =============================================================================

pub const FEATURE_TYPE_OAUTH: &str = "OAuthProvider";
const PROVIDER_TYPE: &str = "providerType";
const PROVIDER_SLACK_CONNECTION: &str = "slackConnection";
const PROVIDER_SLACK_NOTIFIER: &str = "slackNotifier";
const SLACK_CLIENT_ID: &str = "clientId";
const SLACK_CLIENT_SECRET: &str = "secure:clientSecret";
const SLACK_DISPLAY_NAME: &str = "displayName";
const SLACK_TOKEN: &str = "secure:token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFeatureDto {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub feature_type: String,
    #[serde(default)]
    pub properties: PropertiesDto,
}

impl From<&ProjectFeature> for ProjectFeatureDto {
    fn from(feature: &ProjectFeature) -> Self {
        let provider = match feature.kind {
            FeatureKind::SlackConnection => PROVIDER_SLACK_CONNECTION,
            FeatureKind::SlackNotifier => PROVIDER_SLACK_NOTIFIER,
        };

        let mut props = PropertiesDto::default();
        props.push(PROVIDER_TYPE, provider);
        props.push(SLACK_CLIENT_ID, feature.options.client_id.clone());
        props.push(SLACK_CLIENT_SECRET, feature.options.client_secret.clone());
        props.push(SLACK_DISPLAY_NAME, feature.options.display_name.clone());
        props.push(SLACK_TOKEN, feature.options.token.clone());

        Self {
            id: feature.id.clone(),
            feature_type: FEATURE_TYPE_OAUTH.to_string(),
            properties: props,
        }
    }
}

/// Rebuilds a project feature; secrets are never returned by the server
pub fn project_feature_from_dto(
    project_id: &str,
    dto: &ProjectFeatureDto,
) -> Result<ProjectFeature, DomainError> {
    let map = dto.properties.to_map();
    let provider = map.get(PROVIDER_TYPE).copied().unwrap_or_default();

    let kind = match (dto.feature_type.as_str(), provider) {
        (FEATURE_TYPE_OAUTH, PROVIDER_SLACK_CONNECTION) => FeatureKind::SlackConnection,
        (FEATURE_TYPE_OAUTH, PROVIDER_SLACK_NOTIFIER) => FeatureKind::SlackNotifier,
        (feature_type, provider) => {
            return Err(DomainError::InvalidConfiguration(format!(
                "project feature '{}' has unsupported type '{}' (provider '{}')",
                dto.id, feature_type, provider
            )));
        }
    };

    let get = |key: &str| map.get(key).map(|v| v.to_string()).unwrap_or_default();

    Ok(ProjectFeature {
        id: dto.id.clone(),
        project_id: project_id.to_string(),
        kind,
        options: SlackOptions {
            client_id: get(SLACK_CLIENT_ID),
            client_secret: String::new(),
            display_name: get(SLACK_DISPLAY_NAME),
            token: String::new(),
        },
    })
}
