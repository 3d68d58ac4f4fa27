//! In-memory CI server for engine tests
//!
//! `FakeServer` implements both repository traits, records every call in
//! order and can fail the Nth call of a given kind.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use tcform_client::dto::{PropertiesDto, ProjectFeatureDto, project_feature_from_dto};
use tcform_client::{ClientError, Result};
use tcform_core::domain::build_config::{BuildConfig, DesiredBuildConfig, NewBuildConfig};
use tcform_core::domain::options::BuildOptions;
use tcform_core::domain::project_feature::{
    DesiredProjectFeature, FeatureKind, ProjectFeature,
};
use tcform_core::domain::step::{BuildStep, StepPayload, StepSpec};
use tcform_core::domain::vcs::VcsRootEntry;

use crate::repository::{BuildTypeRepository, ProjectFeatureRepository};

/// A call the engine made, with the identifiers it carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(String),
    Create(String),
    Update(String),
    Delete(String),
    GetSteps(String),
    /// Build configuration ID and step name
    AddStep(String, String),
    /// Build configuration ID and step ID
    DeleteStep(String, String),
    AttachTemplate(String, String),
    DetachTemplate(String, String),
    AttachVcsRoot(String, String),
    GetFeature(String),
    CreateFeature(String),
    UpdateFeature(String),
    DeleteFeature(String),
}

/// Call kinds, for counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CallKind {
    Get,
    Create,
    Update,
    Delete,
    GetSteps,
    AddStep,
    DeleteStep,
    AttachTemplate,
    DetachTemplate,
    AttachVcsRoot,
    GetFeature,
    CreateFeature,
    UpdateFeature,
    DeleteFeature,
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::Get(_) => CallKind::Get,
            Call::Create(_) => CallKind::Create,
            Call::Update(_) => CallKind::Update,
            Call::Delete(_) => CallKind::Delete,
            Call::GetSteps(_) => CallKind::GetSteps,
            Call::AddStep(..) => CallKind::AddStep,
            Call::DeleteStep(..) => CallKind::DeleteStep,
            Call::AttachTemplate(..) => CallKind::AttachTemplate,
            Call::DetachTemplate(..) => CallKind::DetachTemplate,
            Call::AttachVcsRoot(..) => CallKind::AttachVcsRoot,
            Call::GetFeature(_) => CallKind::GetFeature,
            Call::CreateFeature(_) => CallKind::CreateFeature,
            Call::UpdateFeature(_) => CallKind::UpdateFeature,
            Call::DeleteFeature(_) => CallKind::DeleteFeature,
        }
    }

    /// Whether the call changes server state
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self.kind(),
            CallKind::Get | CallKind::GetSteps | CallKind::GetFeature
        )
    }
}

#[derive(Default)]
struct ServerState {
    build_types: BTreeMap<String, BuildConfig>,
    steps: BTreeMap<String, Vec<BuildStep>>,
    features: BTreeMap<(String, String), ProjectFeature>,
    /// Features of types the domain model does not cover, by wire type
    foreign_features: BTreeMap<(String, String), String>,
    calls: Vec<Call>,
    seen: BTreeMap<CallKind, usize>,
    failures: Vec<(CallKind, usize)>,
    next_id: u64,
}

impl ServerState {
    /// Records a call and fails it if a failure was injected for it
    fn record(&mut self, call: Call) -> Result<()> {
        let kind = call.kind();
        let count = self.seen.entry(kind).or_default();
        *count += 1;
        let nth = *count;
        self.calls.push(call);

        if self.failures.contains(&(kind, nth)) {
            return Err(ClientError::api_error(
                500,
                format!("injected failure on {:?} #{}", kind, nth),
            ));
        }
        Ok(())
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn build_type(&self, id: &str) -> Result<&BuildConfig> {
        self.build_types
            .get(id)
            .ok_or_else(|| ClientError::NotFound(format!("buildTypes/id:{}", id)))
    }

    fn build_type_mut(&mut self, id: &str) -> Result<&mut BuildConfig> {
        self.build_types
            .get_mut(id)
            .ok_or_else(|| ClientError::NotFound(format!("buildTypes/id:{}", id)))
    }
}

/// Secrets are write-only on the server
fn without_secrets(feature: &ProjectFeature) -> ProjectFeature {
    let mut out = feature.clone();
    out.options.client_secret.clear();
    out.options.token.clear();
    out
}

#[derive(Default)]
pub struct FakeServer {
    state: Mutex<ServerState>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the `nth` (1-based) call of `kind` with a 500
    pub fn fail_on(&self, kind: CallKind, nth: usize) {
        self.state.lock().unwrap().failures.push((kind, nth));
    }

    /// Stores a build configuration and its steps without recording a call
    pub fn seed(&self, config: BuildConfig, steps: Vec<BuildStep>) {
        let mut state = self.state.lock().unwrap();
        state.steps.insert(config.id.clone(), steps);
        state.build_types.insert(config.id.clone(), config);
    }

    pub fn seed_feature(&self, feature: ProjectFeature) {
        let mut state = self.state.lock().unwrap();
        state
            .features
            .insert((feature.project_id.clone(), feature.id.clone()), feature);
    }

    /// Stores a feature of another type, e.g. `versionedSettings`
    pub fn seed_foreign_feature(&self, project_id: &str, feature_id: &str, feature_type: &str) {
        self.state.lock().unwrap().foreign_features.insert(
            (project_id.to_string(), feature_id.to_string()),
            feature_type.to_string(),
        );
    }

    pub fn has_feature(&self, project_id: &str, feature_id: &str) -> bool {
        let state = self.state.lock().unwrap();
        let key = (project_id.to_string(), feature_id.to_string());
        state.features.contains_key(&key) || state.foreign_features.contains_key(&key)
    }

    /// Simulates builds running: bumps the stored build counter
    pub fn advance_counter(&self, id: &str, by: u64) {
        let mut state = self.state.lock().unwrap();
        if let Some(config) = state.build_types.get_mut(id) {
            config.options.build_counter += by;
        }
    }

    pub fn build_type(&self, id: &str) -> Option<BuildConfig> {
        self.state.lock().unwrap().build_types.get(id).cloned()
    }

    pub fn steps(&self, id: &str) -> Vec<BuildStep> {
        self.state
            .lock()
            .unwrap()
            .steps
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn feature(&self, project_id: &str, feature_id: &str) -> Option<ProjectFeature> {
        self.state
            .lock()
            .unwrap()
            .features
            .get(&(project_id.to_string(), feature_id.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        let mut state = self.state.lock().unwrap();
        state.calls.clear();
        state.seen.clear();
    }
}

#[async_trait]
impl BuildTypeRepository for FakeServer {
    async fn get(&self, id: &str) -> Result<BuildConfig> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::Get(id.to_string()))?;
        state.build_type(id).cloned()
    }

    async fn create(&self, new: &NewBuildConfig) -> Result<BuildConfig> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::Create(new.name.clone()))?;

        let id = format!("{}_{}", new.project_id, new.name.replace(' ', ""));
        if state.build_types.contains_key(&id) {
            return Err(ClientError::api_error(400, format!("'{}' already exists", id)));
        }

        let mut options = new.options.clone().unwrap_or_default();
        if options.counter_unset() {
            options.build_counter = 1;
        }

        let config = BuildConfig {
            id: id.clone(),
            project_id: new.project_id.clone(),
            name: new.name.clone(),
            description: new.description.clone().unwrap_or_default(),
            is_template: new.is_template,
            parameters: new.parameters.clone(),
            options,
            templates: Vec::new(),
            vcs_root_entries: Vec::new(),
        };
        state.steps.insert(id.clone(), Vec::new());
        state.build_types.insert(id, config.clone());
        Ok(config)
    }

    async fn update(&self, config: &BuildConfig) -> Result<BuildConfig> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::Update(config.id.clone()))?;

        let stored = state.build_type_mut(&config.id)?;
        let counter = stored.options.build_counter;
        stored.name = config.name.clone();
        if !stored.is_template {
            stored.description = config.description.clone();
        }
        stored.parameters = config.parameters.clone();
        stored.options = config.options.clone();
        // an unset counter is not sent, so the server keeps its own
        if config.options.counter_unset() {
            stored.options.build_counter = counter;
        }
        Ok(stored.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::Delete(id.to_string()))?;
        state.build_type(id)?;
        state.build_types.remove(id);
        state.steps.remove(id);
        Ok(())
    }

    async fn get_steps(&self, id: &str) -> Result<Vec<BuildStep>> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::GetSteps(id.to_string()))?;
        state.build_type(id)?;
        Ok(state.steps.get(id).cloned().unwrap_or_default())
    }

    async fn add_step(&self, id: &str, step: &BuildStep) -> Result<BuildStep> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::AddStep(id.to_string(), step.name().to_string()))?;
        state.build_type(id)?;

        let n = state.next_id();
        let created = step.clone().with_id(format!("RUNNER_{}", n));
        state
            .steps
            .entry(id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn delete_step(&self, id: &str, step_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::DeleteStep(id.to_string(), step_id.to_string()))?;

        let steps = state.steps.entry(id.to_string()).or_default();
        let before = steps.len();
        steps.retain(|s| s.id() != step_id);
        if steps.len() == before {
            return Err(ClientError::NotFound(format!("step {}", step_id)));
        }
        Ok(())
    }

    async fn attach_template(&self, id: &str, template_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::AttachTemplate(id.to_string(), template_id.to_string()))?;

        let stored = state.build_type_mut(id)?;
        if !stored.templates.iter().any(|t| t == template_id) {
            stored.templates.push(template_id.to_string());
        }
        Ok(())
    }

    async fn detach_template(&self, id: &str, template_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::DetachTemplate(id.to_string(), template_id.to_string()))?;

        let stored = state.build_type_mut(id)?;
        let before = stored.templates.len();
        stored.templates.retain(|t| t != template_id);
        if stored.templates.len() == before {
            return Err(ClientError::NotFound(format!("template {}", template_id)));
        }
        Ok(())
    }

    async fn attach_vcs_root_entry(&self, id: &str, entry: &VcsRootEntry) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::AttachVcsRoot(id.to_string(), entry.id.clone()))?;

        let stored = state.build_type_mut(id)?;
        match stored.vcs_root_entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => stored.vcs_root_entries.push(entry.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectFeatureRepository for FakeServer {
    async fn get(&self, project_id: &str, feature_id: &str) -> Result<ProjectFeature> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::GetFeature(feature_id.to_string()))?;

        let key = (project_id.to_string(), feature_id.to_string());
        if let Some(feature_type) = state.foreign_features.get(&key) {
            // decoded the way the HTTP client decodes it
            let dto = ProjectFeatureDto {
                id: feature_id.to_string(),
                feature_type: feature_type.clone(),
                properties: PropertiesDto::default(),
            };
            return Ok(project_feature_from_dto(project_id, &dto)?);
        }

        state
            .features
            .get(&key)
            .map(without_secrets)
            .ok_or_else(|| ClientError::NotFound(format!("projectFeatures/id:{}", feature_id)))
    }

    async fn create(&self, feature: &ProjectFeature) -> Result<ProjectFeature> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CreateFeature(feature.project_id.clone()))?;

        let n = state.next_id();
        let mut created = feature.clone();
        created.id = format!("PROJECT_EXT_{}", n);
        state.features.insert(
            (created.project_id.clone(), created.id.clone()),
            created.clone(),
        );
        Ok(without_secrets(&created))
    }

    async fn update(&self, feature: &ProjectFeature) -> Result<ProjectFeature> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::UpdateFeature(feature.id.clone()))?;

        let key = (feature.project_id.clone(), feature.id.clone());
        if !state.features.contains_key(&key) {
            return Err(ClientError::NotFound(format!(
                "projectFeatures/id:{}",
                feature.id
            )));
        }
        state.features.insert(key, feature.clone());
        Ok(without_secrets(feature))
    }

    async fn delete(&self, project_id: &str, feature_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::DeleteFeature(feature_id.to_string()))?;

        let key = (project_id.to_string(), feature_id.to_string());
        if state.foreign_features.remove(&key).is_some() {
            return Ok(());
        }
        state
            .features
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound(format!("projectFeatures/id:{}", feature_id)))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn cmd_step(name: &str, file: &str) -> BuildStep {
    BuildStep::CommandLine(StepSpec {
        id: String::new(),
        name: name.to_string(),
        payload: StepPayload::Executable {
            path: file.to_string(),
            args: String::new(),
        },
    })
}

pub fn ps_script(name: &str, body: &str) -> BuildStep {
    BuildStep::PowerShell(StepSpec {
        id: String::new(),
        name: name.to_string(),
        payload: StepPayload::Script {
            body: body.to_string(),
        },
    })
}

/// A non-template configuration in project `Proj` named `Build`
pub fn desired_build() -> DesiredBuildConfig {
    let mut desired = DesiredBuildConfig::new("Proj", "Build");
    desired.description = Some("main build".to_string());
    desired
        .env_params
        .insert("CI".to_string(), "true".to_string());
    desired
}

/// The server-side counterpart of [`desired_build`], stored as `Proj_Build`
pub fn stored_build() -> BuildConfig {
    BuildConfig {
        id: "Proj_Build".to_string(),
        project_id: "Proj".to_string(),
        name: "Build".to_string(),
        description: "main build".to_string(),
        is_template: false,
        parameters: desired_build()
            .parameters()
            .unwrap_or_default(),
        options: BuildOptions {
            build_counter: 1,
            ..BuildOptions::default()
        },
        templates: Vec::new(),
        vcs_root_entries: Vec::new(),
    }
}

pub fn slack_connection(project_id: &str) -> DesiredProjectFeature {
    DesiredProjectFeature {
        project_id: project_id.to_string(),
        kind: FeatureKind::SlackConnection,
        client_id: "client-1".to_string(),
        client_secret: "s3cret".to_string(),
        display_name: "Slack".to_string(),
        token: "xoxb-1".to_string(),
    }
}
