//! Persisted state shapes
//!
//! Version 0 stored steps as an unordered set; version 1 stores them as an
//! ordered list. `upgrade_state` is the only way from one to the other.
//!
//! State documents are wrapped in an envelope:
//!
//! ```json
//! { "schema_version": 1, "state": { "id": "Proj_Build", "name": "Build", ... } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::domain::build_config::ObservedBuildConfig;
use crate::domain::options::BuildOptions;
use crate::domain::step::StepRecord;
use crate::domain::vcs::VcsRootEntry;

/// Schema version written by this crate
pub const CURRENT_SCHEMA_VERSION: u64 = 1;

/// Errors reading persisted state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to parse persisted state: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported state schema version {0} (newest known is {CURRENT_SCHEMA_VERSION})")]
    UnsupportedVersion(u64),
}

/// Fields whose shape did not change between versions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateAttributes {
    pub name: String,
    pub project_id: String,
    pub is_template: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub config_params: BTreeMap<String, String>,
    pub env_params: BTreeMap<String, String>,
    pub sys_params: BTreeMap<String, String>,
    pub settings: Vec<BuildOptions>,
    pub templates: Vec<String>,
    pub vcs_roots: Vec<VcsRootEntry>,
}

/// Version 0: steps as an unordered set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfigStateV0 {
    pub id: String,
    #[serde(flatten)]
    pub attributes: StateAttributes,
    #[serde(default)]
    pub steps: BTreeSet<StepRecord>,
}

/// Version 1: steps as an ordered list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfigStateV1 {
    pub id: String,
    #[serde(flatten)]
    pub attributes: StateAttributes,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

impl From<BuildConfigStateV0> for BuildConfigStateV1 {
    /// Steps come out in set order: by step id, then type, name, file, args
    /// and code.
    fn from(v0: BuildConfigStateV0) -> Self {
        Self {
            id: v0.id,
            attributes: v0.attributes,
            steps: v0.steps.into_iter().collect(),
        }
    }
}

impl From<&ObservedBuildConfig> for BuildConfigStateV1 {
    fn from(observed: &ObservedBuildConfig) -> Self {
        Self {
            id: observed.id.clone(),
            attributes: StateAttributes {
                name: observed.name.clone(),
                project_id: observed.project_id.clone(),
                is_template: observed.is_template,
                description: observed.description.clone(),
                config_params: observed.config_params.clone(),
                env_params: observed.env_params.clone(),
                sys_params: observed.sys_params.clone(),
                settings: vec![observed.settings.clone()],
                templates: observed.templates.clone(),
                vcs_roots: observed.vcs_roots.clone(),
            },
            steps: observed.steps.clone(),
        }
    }
}

/// Versioned envelope around a state document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub schema_version: u64,
    pub state: Value,
}

impl PersistedState {
    /// Wraps a current-version state document
    pub fn current(state: &BuildConfigStateV1) -> Result<Self, StateError> {
        Ok(Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            state: serde_json::to_value(state)?,
        })
    }
}

/// Reads a persisted state envelope of any known version and returns it in
/// the current shape
pub fn upgrade_state(raw: Value) -> Result<BuildConfigStateV1, StateError> {
    let envelope: PersistedState = serde_json::from_value(raw)?;

    match envelope.schema_version {
        0 => {
            let v0: BuildConfigStateV0 = serde_json::from_value(envelope.state)?;
            Ok(v0.into())
        }
        CURRENT_SCHEMA_VERSION => Ok(serde_json::from_value(envelope.state)?),
        other => Err(StateError::UnsupportedVersion(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, file: &str) -> Value {
        json!({ "step_id": id, "type": "cmd_line", "name": "", "file": file })
    }

    #[test]
    fn test_upgrade_v0_orders_steps_by_id() {
        let raw = json!({
            "schema_version": 0,
            "state": {
                "id": "Proj_Build",
                "name": "Build",
                "project_id": "Proj",
                "steps": [record("RUNNER_9", "b.sh"), record("RUNNER_10", "a.sh"), record("RUNNER_2", "c.sh")]
            }
        });

        let state = upgrade_state(raw).unwrap();
        let ids: Vec<_> = state.steps.iter().map(|s| s.step_id.as_str()).collect();
        assert_eq!(ids, vec!["RUNNER_10", "RUNNER_2", "RUNNER_9"]);
        assert_eq!(state.attributes.name, "Build");
    }

    #[test]
    fn test_upgrade_v0_is_deterministic() {
        let a = json!({ "state": { "id": "x", "steps": [record("S1", "a"), record("S2", "b")] } });
        let b = json!({ "state": { "id": "x", "steps": [record("S2", "b"), record("S1", "a")] } });
        assert_eq!(upgrade_state(a).unwrap(), upgrade_state(b).unwrap());
    }

    #[test]
    fn test_upgrade_v1_keeps_order() {
        let raw = json!({
            "schema_version": 1,
            "state": { "id": "x", "steps": [record("S2", "b"), record("S1", "a")] }
        });
        let state = upgrade_state(raw).unwrap();
        let ids: Vec<_> = state.steps.iter().map(|s| s.step_id.as_str()).collect();
        assert_eq!(ids, vec!["S2", "S1"]);
    }

    #[test]
    fn test_upgrade_rejects_future_version() {
        let raw = json!({ "schema_version": 7, "state": { "id": "x" } });
        assert!(matches!(
            upgrade_state(raw),
            Err(StateError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_current_envelope_round_trip() {
        let state = BuildConfigStateV1 {
            id: "x".to_string(),
            steps: vec![StepRecord {
                step_id: "S1".to_string(),
                step_type: "powershell".to_string(),
                code: Some("Write-Host".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let envelope = PersistedState::current(&state).unwrap();
        let raw = serde_json::to_value(envelope).unwrap();
        assert_eq!(upgrade_state(raw).unwrap(), state);
    }
}
