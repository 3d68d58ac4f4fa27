//! Build step domain types
//!
//! Steps are a closed set of runner kinds. Operator input and persisted state
//! use the flat `StepRecord` shape; everything else works on `BuildStep`.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Record type name for PowerShell steps
pub const POWERSHELL: &str = "powershell";
/// Record type name for command line steps
pub const COMMAND_LINE: &str = "cmd_line";

/// What a step runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepPayload {
    /// An executable or script file with optional arguments
    Executable { path: String, args: String },
    /// An inline script body
    Script { body: String },
}

/// Fields shared by every step kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSpec {
    /// Server-assigned identifier, empty until the step is created
    pub id: String,
    pub name: String,
    pub payload: StepPayload,
}

/// A build step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StepRecord", into = "StepRecord")]
pub enum BuildStep {
    PowerShell(StepSpec),
    CommandLine(StepSpec),
}

impl BuildStep {
    pub fn spec(&self) -> &StepSpec {
        match self {
            BuildStep::PowerShell(spec) | BuildStep::CommandLine(spec) => spec,
        }
    }

    fn spec_mut(&mut self) -> &mut StepSpec {
        match self {
            BuildStep::PowerShell(spec) | BuildStep::CommandLine(spec) => spec,
        }
    }

    pub fn id(&self) -> &str {
        &self.spec().id
    }

    pub fn name(&self) -> &str {
        &self.spec().name
    }

    /// Record type name (`powershell` or `cmd_line`)
    pub fn type_name(&self) -> &'static str {
        match self {
            BuildStep::PowerShell(_) => POWERSHELL,
            BuildStep::CommandLine(_) => COMMAND_LINE,
        }
    }

    /// Returns the step with its server identifier set
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.spec_mut().id = id.into();
        self
    }

    /// Whether `observed` satisfies this desired step
    ///
    /// Identifiers are ignored. An empty desired name accepts whatever name
    /// the server reports.
    pub fn matches(&self, observed: &BuildStep) -> bool {
        let same_kind = matches!(
            (self, observed),
            (BuildStep::PowerShell(_), BuildStep::PowerShell(_))
                | (BuildStep::CommandLine(_), BuildStep::CommandLine(_))
        );
        let desired = self.spec();
        let actual = observed.spec();

        same_kind
            && desired.payload == actual.payload
            && (desired.name.is_empty() || desired.name == actual.name)
    }

    /// Flattens into the persisted record shape
    pub fn flatten(&self) -> StepRecord {
        let spec = self.spec();
        let mut record = StepRecord {
            step_id: spec.id.clone(),
            step_type: self.type_name().to_string(),
            name: spec.name.clone(),
            file: None,
            args: None,
            code: None,
        };

        match &spec.payload {
            StepPayload::Executable { path, args } => {
                record.file = non_empty(path);
                record.args = non_empty(args);
            }
            StepPayload::Script { body } => {
                record.code = non_empty(body);
            }
        }

        record
    }

    /// Expands a persisted record into a typed step
    ///
    /// A non-empty `file` selects the executable payload; otherwise `code`
    /// must hold a script body.
    pub fn expand(record: &StepRecord) -> Result<Self> {
        let file = record.file.clone().unwrap_or_default();
        let payload = if !file.is_empty() {
            StepPayload::Executable {
                path: file,
                args: record.args.clone().unwrap_or_default(),
            }
        } else {
            let body = record.code.clone().unwrap_or_default();
            if body.is_empty() {
                return Err(DomainError::invalid_value(
                    "step",
                    format!(
                        "step '{}' needs either 'file' or 'code'",
                        display_name(record)
                    ),
                ));
            }
            StepPayload::Script { body }
        };

        let spec = StepSpec {
            id: record.step_id.clone(),
            name: record.name.clone(),
            payload,
        };

        match record.step_type.as_str() {
            POWERSHELL => Ok(BuildStep::PowerShell(spec)),
            COMMAND_LINE => Ok(BuildStep::CommandLine(spec)),
            other => Err(DomainError::UnsupportedStepType(other.to_string())),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn display_name(record: &StepRecord) -> &str {
    if record.name.is_empty() {
        &record.step_type
    } else {
        &record.name
    }
}

/// Flat step shape used by operator input and persisted state
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(default)]
    pub step_id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl TryFrom<StepRecord> for BuildStep {
    type Error = DomainError;

    fn try_from(record: StepRecord) -> Result<Self> {
        BuildStep::expand(&record)
    }
}

impl From<BuildStep> for StepRecord {
    fn from(step: BuildStep) -> Self {
        step.flatten()
    }
}
