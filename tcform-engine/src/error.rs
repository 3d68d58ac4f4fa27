//! Error types for reconciliation

use tcform_client::ClientError;
use tcform_core::DomainError;
use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Which part of an apply was running when a remote call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Create,
    Read,
    /// Name, description, parameters and settings
    BaseFields,
    Steps,
    Templates,
    VcsRoots,
    /// Whole-resource update of a project feature
    Update,
    Delete,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Create => "create",
            Stage::Read => "read",
            Stage::BaseFields => "base fields",
            Stage::Steps => "steps",
            Stage::Templates => "templates",
            Stage::VcsRoots => "vcs roots",
            Stage::Update => "update",
            Stage::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Sub-collection converged by a multi-call reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Steps,
    Templates,
    VcsRoots,
}

impl Collection {
    /// Stage reported when the first mutation of this collection fails
    pub fn stage(self) -> Stage {
        match self {
            Collection::Steps => Stage::Steps,
            Collection::Templates => Stage::Templates,
            Collection::VcsRoots => Stage::VcsRoots,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.stage().fmt(f)
    }
}

/// Errors surfaced by an apply, read, delete or import
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Desired configuration is structurally invalid; no remote call was made
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A single value was rejected before any remote call
    #[error("{0}")]
    InvalidValue(DomainError),

    /// The server rejected a call; nothing in the failing stage was applied
    #[error("{stage} failed for '{resource_id}': {source}")]
    Remote {
        resource_id: String,
        stage: Stage,
        #[source]
        source: ClientError,
    },

    /// A collection reconciler failed after some of its mutations succeeded
    ///
    /// Applied mutations are left in place.
    #[error(
        "{collection} partially converged for '{resource_id}' ({applied} change(s) applied before failure): {source}"
    )]
    PartialConvergence {
        resource_id: String,
        collection: Collection,
        applied: usize,
        #[source]
        source: ClientError,
    },

    /// The resource was created but converging it failed
    ///
    /// It exists on the server under `id`; the next apply should target that
    /// ID instead of creating another one.
    #[error("created '{id}' but could not converge it: {source}")]
    CreatedIncomplete {
        id: String,
        #[source]
        source: Box<ReconcileError>,
    },
}

impl ReconcileError {
    pub fn remote(resource_id: impl Into<String>, stage: Stage, source: ClientError) -> Self {
        Self::Remote {
            resource_id: resource_id.into(),
            stage,
            source,
        }
    }

    /// Failure of the mutation following `applied` successful ones
    pub fn collection_failure(
        resource_id: impl Into<String>,
        collection: Collection,
        applied: usize,
        source: ClientError,
    ) -> Self {
        if applied == 0 {
            Self::remote(resource_id, collection.stage(), source)
        } else {
            Self::PartialConvergence {
                resource_id: resource_id.into(),
                collection,
                applied,
                source,
            }
        }
    }

    /// Stage in which a remote failure happened, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Remote { stage, .. } => Some(*stage),
            Self::PartialConvergence { collection, .. } => Some(collection.stage()),
            Self::CreatedIncomplete { source, .. } => source.stage(),
            _ => None,
        }
    }

    /// ID of a resource left behind by a failed create
    pub fn created_id(&self) -> Option<&str> {
        match self {
            Self::CreatedIncomplete { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl From<DomainError> for ReconcileError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidConfiguration(msg) => Self::InvalidConfiguration(msg),
            other => Self::InvalidValue(other),
        }
    }
}
