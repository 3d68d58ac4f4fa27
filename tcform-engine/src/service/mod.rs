//! Service layer
//!
//! Services hold the reconciliation logic. They decide what to change using
//! the stabilizer and the collection reconcilers, and issue the changes
//! through repositories.

mod build_config;
mod options;
mod project_feature;
mod steps;
mod templates;
mod vcs_roots;

// Re-export coordinators
pub use build_config::{ApplyOutcome, BaseFieldPlan, BuildConfigCoordinator, plan_base_fields};
pub use project_feature::ProjectFeatureCoordinator;

// Re-export building blocks
pub use options::{StabilizedOptions, stabilize};
pub use steps::{reconcile_steps, steps_match};
pub use templates::{TemplateDiff, reconcile_templates};
pub use vcs_roots::reconcile_vcs_roots;

/// Result of reading a resource that may have been deleted out of band
#[derive(Debug, Clone, PartialEq)]
pub enum Observed<T> {
    Present(T),
    /// The server no longer knows the resource; drop it from tracked state
    Absent,
}

impl<T> Observed<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Observed::Absent)
    }
}
