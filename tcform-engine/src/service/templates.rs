//! Template reconciler
//!
//! Templates are converged by set difference on their IDs: missing ones are
//! attached, extra ones detached, shared ones left alone.

use std::collections::BTreeSet;
use tracing::debug;

use crate::error::{Collection, ReconcileError, Result};
use crate::repository::BuildTypeRepository;

/// Template IDs to attach and to detach, in that order of application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDiff {
    pub to_attach: Vec<String>,
    pub to_detach: Vec<String>,
}

impl TemplateDiff {
    pub fn compute(observed: &[String], desired: &[String]) -> Self {
        let have: BTreeSet<&str> = observed.iter().map(String::as_str).collect();
        let want: BTreeSet<&str> = desired.iter().map(String::as_str).collect();

        let mut seen = BTreeSet::new();
        let to_attach = desired
            .iter()
            .filter(|t| !have.contains(t.as_str()) && seen.insert(t.as_str()))
            .cloned()
            .collect();

        let mut seen = BTreeSet::new();
        let to_detach = observed
            .iter()
            .filter(|t| !want.contains(t.as_str()) && seen.insert(t.as_str()))
            .cloned()
            .collect();

        Self {
            to_attach,
            to_detach,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_attach.is_empty() && self.to_detach.is_empty()
    }
}

/// Converges the templates of `id`
///
/// # Returns
/// The number of remote mutations issued
pub async fn reconcile_templates(
    repo: &dyn BuildTypeRepository,
    id: &str,
    observed: &[String],
    desired: &[String],
) -> Result<usize> {
    let diff = TemplateDiff::compute(observed, desired);
    if diff.is_empty() {
        return Ok(0);
    }

    let mut applied = 0;

    for template in &diff.to_attach {
        repo.attach_template(id, template).await.map_err(|e| {
            ReconcileError::collection_failure(id, Collection::Templates, applied, e)
        })?;
        applied += 1;
        debug!("attached template '{}' to '{}'", template, id);
    }

    for template in &diff.to_detach {
        repo.detach_template(id, template).await.map_err(|e| {
            ReconcileError::collection_failure(id, Collection::Templates, applied, e)
        })?;
        applied += 1;
        debug!("detached template '{}' from '{}'", template, id);
    }

    Ok(applied)
}
