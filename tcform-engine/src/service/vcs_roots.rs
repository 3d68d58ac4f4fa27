//! VCS root entry reconciler
//!
//! Every desired entry is (re)attached with its checkout rules on every
//! apply. Entries attached on the server but no longer desired are left in
//! place: there is no detach path.

use tcform_core::domain::vcs::VcsRootEntry;
use tracing::debug;

use crate::error::{Collection, ReconcileError, Result};
use crate::repository::BuildTypeRepository;

/// Attaches every desired entry to `id`
///
/// # Returns
/// The number of remote mutations issued
pub async fn reconcile_vcs_roots(
    repo: &dyn BuildTypeRepository,
    id: &str,
    desired: &[VcsRootEntry],
) -> Result<usize> {
    let mut applied = 0;

    for entry in desired {
        repo.attach_vcs_root_entry(id, entry).await.map_err(|e| {
            ReconcileError::collection_failure(id, Collection::VcsRoots, applied, e)
        })?;
        applied += 1;
        debug!(
            "attached vcs root '{}' to '{}' ({} checkout rule(s))",
            entry.id,
            id,
            entry.checkout_rules.len()
        );
    }

    Ok(applied)
}
