//! Build step reconciler
//!
//! Steps are converged by full replacement: when the desired sequence
//! differs from the observed one, every observed step is deleted and every
//! desired step is added again in order. Unchanged steps lose their IDs.

use tcform_core::domain::step::BuildStep;
use tracing::debug;

use crate::error::{Collection, ReconcileError, Result};
use crate::repository::BuildTypeRepository;

/// Whether the observed steps already satisfy the desired sequence
///
/// Steps are compared by position; see [`BuildStep::matches`].
pub fn steps_match(observed: &[BuildStep], desired: &[BuildStep]) -> bool {
    observed.len() == desired.len()
        && desired
            .iter()
            .zip(observed)
            .all(|(want, have)| want.matches(have))
}

/// Converges the steps of `id`
///
/// # Returns
/// The number of remote mutations issued
pub async fn reconcile_steps(
    repo: &dyn BuildTypeRepository,
    id: &str,
    observed: &[BuildStep],
    desired: &[BuildStep],
) -> Result<usize> {
    if steps_match(observed, desired) {
        debug!("steps of '{}' unchanged", id);
        return Ok(0);
    }

    debug!(
        "change detected for steps of '{}': replacing {} with {}",
        id,
        observed.len(),
        desired.len()
    );

    let mut applied = 0;

    for step in observed {
        repo.delete_step(id, step.id())
            .await
            .map_err(|e| ReconcileError::collection_failure(id, Collection::Steps, applied, e))?;
        applied += 1;
        debug!("deleted step '{}' from '{}'", step.id(), id);
    }

    for step in desired {
        let created = repo
            .add_step(id, step)
            .await
            .map_err(|e| ReconcileError::collection_failure(id, Collection::Steps, applied, e))?;
        applied += 1;
        debug!("added step '{}' to '{}'", created.id(), id);
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, CallKind, FakeServer, cmd_step, ps_script, stored_build};

    fn seeded(steps: Vec<BuildStep>) -> (FakeServer, Vec<BuildStep>) {
        let server = FakeServer::new();
        let observed: Vec<BuildStep> = steps
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.with_id(format!("RUNNER_{}", 100 + i)))
            .collect();
        server.seed(stored_build(), observed.clone());
        (server, observed)
    }

    #[tokio::test]
    async fn test_unchanged_steps_issue_no_calls() {
        let (server, observed) = seeded(vec![cmd_step("A", "build.sh")]);

        let applied = reconcile_steps(&server, "Proj_Build", &observed, &[cmd_step("A", "build.sh")])
            .await
            .unwrap();

        assert_eq!(applied, 0);
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn test_appending_replaces_everything() {
        let (server, observed) = seeded(vec![cmd_step("A", "build.sh")]);
        let desired = vec![cmd_step("A", "build.sh"), cmd_step("B", "test.sh")];

        let applied = reconcile_steps(&server, "Proj_Build", &observed, &desired)
            .await
            .unwrap();

        assert_eq!(applied, 3);
        assert_eq!(
            server.calls(),
            vec![
                Call::DeleteStep("Proj_Build".to_string(), "RUNNER_100".to_string()),
                Call::AddStep("Proj_Build".to_string(), "A".to_string()),
                Call::AddStep("Proj_Build".to_string(), "B".to_string()),
            ]
        );
        let names: Vec<_> = server
            .steps("Proj_Build")
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_reorder_is_a_change() {
        let (server, observed) = seeded(vec![cmd_step("A", "a.sh"), cmd_step("B", "b.sh")]);
        let desired = vec![cmd_step("B", "b.sh"), cmd_step("A", "a.sh")];

        reconcile_steps(&server, "Proj_Build", &observed, &desired)
            .await
            .unwrap();

        let names: Vec<_> = server
            .steps("Proj_Build")
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_empty_desired_name_accepts_server_name() {
        let (server, observed) = seeded(vec![ps_script("Step 1", "Write-Host hi")]);

        let applied = reconcile_steps(&server, "Proj_Build", &observed, &[ps_script("", "Write-Host hi")])
            .await
            .unwrap();

        assert_eq!(applied, 0);
    }

    #[tokio::test]
    async fn test_kind_change_is_detected() {
        let (server, observed) = seeded(vec![cmd_step("A", "run")]);
        let desired = vec![ps_script("A", "run")];

        let applied = reconcile_steps(&server, "Proj_Build", &observed, &desired)
            .await
            .unwrap();
        assert_eq!(applied, 2);
    }

    #[tokio::test]
    async fn test_failure_after_delete_is_partial() {
        let (server, observed) = seeded(vec![cmd_step("A", "a.sh")]);
        server.fail_on(CallKind::AddStep, 1);

        let err = reconcile_steps(&server, "Proj_Build", &observed, &[cmd_step("B", "b.sh")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::PartialConvergence {
                collection: Collection::Steps,
                applied: 1,
                ..
            }
        ));
        // the delete stays applied
        assert!(server.steps("Proj_Build").is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_aborts_remaining_calls() {
        let (server, observed) = seeded(vec![cmd_step("A", "a.sh"), cmd_step("B", "b.sh")]);
        server.fail_on(CallKind::DeleteStep, 1);

        let err = reconcile_steps(&server, "Proj_Build", &observed, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Remote { .. }));
        assert_eq!(server.calls().len(), 1);
        assert_eq!(server.steps("Proj_Build").len(), 2);
    }
}
