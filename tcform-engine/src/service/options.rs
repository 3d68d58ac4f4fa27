//! Options stabilizer
//!
//! Decides whether the desired settings block differs from the one just read
//! and, when the build counter is the only difference, which counter wins.
//! The server advances the counter on every build, so a literal copied from
//! an earlier read must not show up as a change.

use tcform_core::domain::options::BuildOptions;
use tracing::{debug, info};

/// Settings block to converge towards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilizedOptions {
    pub options: BuildOptions,
    /// The counter was adopted from the server
    pub computed: bool,
    /// `options` differs from what the server holds
    pub changed: bool,
}

/// Stabilizes `desired` against `observed`
///
/// Rules, with "material" meaning every field but the counter:
/// - materially different: `desired` as authored, counter included
/// - same counters: nothing to do
/// - desired counter unset, or behind the server: adopt the server's counter
/// - desired counter ahead of the server: send it
pub fn stabilize(observed: &BuildOptions, desired: &BuildOptions) -> StabilizedOptions {
    if !desired.materially_eq(observed) {
        debug!("change detected for settings");
        return StabilizedOptions {
            options: desired.clone(),
            computed: false,
            changed: true,
        };
    }

    if desired.build_counter == observed.build_counter {
        return StabilizedOptions {
            options: desired.clone(),
            computed: false,
            changed: false,
        };
    }

    if desired.counter_unset() || observed.build_counter > desired.build_counter {
        info!(
            "adopting server build counter {} (configured {})",
            observed.build_counter, desired.build_counter
        );
        return StabilizedOptions {
            options: BuildOptions {
                build_counter: observed.build_counter,
                ..desired.clone()
            },
            computed: true,
            changed: false,
        };
    }

    debug!(
        "advancing build counter from {} to {}",
        observed.build_counter, desired.build_counter
    );
    StabilizedOptions {
        options: desired.clone(),
        computed: false,
        changed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcform_core::domain::options::ConfigurationType;

    fn with_counter(counter: u64) -> BuildOptions {
        BuildOptions {
            build_counter: counter,
            ..BuildOptions::default()
        }
    }

    #[test]
    fn test_unset_counter_adopts_server_value() {
        let result = stabilize(&with_counter(42), &with_counter(0));
        assert_eq!(result.options.build_counter, 42);
        assert!(result.computed);
        assert!(!result.changed);
    }

    #[test]
    fn test_stale_counter_adopts_server_value() {
        for (desired, observed) in [(1, 2), (5, 80), (99, 100)] {
            let result = stabilize(&with_counter(observed), &with_counter(desired));
            assert_eq!(result.options.build_counter, observed);
            assert!(result.computed);
            assert!(!result.changed);
        }
    }

    #[test]
    fn test_explicit_counter_ahead_is_sent() {
        for (desired, observed) in [(3, 2), (500, 1)] {
            let result = stabilize(&with_counter(observed), &with_counter(desired));
            assert_eq!(result.options.build_counter, desired);
            assert!(!result.computed);
            assert!(result.changed);
        }
    }

    #[test]
    fn test_equal_counters_is_no_op() {
        let result = stabilize(&with_counter(7), &with_counter(7));
        assert!(!result.changed);
        assert!(!result.computed);
    }

    #[test]
    fn test_material_change_keeps_desired_counter() {
        let observed = with_counter(40);
        let desired = BuildOptions {
            configuration_type: ConfigurationType::Deployment,
            build_counter: 0,
            ..BuildOptions::default()
        };

        let result = stabilize(&observed, &desired);
        assert!(result.changed);
        assert!(!result.computed);
        assert_eq!(result.options, desired);
    }
}
