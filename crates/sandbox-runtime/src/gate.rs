//! Certificate access gate over the completion record.

use sandbox_core::{completion_stats, CompletionStats, ProgressStore, SandboxConfig};
use std::time::Duration;
use tracing::info;

/// True iff every level in `1..=total_levels` is complete.
///
/// Example:
/// completed = {1,2,3,4,5,6}   -> false
/// completed = {1,2,3,4,5,6,7} -> true
pub fn check_all_levels_completed(store: &dyn ProgressStore, total_levels: u32) -> bool {
    let done = store.get();
    (1..=total_levels).all(|l| done.contains(&l))
}

pub fn completion_stats_for(store: &dyn ProgressStore, total_levels: u32) -> CompletionStats {
    completion_stats(&store.get(), total_levels)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Granted {
        stats: CompletionStats,
        test_mode: bool,
    },
    /// Not an error: the caller redirects after `redirect_after`.
    Denied {
        stats: CompletionStats,
        redirect_after: Duration,
    },
}

impl GateDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, GateDecision::Granted { .. })
    }

    pub fn stats(&self) -> &CompletionStats {
        match self {
            GateDecision::Granted { stats, .. } | GateDecision::Denied { stats, .. } => stats,
        }
    }
}

/// Decide whether the certificate page may be shown.
///
/// `test_mode` bypasses the check for reviewers and reports full stats.
pub fn certificate_access(
    store: &dyn ProgressStore,
    test_mode: bool,
    cfg: &SandboxConfig,
) -> GateDecision {
    if test_mode {
        info!("certificate gate bypassed in test mode");
        return GateDecision::Granted {
            stats: CompletionStats::full(cfg.total_levels),
            test_mode: true,
        };
    }
    let stats = completion_stats_for(store, cfg.total_levels);
    if check_all_levels_completed(store, cfg.total_levels) {
        info!(percentage = stats.percentage, "certificate access granted");
        GateDecision::Granted {
            stats,
            test_mode: false,
        }
    } else {
        info!(
            percentage = stats.percentage,
            delay_secs = cfg.redirect_delay_secs,
            "certificate access denied"
        );
        GateDecision::Denied {
            stats,
            redirect_after: Duration::from_secs(cfg.redirect_delay_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    struct Fixed(BTreeSet<u32>);

    impl ProgressStore for Fixed {
        fn get(&self) -> BTreeSet<u32> {
            self.0.clone()
        }
        fn set(&mut self, level: u32) {
            self.0.insert(level);
        }
    }

    fn store(levels: &[u32]) -> Fixed {
        Fixed(levels.iter().copied().collect())
    }

    #[test]
    fn six_of_seven_is_not_enough() {
        assert!(!check_all_levels_completed(&store(&[1, 2, 3, 4, 5, 6]), 7));
        assert!(check_all_levels_completed(&store(&[1, 2, 3, 4, 5, 6, 7]), 7));
        assert!(check_all_levels_completed(&store(&[1, 2, 3, 4, 5, 6, 7, 9]), 7));
    }

    #[test]
    fn four_levels_is_57_percent() {
        let stats = completion_stats_for(&store(&[1, 2, 3, 4]), 7);
        assert_eq!(stats.percentage, 57);
        assert_eq!(stats.completed_levels, vec![1, 2, 3, 4]);
        assert_eq!(stats.total_levels, 7);
    }

    #[test]
    fn denied_player_is_redirected_after_delay() {
        let cfg = SandboxConfig::default();
        let d = certificate_access(&store(&[1, 2]), false, &cfg);
        assert!(!d.is_granted());
        assert_eq!(
            d,
            GateDecision::Denied {
                stats: completion_stats_for(&store(&[1, 2]), 7),
                redirect_after: Duration::from_secs(3),
            }
        );
    }

    #[test]
    fn test_mode_reports_full_stats() {
        let d = certificate_access(&store(&[]), true, &SandboxConfig::default());
        assert!(d.is_granted());
        assert_eq!(d.stats().percentage, 100);
        assert_eq!(d.stats().completed_levels.len(), 7);
    }

    proptest! {
        #[test]
        fn gate_iff_superset(levels in proptest::collection::btree_set(1u32..=9, 0..9)) {
            let s = Fixed(levels.clone());
            let expected = (1..=7).all(|l| levels.contains(&l));
            prop_assert_eq!(check_all_levels_completed(&s, 7), expected);
            prop_assert_eq!(
                certificate_access(&s, false, &SandboxConfig::default()).is_granted(),
                expected
            );
        }
    }
}
