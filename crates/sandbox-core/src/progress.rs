//! Session-wide completion record and the statistics derived from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Size of the fixed level set a certificate requires.
pub const TOTAL_LEVELS: u32 = 7;

/// Access to the set of completed level numbers.
///
/// Implementations are handed to whatever needs the record instead of
/// reading ambient storage; only one writer is active at a time.
pub trait ProgressStore {
    /// Completed level numbers.
    fn get(&self) -> BTreeSet<u32>;

    /// Mark a level as completed. Idempotent.
    fn set(&mut self, level: u32);

    fn is_level_complete(&self, level: u32) -> bool {
        self.get().contains(&level)
    }

    /// Completion percentage over levels `1..=total_levels`.
    fn percentage(&self, total_levels: u32) -> u32 {
        completion_stats(&self.get(), total_levels).percentage
    }
}

/// Summary shown on the certificate page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub completed_levels: Vec<u32>,
    pub total_levels: u32,
    pub percentage: u32,
}

impl CompletionStats {
    /// Every level complete, as reported in review mode.
    pub fn full(total_levels: u32) -> Self {
        Self {
            completed_levels: (1..=total_levels).collect(),
            total_levels,
            percentage: 100,
        }
    }

    pub fn all_complete(&self) -> bool {
        (1..=self.total_levels).all(|l| self.completed_levels.contains(&l))
    }
}

/// Compute completion statistics over levels `1..=total_levels`.
///
/// Level numbers outside the set are listed but do not count toward the
/// percentage.
pub fn completion_stats(completed: &BTreeSet<u32>, total_levels: u32) -> CompletionStats {
    let in_set = completed
        .iter()
        .filter(|l| (1..=total_levels).contains(*l))
        .count() as u32;
    let percentage = if total_levels == 0 {
        0
    } else {
        (100.0 * f64::from(in_set) / f64::from(total_levels)).round() as u32
    };
    CompletionStats {
        completed_levels: completed.iter().copied().collect(),
        total_levels,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(BTreeSet<u32>);

    impl ProgressStore for Fixed {
        fn get(&self) -> BTreeSet<u32> {
            self.0.clone()
        }
        fn set(&mut self, level: u32) {
            self.0.insert(level);
        }
    }

    #[test]
    fn four_of_seven_is_57_percent() {
        let done: BTreeSet<u32> = [1, 2, 3, 4].into_iter().collect();
        let stats = completion_stats(&done, TOTAL_LEVELS);
        assert_eq!(stats.percentage, 57);
        assert_eq!(stats.total_levels, 7);
        assert_eq!(stats.completed_levels, vec![1, 2, 3, 4]);
        assert!(!stats.all_complete());
    }

    #[test]
    fn out_of_range_levels_do_not_count() {
        let done: BTreeSet<u32> = [0, 8, 9].into_iter().collect();
        assert_eq!(completion_stats(&done, TOTAL_LEVELS).percentage, 0);
    }

    #[test]
    fn store_defaults() {
        let mut store = Fixed(BTreeSet::new());
        assert_eq!(store.percentage(TOTAL_LEVELS), 0);
        store.set(7);
        store.set(7);
        assert!(store.is_level_complete(7));
        assert!(!store.is_level_complete(6));
        assert_eq!(store.percentage(TOTAL_LEVELS), 14);
        assert!(CompletionStats::full(TOTAL_LEVELS).all_complete());
    }

    #[test]
    fn percentage_follows_configured_level_count() {
        let mut store = Fixed(BTreeSet::new());
        for level in 1..=3 {
            store.set(level);
        }
        assert_eq!(store.percentage(3), 100);
        assert_eq!(store.percentage(TOTAL_LEVELS), 43);
        assert_eq!(store.percentage(0), 0);
    }
}
