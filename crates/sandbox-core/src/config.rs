//! Engine configuration. Every field has a default so partial files load.

use crate::progress::TOTAL_LEVELS;
use crate::ChoiceKey;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which level completions are written to the completion record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Only finishing the last level of the set records completion.
    #[default]
    FinalLevelOnly,
    /// Finishing any level records that level.
    EveryLevel,
}

/// A per-choice quality prior in [0,1].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriorEntry {
    pub scenario_id: String,
    pub choice: ChoiceKey,
    pub prior: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Directory holding `level{n}.json`.
    pub content_dir: PathBuf,
    /// File backing session-local storage.
    pub state_file: PathBuf,
    pub total_levels: u32,
    pub completion_policy: CompletionPolicy,
    /// Delay before redirecting a player denied certificate access.
    pub redirect_delay_secs: u64,
    /// Trimmed length a prompt answer needs to count as answered.
    pub min_answer_chars: usize,
    /// Trimmed reflection length required before submission.
    pub min_reflection_chars: usize,
    pub default_prior: f64,
    pub priors: Vec<PriorEntry>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("assets/levels"),
            state_file: PathBuf::from("saves/session.json"),
            total_levels: TOTAL_LEVELS,
            completion_policy: CompletionPolicy::FinalLevelOnly,
            redirect_delay_secs: 3,
            min_answer_chars: 2,
            min_reflection_chars: 0,
            default_prior: 0.5,
            priors: Vec::new(),
        }
    }
}

impl SandboxConfig {
    /// Whether finishing `level` writes to the completion record.
    pub fn records_completion(&self, level: u32) -> bool {
        match self.completion_policy {
            CompletionPolicy::FinalLevelOnly => level == self.total_levels,
            CompletionPolicy::EveryLevel => (1..=self.total_levels).contains(&level),
        }
    }

    /// Path of the content file for a 1-based level index.
    pub fn level_path(&self, level: u32) -> PathBuf {
        self.content_dir.join(format!("level{level}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: SandboxConfig =
            serde_yaml::from_str("completion_policy: every_level\nmin_reflection_chars: 180\n")
                .unwrap();
        assert_eq!(cfg.completion_policy, CompletionPolicy::EveryLevel);
        assert_eq!(cfg.min_reflection_chars, 180);
        assert_eq!(cfg.total_levels, 7);
        assert_eq!(cfg.min_answer_chars, 2);
        assert!(cfg.priors.is_empty());
    }

    #[test]
    fn final_level_only_records_level_seven() {
        let cfg = SandboxConfig::default();
        assert!(cfg.records_completion(7));
        assert!(!cfg.records_completion(1));
        assert_eq!(
            cfg.level_path(3),
            PathBuf::from("assets/levels").join("level3.json")
        );
    }

    #[test]
    fn every_level_records_each_level_in_set() {
        let cfg = SandboxConfig {
            completion_policy: CompletionPolicy::EveryLevel,
            ..SandboxConfig::default()
        };
        assert!(cfg.records_completion(1));
        assert!(cfg.records_completion(7));
        assert!(!cfg.records_completion(8));
    }
}
