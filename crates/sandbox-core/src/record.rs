//! Records produced while playing: scores, toolkit snapshots, step results
//! and the saved-position slot.

use crate::ChoiceKey;
use serde::{Deserialize, Serialize};

/// Five-factor score for one submitted scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub decision_quality: u32,
    pub toolkit_completeness: u32,
    pub p3_coverage: u32,
    pub reflection_depth: u32,
    pub consistency: u32,
    /// Always the sum of the five components.
    pub total: u32,
}

impl ScoreBreakdown {
    pub const TOOLKIT_MAX: u32 = 30;
    pub const P3_MAX: u32 = 30;
    pub const REFLECTION_MAX: u32 = 10;

    /// Build a breakdown, computing `total` from the components.
    pub fn from_components(
        decision_quality: u32,
        toolkit_completeness: u32,
        p3_coverage: u32,
        reflection_depth: u32,
        consistency: u32,
    ) -> Self {
        let mut s = Self {
            decision_quality,
            toolkit_completeness,
            p3_coverage,
            reflection_depth,
            consistency,
            total: 0,
        };
        s.total = s.component_sum();
        s
    }

    pub fn component_sum(&self) -> u32 {
        self.decision_quality
            + self.toolkit_completeness
            + self.p3_coverage
            + self.reflection_depth
            + self.consistency
    }
}

/// People / Planet / Parity rubric flags set by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct P3Flags {
    pub people: bool,
    pub planet: bool,
    pub parity: bool,
    /// Number of concrete specifics cited, 0..=3.
    pub specifics: u8,
}

impl P3Flags {
    pub const MAX_SPECIFICS: u8 = 3;

    pub fn new(people: bool, planet: bool, parity: bool, specifics: u8) -> Self {
        Self {
            people,
            planet,
            parity,
            specifics: specifics.min(Self::MAX_SPECIFICS),
        }
    }

    /// Number of rubric flags set (0..=3).
    pub fn base(&self) -> u32 {
        [self.people, self.planet, self.parity]
            .iter()
            .filter(|f| **f)
            .count() as u32
    }
}

/// Snapshot of the toolkit card at the moment of submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolkitOutput {
    pub prompts: Vec<String>,
    pub actions: Vec<bool>,
    pub metrics: Vec<String>,
    #[serde(rename = "isComplete")]
    pub is_complete: bool,
}

impl ToolkitOutput {
    /// Answers with any non-whitespace content.
    pub fn prompts_done(&self) -> usize {
        self.prompts.iter().filter(|p| !p.trim().is_empty()).count()
    }

    pub fn actions_done(&self) -> usize {
        self.actions.iter().filter(|a| **a).count()
    }
}

/// Benefit/harm narrative derived from the chosen option.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub summary: String,
    pub benefits: Vec<String>,
    pub harms: Vec<String>,
}

/// Immutable record of one submitted scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub scenario_id: String,
    pub choice: ChoiceKey,
    #[serde(rename = "toolkitOut")]
    pub toolkit_out: ToolkitOutput,
    #[serde(rename = "p3Out")]
    pub p3_out: P3Flags,
    #[serde(default)]
    pub reflection: String,
    pub score: ScoreBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

/// A finished level run as stored under the latest-run key.
///
/// Indices the player never submitted stay `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub level: u32,
    pub steps: Vec<Option<StepResult>>,
}

/// Work in progress attached to a saved position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub choice: Option<ChoiceKey>,
    pub toolkit: Option<ToolkitOutput>,
}

/// The single save slot: `{level, idx, timestamp, payload}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    pub level: u32,
    pub idx: usize,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: i64,
    pub payload: SavePayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_serializes_camel_case() {
        let s = ScoreBreakdown::from_components(15, 30, 21, 1, 5);
        let v = serde_json::to_value(s).unwrap();
        assert_eq!(v["decisionQuality"], 15);
        assert_eq!(v["toolkitCompleteness"], 30);
        assert_eq!(v["total"], 72);
    }

    #[test]
    fn p3_specifics_clamped() {
        let p = P3Flags::new(true, false, true, 9);
        assert_eq!(p.specifics, 3);
        assert_eq!(p.base(), 2);
    }

    #[test]
    fn toolkit_output_counts() {
        let t = ToolkitOutput {
            prompts: vec!["  ".into(), "ok".into(), "x".into()],
            actions: vec![true, false, true],
            metrics: vec![],
            is_complete: false,
        };
        assert_eq!(t.prompts_done(), 2);
        assert_eq!(t.actions_done(), 2);
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["isComplete"], false);
    }

    #[test]
    fn save_state_shape() {
        let save = SaveState {
            level: 2,
            idx: 1,
            timestamp: 1_700_000_000_000,
            payload: SavePayload {
                choice: Some(ChoiceKey::B),
                toolkit: None,
            },
        };
        let v = serde_json::to_value(&save).unwrap();
        assert_eq!(v["level"], 2);
        assert_eq!(v["idx"], 1);
        assert_eq!(v["payload"]["choice"], "B");
        let back: SaveState = serde_json::from_value(v).unwrap();
        assert_eq!(back, save);
    }
}
