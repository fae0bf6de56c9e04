#![deny(warnings)]

//! Core domain models and invariants for the Ethics Decisions Sandbox.
//!
//! This crate defines the serializable scenario content consumed by the
//! engine, the records produced by a playthrough, and validation helpers
//! that enumerate every content violation rather than stopping at the first.

pub mod config;
pub mod progress;
pub mod record;

pub use config::{CompletionPolicy, PriorEntry, SandboxConfig};
pub use progress::{completion_stats, CompletionStats, ProgressStore, TOTAL_LEVELS};
pub use record::{
    Outcome, P3Flags, RunRecord, SavePayload, SaveState, ScoreBreakdown, StepResult,
    ToolkitOutput,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the three options offered by every scenario.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum ChoiceKey {
    A,
    B,
    C,
}

impl ChoiceKey {
    /// All keys in display order.
    pub const ALL: [ChoiceKey; 3] = [ChoiceKey::A, ChoiceKey::B, ChoiceKey::C];

    pub fn as_str(self) -> &'static str {
        match self {
            ChoiceKey::A => "A",
            ChoiceKey::B => "B",
            ChoiceKey::C => "C",
        }
    }
}

impl fmt::Display for ChoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChoiceKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(ChoiceKey::A),
            "B" | "b" => Ok(ChoiceKey::B),
            "C" | "c" => Ok(ChoiceKey::C),
            other => Err(ValidationError::UnknownChoice(other.to_string())),
        }
    }
}

/// Reflection technique identifiers from the five-step ethics toolkit.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum ToolId {
    /// Map impacts
    T1,
    /// Clarify values
    T2,
    /// Anticipate risks
    T3,
    /// Weigh alternatives
    T4,
    /// Assign accountability
    T5,
}

impl ToolId {
    pub fn technique(self) -> &'static str {
        match self {
            ToolId::T1 => "impacts",
            ToolId::T2 => "values",
            ToolId::T3 => "risks",
            ToolId::T4 => "alternatives",
            ToolId::T5 => "accountability",
        }
    }
}

/// A value for each of the three choice keys, serialized as `{"A":..,"B":..,"C":..}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ChoiceMap<T> {
    #[serde(rename = "A")]
    pub a: T,
    #[serde(rename = "B")]
    pub b: T,
    #[serde(rename = "C")]
    pub c: T,
}

impl<T> ChoiceMap<T> {
    pub fn get(&self, key: ChoiceKey) -> &T {
        match key {
            ChoiceKey::A => &self.a,
            ChoiceKey::B => &self.b,
            ChoiceKey::C => &self.c,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChoiceKey, &T)> {
        ChoiceKey::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

/// Checklist actions attached to a toolkit flow.
///
/// Older content ships one flat list that applies whatever the player picks;
/// newer content keys a separate list to each choice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QuickActions {
    Flat(Vec<String>),
    PerChoice(ChoiceMap<Vec<String>>),
}

impl QuickActions {
    /// Actions the player must confirm for the given (possibly unset) choice.
    pub fn applicable(&self, choice: Option<ChoiceKey>) -> &[String] {
        match self {
            QuickActions::Flat(actions) => actions.as_slice(),
            QuickActions::PerChoice(map) => match choice {
                Some(key) => map.get(key).as_slice(),
                None => &[],
            },
        }
    }

    pub fn is_choice_specific(&self) -> bool {
        matches!(self, QuickActions::PerChoice(_))
    }
}

/// Guided-reflection steps attached to a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolkitFlow {
    pub order: Vec<ToolId>,
    pub prompts: Vec<String>,
    pub quick_actions: QuickActions,
    /// Auxiliary labels carried through to the toolkit output.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_default_days: Option<u32>,
}

/// One unit of play. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scenario {
    /// Stable key used to correlate responses and saved state.
    pub scenario_id: String,
    pub title: String,
    pub prompt: String,
    pub choices: ChoiceMap<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolkit_cues: Option<String>,
    /// People / Planet / Parity hint text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p3_cues: Option<String>,
    pub toolkit_flow: ToolkitFlow,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Scenario {
    pub fn choice_text(&self, key: ChoiceKey) -> &str {
        self.choices.get(key)
    }
}

/// A numbered level: title plus its ordered scenarios.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LevelPack {
    pub level: u32,
    pub title: String,
    pub scenarios: Vec<Scenario>,
}

/// Semantic content errors and other domain invariant breaks.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("level number must be >= 1")]
    LevelZero,
    #[error("level number {found} does not match requested level {expected}")]
    LevelMismatch { expected: u32, found: u32 },
    #[error("duplicate scenario_id: {0}")]
    DuplicateScenarioId(String),
    #[error("scenario_id must not be blank")]
    BlankScenarioId,
    #[error("choice text must not be blank")]
    BlankChoice,
    #[error("choice-specific action list must not be empty")]
    EmptyChoiceActions,
    #[error("unknown choice key: {0}")]
    UnknownChoice(String),
    #[error("score total {total} does not equal component sum {sum}")]
    ScoreTotalMismatch { total: u32, sum: u32 },
    #[error("score component {0} exceeds its cap")]
    ScoreComponentOverCap(&'static str),
}

/// A single failing field, addressed by a JSON pointer into the level document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// Validate a scenario, returning every violation with its path under `base`.
pub fn scenario_violations(scenario: &Scenario, base: &str) -> Vec<Violation> {
    let mut out = Vec::new();
    if scenario.scenario_id.trim().is_empty() {
        out.push(Violation::new(
            format!("{base}/scenario_id"),
            ValidationError::BlankScenarioId,
        ));
    }
    for (key, text) in scenario.choices.iter() {
        if text.trim().is_empty() {
            out.push(Violation::new(
                format!("{base}/choices/{key}"),
                ValidationError::BlankChoice,
            ));
        }
    }
    if let QuickActions::PerChoice(map) = &scenario.toolkit_flow.quick_actions {
        for (key, actions) in map.iter() {
            if actions.is_empty() {
                out.push(Violation::new(
                    format!("{base}/toolkit_flow/quick_actions/{key}"),
                    ValidationError::EmptyChoiceActions,
                ));
            }
        }
    }
    out
}

/// Validate a level pack's cross-field invariants.
///
/// `expected_level` is the index the pack was requested under, when known.
/// An empty scenario list is not a violation here; callers surface it as a
/// "no scenarios" state.
pub fn level_violations(pack: &LevelPack, expected_level: Option<u32>) -> Vec<Violation> {
    let mut out = Vec::new();
    if pack.level == 0 {
        out.push(Violation::new("/level", ValidationError::LevelZero));
    } else if let Some(expected) = expected_level {
        if expected != pack.level {
            out.push(Violation::new(
                "/level",
                ValidationError::LevelMismatch {
                    expected,
                    found: pack.level,
                },
            ));
        }
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for (i, s) in pack.scenarios.iter().enumerate() {
        let base = format!("/scenarios/{i}");
        out.extend(scenario_violations(s, &base));
        if !s.scenario_id.trim().is_empty() && !seen.insert(s.scenario_id.as_str()) {
            out.push(Violation::new(
                format!("{base}/scenario_id"),
                ValidationError::DuplicateScenarioId(s.scenario_id.clone()),
            ));
        }
    }
    out
}

/// Validate a score breakdown's sum and caps.
pub fn validate_score(score: &ScoreBreakdown) -> Result<(), ValidationError> {
    let sum = score.component_sum();
    if score.total != sum {
        return Err(ValidationError::ScoreTotalMismatch {
            total: score.total,
            sum,
        });
    }
    if score.toolkit_completeness > ScoreBreakdown::TOOLKIT_MAX {
        return Err(ValidationError::ScoreComponentOverCap("toolkitCompleteness"));
    }
    if score.p3_coverage > ScoreBreakdown::P3_MAX {
        return Err(ValidationError::ScoreComponentOverCap("p3Coverage"));
    }
    if score.reflection_depth > ScoreBreakdown::REFLECTION_MAX {
        return Err(ValidationError::ScoreComponentOverCap("reflectionDepth"));
    }
    Ok(())
}
