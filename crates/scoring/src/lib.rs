#![deny(warnings)]

//! Decision scoring for submitted scenarios.
//!
//! This crate provides pure, deterministic helpers for:
//! - The five-factor score of a submitted decision
//! - Benefit/harm narratives synthesized from the chosen option
//! - Injected per-choice quality priors

pub mod outcome;
pub mod prior;

pub use outcome::{describe_result, describe_with, Effect, Guard, OutcomeRule, RULES};
pub use prior::{clamp_prior, ConstantPrior, PriorTable, QualityPrior};

use sandbox_core::{ChoiceKey, P3Flags, Scenario, ScoreBreakdown, ToolkitOutput};
use tracing::debug;

/// Reflection characters needed per reflection-depth point.
pub const CHARS_PER_REFLECTION_POINT: usize = 180;

/// Weight of answered prompts in the toolkit ratio; actions take the rest.
const PROMPT_WEIGHT: f64 = 0.6;
const ACTION_WEIGHT: f64 = 0.4;

/// Points per P3 flag set and per cited specific.
const P3_FLAG_POINTS: u32 = 7;
const P3_SPECIFIC_POINTS: u32 = 3;

/// How much of the toolkit the player filled in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToolkitFill {
    pub prompts_done: usize,
    pub total_prompts: usize,
    pub actions_done: usize,
    pub total_actions: usize,
}

impl ToolkitFill {
    /// Derive fill counts from a toolkit snapshot.
    ///
    /// `total_actions` is the number of actions applicable to the chosen option.
    pub fn from_output(out: &ToolkitOutput, total_prompts: usize, total_actions: usize) -> Self {
        Self {
            prompts_done: out.prompts_done(),
            total_prompts,
            actions_done: out.actions_done(),
            total_actions,
        }
    }

    /// Weighted completion in [0,1]. Zero totals never divide by zero.
    pub fn ratio(&self) -> f64 {
        let prompts = self.prompts_done as f64 / self.total_prompts.max(1) as f64;
        let actions = self.actions_done as f64 / self.total_actions.max(1) as f64;
        (PROMPT_WEIGHT * prompts + ACTION_WEIGHT * actions).clamp(0.0, 1.0)
    }
}

/// Score a submitted decision.
///
/// `prior` is the externally supplied quality prior for the chosen option;
/// values outside [0,1] are clamped and non-finite values count as 0.
///
/// Example:
/// let fill = ToolkitFill { prompts_done: 2, total_prompts: 2, actions_done: 3, total_actions: 3 };
/// let s = score_decision(&scenario, ChoiceKey::A, &fill, &P3Flags::default(), 0, 0.5);
/// assert_eq!(s.toolkit_completeness, 30);
pub fn score_decision(
    scenario: &Scenario,
    choice: ChoiceKey,
    fill: &ToolkitFill,
    p3: &P3Flags,
    reflection_chars: usize,
    prior: f64,
) -> ScoreBreakdown {
    let prior = clamp_prior(prior);
    let decision_quality = 10 + (10.0 * prior).round() as u32;
    let toolkit_completeness =
        ((ScoreBreakdown::TOOLKIT_MAX as f64) * fill.ratio()).round() as u32;
    let specifics = u32::from(p3.specifics.min(P3Flags::MAX_SPECIFICS));
    let p3_coverage =
        (p3.base() * P3_FLAG_POINTS + specifics * P3_SPECIFIC_POINTS).min(ScoreBreakdown::P3_MAX);
    let reflection_depth = ((reflection_chars / CHARS_PER_REFLECTION_POINT) as u32)
        .min(ScoreBreakdown::REFLECTION_MAX);
    let consistency = (10.0 * prior).round() as u32;

    let score = ScoreBreakdown::from_components(
        decision_quality,
        toolkit_completeness,
        p3_coverage,
        reflection_depth,
        consistency,
    );
    debug!(
        scenario = %scenario.scenario_id,
        %choice,
        total = score.total,
        "scored decision"
    );
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sandbox_core::{ChoiceMap, QuickActions, ToolId, ToolkitFlow};

    fn scenario() -> Scenario {
        Scenario {
            scenario_id: "L1-S1".to_string(),
            title: "Cloud contract".to_string(),
            prompt: "What now?".to_string(),
            choices: ChoiceMap {
                a: "Transition with an audit".to_string(),
                b: "Immediate shutdown".to_string(),
                c: "Keep as is".to_string(),
            },
            toolkit_cues: None,
            p3_cues: None,
            toolkit_flow: ToolkitFlow {
                order: vec![ToolId::T1],
                prompts: vec!["p1".to_string(), "p2".to_string()],
                quick_actions: QuickActions::Flat(vec!["a1".to_string()]),
                metrics: vec![],
                owner_required: None,
                review_default_days: None,
            },
            tags: vec![],
        }
    }

    #[test]
    fn full_toolkit_scores_thirty() {
        let fill = ToolkitFill {
            prompts_done: 2,
            total_prompts: 2,
            actions_done: 3,
            total_actions: 3,
        };
        let s = score_decision(&scenario(), ChoiceKey::A, &fill, &P3Flags::default(), 0, 0.5);
        assert_eq!(s.decision_quality, 15);
        assert_eq!(s.toolkit_completeness, 30);
        assert_eq!(s.p3_coverage, 0);
        assert_eq!(s.reflection_depth, 0);
        assert_eq!(s.consistency, 5);
        assert_eq!(s.total, 50);
    }

    #[test]
    fn zero_totals_do_not_divide_by_zero() {
        let fill = ToolkitFill::default();
        assert_eq!(fill.ratio(), 0.0);
        let s = score_decision(&scenario(), ChoiceKey::B, &fill, &P3Flags::default(), 0, 0.0);
        assert_eq!(s.toolkit_completeness, 0);
        assert_eq!(s.decision_quality, 10);
    }

    #[test]
    fn p3_and_reflection_caps() {
        let p3 = P3Flags::new(true, true, true, 3);
        let s = score_decision(
            &scenario(),
            ChoiceKey::C,
            &ToolkitFill::default(),
            &p3,
            10_000,
            1.0,
        );
        // 3*7 + 3*3 = 30
        assert_eq!(s.p3_coverage, 30);
        assert_eq!(s.reflection_depth, 10);
        assert_eq!(s.decision_quality, 20);
        assert_eq!(s.consistency, 10);

        let s = score_decision(
            &scenario(),
            ChoiceKey::C,
            &ToolkitFill::default(),
            &P3Flags::new(false, true, false, 1),
            359,
            0.5,
        );
        assert_eq!(s.p3_coverage, 10);
        assert_eq!(s.reflection_depth, 1);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let p3 = P3Flags {
            people: true,
            planet: true,
            parity: true,
            specifics: 200,
        };
        let s = score_decision(
            &scenario(),
            ChoiceKey::A,
            &ToolkitFill {
                prompts_done: 9,
                total_prompts: 2,
                actions_done: 9,
                total_actions: 1,
            },
            &p3,
            0,
            f64::NAN,
        );
        assert_eq!(s.p3_coverage, 30);
        assert_eq!(s.toolkit_completeness, 30);
        assert_eq!(s.decision_quality, 10);
        assert_eq!(s.consistency, 0);
    }

    proptest! {
        #[test]
        fn score_is_deterministic(pd in 0usize..6, tp in 0usize..6, ad in 0usize..6, ta in 0usize..6,
                                  flags in any::<(bool, bool, bool)>(), specifics in 0u8..=3,
                                  chars in 0usize..5_000, prior in 0.0f64..=1.0) {
            let fill = ToolkitFill {
                prompts_done: pd,
                total_prompts: tp,
                actions_done: ad,
                total_actions: ta,
            };
            let p3 = P3Flags::new(flags.0, flags.1, flags.2, specifics);
            let a = score_decision(&scenario(), ChoiceKey::A, &fill, &p3, chars, prior);
            let b = score_decision(&scenario(), ChoiceKey::A, &fill, &p3, chars, prior);
            prop_assert_eq!(a, b);
            prop_assert_eq!(a.total, a.component_sum());
            prop_assert!(sandbox_core::validate_score(&a).is_ok());
        }

        #[test]
        fn toolkit_completeness_bounded(tp in 0usize..10, ta in 0usize..10, pf in 0.0f64..=1.0, af in 0.0f64..=1.0) {
            let pd = ((tp as f64) * pf).floor() as usize;
            let ad = ((ta as f64) * af).floor() as usize;
            let fill = ToolkitFill {
                prompts_done: pd,
                total_prompts: tp,
                actions_done: ad,
                total_actions: ta,
            };
            let s = score_decision(&scenario(), ChoiceKey::B, &fill, &P3Flags::default(), 0, 0.5);
            prop_assert!(s.toolkit_completeness <= 30);
        }
    }
}
