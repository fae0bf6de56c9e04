//! Rule-based benefit/harm synthesis for a chosen option.
//!
//! Rules are evaluated in table order against the lower-cased option text.
//! The result depends only on that text and the choice key.

use sandbox_core::{ChoiceKey, Outcome, Scenario};

/// What a matching rule contributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Benefit(&'static str),
    Harm(&'static str),
}

/// When a rule is allowed to fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guard {
    Always,
    /// Only if no earlier rule produced a harm.
    NoHarmsYet,
}

#[derive(Clone, Copy, Debug)]
pub struct OutcomeRule {
    /// Fires when any keyword occurs in the option text.
    pub keywords: &'static [&'static str],
    pub effects: &'static [Effect],
    pub guard: Guard,
}

pub const RULES: &[OutcomeRule] = &[
    OutcomeRule {
        keywords: &["transition", "audit"],
        effects: &[Effect::Benefit(
            "Introduces accountability and a path to improvement",
        )],
        guard: Guard::Always,
    },
    OutcomeRule {
        keywords: &["shutdown", "pause"],
        effects: &[
            Effect::Harm("Service disruption risk increases in the short term"),
            Effect::Benefit("Halts ongoing harms while protections are built"),
        ],
        guard: Guard::Always,
    },
    OutcomeRule {
        keywords: &["immediate", "restrict"],
        effects: &[Effect::Benefit("Reduces exposure to known risks quickly")],
        guard: Guard::Always,
    },
    OutcomeRule {
        keywords: &["keep"],
        effects: &[Effect::Harm("Continues existing risks and inequities")],
        guard: Guard::NoHarmsYet,
    },
];

/// Benefit reported when no rule produced one.
pub const FALLBACK_BENEFIT: &str = "Maintains continuity for current users";

/// Describe the consequences of picking `choice` in `scenario`.
pub fn describe_result(scenario: &Scenario, choice: ChoiceKey) -> Outcome {
    describe_with(RULES, scenario.choice_text(choice), choice)
}

/// Evaluate `rules` against an option text. `benefits` is never empty.
pub fn describe_with(rules: &[OutcomeRule], option_text: &str, choice: ChoiceKey) -> Outcome {
    let text = option_text.to_lowercase();
    let mut benefits: Vec<String> = Vec::new();
    let mut harms: Vec<String> = Vec::new();

    for rule in rules {
        if rule.guard == Guard::NoHarmsYet && !harms.is_empty() {
            continue;
        }
        if !rule.keywords.iter().any(|k| text.contains(*k)) {
            continue;
        }
        for effect in rule.effects {
            match effect {
                Effect::Benefit(b) => benefits.push((*b).to_string()),
                Effect::Harm(h) => harms.push((*h).to_string()),
            }
        }
    }

    if benefits.is_empty() {
        benefits.push(FALLBACK_BENEFIT.to_string());
    }
    let summary = format!(
        "As a result of your decision ({choice}), {}.",
        benefits[0].to_lowercase()
    );
    Outcome {
        summary,
        benefits,
        harms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn transition_yields_accountability() {
        let o = describe_with(RULES, "Transition to a fair vendor over 6 months", ChoiceKey::A);
        assert_eq!(
            o.benefits,
            vec!["Introduces accountability and a path to improvement"]
        );
        assert!(o.harms.is_empty());
        assert_eq!(
            o.summary,
            "As a result of your decision (A), introduces accountability and a path to improvement."
        );
    }

    #[test]
    fn shutdown_yields_harm_and_benefit() {
        let o = describe_with(RULES, "Immediate SHUTDOWN of the service", ChoiceKey::B);
        assert_eq!(
            o.benefits,
            vec![
                "Halts ongoing harms while protections are built",
                "Reduces exposure to known risks quickly",
            ]
        );
        assert_eq!(
            o.harms,
            vec!["Service disruption risk increases in the short term"]
        );
    }

    #[test]
    fn keep_without_other_matches_falls_back() {
        let o = describe_with(RULES, "Keep the contract and donate", ChoiceKey::C);
        assert_eq!(o.benefits, vec![FALLBACK_BENEFIT]);
        assert_eq!(o.harms, vec!["Continues existing risks and inequities"]);
        assert!(o.summary.contains("maintains continuity for current users"));
    }

    #[test]
    fn keep_skipped_when_harm_already_present() {
        let o = describe_with(RULES, "Pause but keep payroll", ChoiceKey::B);
        assert_eq!(o.harms.len(), 1);
        assert_eq!(
            o.harms[0],
            "Service disruption risk increases in the short term"
        );
    }

    #[test]
    fn custom_rule_table() {
        const CUSTOM: &[OutcomeRule] = &[OutcomeRule {
            keywords: &["notify"],
            effects: &[Effect::Benefit("Keeps people informed")],
            guard: Guard::Always,
        }];
        let o = describe_with(CUSTOM, "Notify every user", ChoiceKey::A);
        assert_eq!(o.benefits, vec!["Keeps people informed"]);
    }

    proptest! {
        #[test]
        fn benefits_never_empty(text in ".{0,80}", idx in 0usize..3) {
            let o = describe_with(RULES, &text, ChoiceKey::ALL[idx]);
            prop_assert!(!o.benefits.is_empty());
            prop_assert!(o.summary.starts_with("As a result of your decision ("));
        }
    }
}
