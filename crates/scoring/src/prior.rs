//! Quality priors for chosen options, injected into scoring.

use sandbox_core::{ChoiceKey, SandboxConfig};
use std::collections::BTreeMap;
use tracing::warn;

/// Supplies the quality prior in [0,1] for a scenario/choice pair.
pub trait QualityPrior {
    fn prior(&self, scenario_id: &str, choice: ChoiceKey) -> f64;
}

/// Clamp into [0,1]; non-finite values become 0.
pub fn clamp_prior(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// The same prior for every option.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantPrior(pub f64);

impl Default for ConstantPrior {
    fn default() -> Self {
        ConstantPrior(0.5)
    }
}

impl QualityPrior for ConstantPrior {
    fn prior(&self, _scenario_id: &str, _choice: ChoiceKey) -> f64 {
        clamp_prior(self.0)
    }
}

/// Static table keyed by scenario and choice, with a fallback value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriorTable {
    fallback: f64,
    entries: BTreeMap<(String, ChoiceKey), f64>,
}

impl PriorTable {
    pub fn new(fallback: f64) -> Self {
        Self {
            fallback: clamp_prior(fallback),
            entries: BTreeMap::new(),
        }
    }

    pub fn from_config(cfg: &SandboxConfig) -> Self {
        let mut table = Self::new(cfg.default_prior);
        for e in &cfg.priors {
            table.insert(&e.scenario_id, e.choice, e.prior);
        }
        table
    }

    pub fn insert(&mut self, scenario_id: &str, choice: ChoiceKey, prior: f64) {
        let clamped = clamp_prior(prior);
        if clamped != prior {
            warn!(scenario_id, %choice, prior, "prior outside [0,1], clamped");
        }
        self.entries.insert((scenario_id.to_string(), choice), clamped);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl QualityPrior for PriorTable {
    fn prior(&self, scenario_id: &str, choice: ChoiceKey) -> f64 {
        self.entries
            .get(&(scenario_id.to_string(), choice))
            .copied()
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_core::PriorEntry;

    #[test]
    fn constant_prior_is_clamped() {
        assert_eq!(ConstantPrior::default().prior("x", ChoiceKey::A), 0.5);
        assert_eq!(ConstantPrior(3.0).prior("x", ChoiceKey::A), 1.0);
        assert_eq!(ConstantPrior(f64::INFINITY).prior("x", ChoiceKey::A), 0.0);
    }

    #[test]
    fn table_falls_back_to_default() {
        let cfg = SandboxConfig {
            default_prior: 0.4,
            priors: vec![
                PriorEntry {
                    scenario_id: "L1-S1".to_string(),
                    choice: ChoiceKey::A,
                    prior: 0.9,
                },
                PriorEntry {
                    scenario_id: "L1-S1".to_string(),
                    choice: ChoiceKey::C,
                    prior: -2.0,
                },
            ],
            ..SandboxConfig::default()
        };
        let table = PriorTable::from_config(&cfg);
        assert_eq!(table.len(), 2);
        assert_eq!(table.prior("L1-S1", ChoiceKey::A), 0.9);
        assert_eq!(table.prior("L1-S1", ChoiceKey::B), 0.4);
        assert_eq!(table.prior("L1-S1", ChoiceKey::C), 0.0);
        assert_eq!(table.prior("L2-S1", ChoiceKey::A), 0.4);
    }
}
