//! Per-scenario response state and its completion state machine.

use sandbox_core::{
    ChoiceKey, P3Flags, SandboxConfig, SavePayload, Scenario, StepResult, ToolkitFlow,
    ToolkitOutput,
};
use scoring::{describe_result, score_decision, QualityPrior, ToolkitFill};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioPhase {
    Unanswered,
    ChoiceSelected,
    TogglingToolkit,
    ReadyToSubmit,
    Submitted,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("prompt index {index} out of range (prompts: {len})")]
    PromptIndex { index: usize, len: usize },
    #[error("action index {index} out of range (actions: {len})")]
    ActionIndex { index: usize, len: usize },
    #[error("scenario already submitted")]
    AlreadySubmitted,
}

/// The player's in-progress answers for one scenario.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseState {
    pub choice: Option<ChoiceKey>,
    pub toolkit_answers: Vec<String>,
    pub toolkit_checks: Vec<bool>,
}

impl ResponseState {
    /// Empty answers and unchecked actions sized for `flow`.
    pub fn fresh(flow: &ToolkitFlow) -> Self {
        Self {
            choice: None,
            toolkit_answers: vec![String::new(); flow.prompts.len()],
            toolkit_checks: vec![false; flow.quick_actions.applicable(None).len()],
        }
    }
}

/// Whether the toolkit portion of `state` is complete for `flow`.
///
/// Prompts are complete when there are none or every trimmed answer has at
/// least `min_answer_chars` characters. Actions are complete when none apply
/// or every applicable action is checked.
pub fn derive_completion(
    state: &ResponseState,
    flow: &ToolkitFlow,
    min_answer_chars: usize,
) -> bool {
    let prompts_ok = flow.prompts.is_empty()
        || (state.toolkit_answers.len() >= flow.prompts.len()
            && state.toolkit_answers[..flow.prompts.len()]
                .iter()
                .all(|a| a.trim().chars().count() >= min_answer_chars));

    let applicable = flow.quick_actions.applicable(state.choice);
    let actions_ok = applicable.is_empty()
        || (state.toolkit_checks.len() == applicable.len()
            && state.toolkit_checks.iter().all(|c| *c));

    prompts_ok && actions_ok
}

/// One scenario being answered. Mutations recompute completion immediately.
#[derive(Clone, Debug)]
pub struct ScenarioSession {
    scenario: Scenario,
    state: ResponseState,
    p3: P3Flags,
    reflection: String,
    is_complete: bool,
    submitted: bool,
    min_answer_chars: usize,
    min_reflection_chars: usize,
}

impl ScenarioSession {
    pub fn new(scenario: Scenario, cfg: &SandboxConfig) -> Self {
        let state = ResponseState::fresh(&scenario.toolkit_flow);
        let is_complete = derive_completion(&state, &scenario.toolkit_flow, cfg.min_answer_chars);
        Self {
            scenario,
            state,
            p3: P3Flags::default(),
            reflection: String::new(),
            is_complete,
            submitted: false,
            min_answer_chars: cfg.min_answer_chars,
            min_reflection_chars: cfg.min_reflection_chars,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn state(&self) -> &ResponseState {
        &self.state
    }

    pub fn p3(&self) -> &P3Flags {
        &self.p3
    }

    pub fn reflection(&self) -> &str {
        &self.reflection
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Actions the player must confirm for the current choice.
    pub fn applicable_actions(&self) -> &[String] {
        self.scenario
            .toolkit_flow
            .quick_actions
            .applicable(self.state.choice)
    }

    /// Select or change the choice.
    ///
    /// For choice-specific actions every check is cleared whenever the
    /// choice changes, including a first selection.
    pub fn select_choice(&mut self, choice: ChoiceKey) -> Result<(), SessionError> {
        self.ensure_open()?;
        let changed = self.state.choice != Some(choice);
        self.state.choice = Some(choice);
        if changed && self.scenario.toolkit_flow.quick_actions.is_choice_specific() {
            let len = self.applicable_actions().len();
            self.state.toolkit_checks = vec![false; len];
            debug!(scenario = %self.scenario.scenario_id, %choice, "action checks reset");
        }
        self.recompute();
        Ok(())
    }

    pub fn set_answer(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        let len = self.state.toolkit_answers.len();
        let slot = self
            .state
            .toolkit_answers
            .get_mut(index)
            .ok_or(SessionError::PromptIndex { index, len })?;
        *slot = text.into();
        self.recompute();
        Ok(())
    }

    pub fn set_action(&mut self, index: usize, checked: bool) -> Result<(), SessionError> {
        self.ensure_open()?;
        let len = self.state.toolkit_checks.len();
        let slot = self
            .state
            .toolkit_checks
            .get_mut(index)
            .ok_or(SessionError::ActionIndex { index, len })?;
        *slot = checked;
        self.recompute();
        Ok(())
    }

    pub fn toggle_action(&mut self, index: usize) -> Result<(), SessionError> {
        let current = self
            .state
            .toolkit_checks
            .get(index)
            .copied()
            .unwrap_or(false);
        self.set_action(index, !current)
    }

    pub fn set_p3(&mut self, p3: P3Flags) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.p3 = P3Flags::new(p3.people, p3.planet, p3.parity, p3.specifics);
        Ok(())
    }

    pub fn set_reflection(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.reflection = text.into();
        Ok(())
    }

    pub fn phase(&self) -> ScenarioPhase {
        if self.submitted {
            return ScenarioPhase::Submitted;
        }
        if self.state.choice.is_none() {
            return ScenarioPhase::Unanswered;
        }
        if self.is_complete {
            return ScenarioPhase::ReadyToSubmit;
        }
        let touched = self.state.toolkit_answers.iter().any(|a| !a.is_empty())
            || self.state.toolkit_checks.iter().any(|c| *c);
        if touched {
            ScenarioPhase::TogglingToolkit
        } else {
            ScenarioPhase::ChoiceSelected
        }
    }

    /// Submission is available only in `ReadyToSubmit` with enough reflection.
    pub fn can_submit(&self) -> bool {
        self.phase() == ScenarioPhase::ReadyToSubmit
            && self.reflection.trim().chars().count() >= self.min_reflection_chars
    }

    pub fn toolkit_output(&self) -> ToolkitOutput {
        ToolkitOutput {
            prompts: self.state.toolkit_answers.clone(),
            actions: self.state.toolkit_checks.clone(),
            metrics: self.scenario.toolkit_flow.metrics.clone(),
            is_complete: self.is_complete,
        }
    }

    /// Work in progress for the save slot.
    pub fn save_payload(&self) -> SavePayload {
        SavePayload {
            choice: self.state.choice,
            toolkit: Some(self.toolkit_output()),
        }
    }

    /// Score and close the scenario. Returns `None` when submission is
    /// unavailable; the session is left untouched in that case.
    pub fn submit(&mut self, priors: &dyn QualityPrior) -> Option<StepResult> {
        if !self.can_submit() {
            debug!(
                scenario = %self.scenario.scenario_id,
                phase = ?self.phase(),
                "submit unavailable"
            );
            return None;
        }
        let choice = self.state.choice?;
        let toolkit_out = self.toolkit_output();
        let fill = ToolkitFill::from_output(
            &toolkit_out,
            self.scenario.toolkit_flow.prompts.len(),
            self.applicable_actions().len(),
        );
        let reflection_chars = self.reflection.trim().chars().count();
        let prior = priors.prior(&self.scenario.scenario_id, choice);
        let score = score_decision(
            &self.scenario,
            choice,
            &fill,
            &self.p3,
            reflection_chars,
            prior,
        );
        let outcome = describe_result(&self.scenario, choice);
        self.submitted = true;
        info!(
            scenario = %self.scenario.scenario_id,
            %choice,
            total = score.total,
            "scenario submitted"
        );
        Some(StepResult {
            scenario_id: self.scenario.scenario_id.clone(),
            choice,
            toolkit_out,
            p3_out: self.p3,
            reflection: self.reflection.clone(),
            score,
            outcome: Some(outcome),
        })
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.submitted {
            Err(SessionError::AlreadySubmitted)
        } else {
            Ok(())
        }
    }

    fn recompute(&mut self) {
        self.is_complete =
            derive_completion(&self.state, &self.scenario.toolkit_flow, self.min_answer_chars);
    }
}
