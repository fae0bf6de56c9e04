//! Level traversal, the per-run result list, and completion recording.

use crate::session::ScenarioSession;
use persistence::{write_latest_run, write_save, SessionStorage, StoredProgress};
use sandbox_core::{
    LevelPack, ProgressStore, RunRecord, SandboxConfig, SaveState, Scenario, StepResult,
};
use scoring::QualityPrior;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("level {level} has no scenarios")]
    NoScenarios { level: u32 },
    #[error("saved index {idx} is outside level {level} ({len} scenarios)")]
    ResumeOutOfRange { level: u32, idx: usize, len: usize },
}

/// Totals shown on the results page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub count: u32,
    pub total: u32,
    pub average: u32,
}

impl RunSummary {
    /// Sum over submitted steps; unsubmitted indices are skipped.
    pub fn from_steps(steps: &[Option<StepResult>]) -> Self {
        let (count, total) = steps
            .iter()
            .flatten()
            .fold((0u32, 0u32), |(n, t), s| (n + 1, t + s.score.total));
        let average = if count == 0 {
            0
        } else {
            (f64::from(total) / f64::from(count)).round() as u32
        };
        Self {
            count,
            total,
            average,
        }
    }
}

/// What a successful submission produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub index: usize,
    pub step: StepResult,
    /// The submitted scenario was the level's last.
    pub level_finished: bool,
    /// Completion was written to the completion record.
    pub completion_recorded: bool,
}

/// A player's pass through one level.
pub struct LevelRun {
    pack: LevelPack,
    cfg: SandboxConfig,
    idx: usize,
    session: ScenarioSession,
    results: Vec<Option<StepResult>>,
}

impl LevelRun {
    /// Start at index 0, or at the saved index when `saved` belongs to this level.
    pub fn start(
        pack: LevelPack,
        saved: Option<&SaveState>,
        cfg: &SandboxConfig,
    ) -> Result<Self, RunError> {
        let len = pack.scenarios.len();
        let first = pack
            .scenarios
            .first()
            .cloned()
            .ok_or(RunError::NoScenarios { level: pack.level })?;

        let mut run = Self {
            session: ScenarioSession::new(first, cfg),
            results: vec![None; len],
            cfg: cfg.clone(),
            idx: 0,
            pack,
        };

        match saved {
            Some(save) if save.level == run.pack.level => {
                if save.idx >= len {
                    warn!(level = save.level, idx = save.idx, len, "saved index out of range");
                    return Err(RunError::ResumeOutOfRange {
                        level: save.level,
                        idx: save.idx,
                        len,
                    });
                }
                run.go_to(save.idx);
                info!(level = run.pack.level, idx = save.idx, "resumed from save");
            }
            Some(save) => {
                debug!(saved = save.level, level = run.pack.level, "save belongs to another level");
            }
            None => {}
        }
        Ok(run)
    }

    pub fn level(&self) -> u32 {
        self.pack.level
    }

    pub fn title(&self) -> &str {
        &self.pack.title
    }

    pub fn index(&self) -> usize {
        self.idx
    }

    pub fn len(&self) -> usize {
        self.pack.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pack.scenarios.is_empty()
    }

    pub fn current(&self) -> &Scenario {
        self.session.scenario()
    }

    pub fn session(&self) -> &ScenarioSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ScenarioSession {
        &mut self.session
    }

    pub fn is_last(&self) -> bool {
        self.idx + 1 == self.len()
    }

    pub fn has_next(&self) -> bool {
        !self.is_last()
    }

    /// Move back one scenario. No-op at index 0.
    pub fn prev(&mut self) -> bool {
        if self.idx == 0 {
            return false;
        }
        self.go_to(self.idx - 1);
        true
    }

    /// Move forward one scenario. Unavailable at the last index.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.go_to(self.idx + 1);
        true
    }

    /// Results so far, one slot per scenario index.
    pub fn results(&self) -> &[Option<StepResult>] {
        &self.results
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_steps(&self.results)
    }

    pub fn record(&self) -> RunRecord {
        RunRecord {
            level: self.pack.level,
            steps: self.results.clone(),
        }
    }

    /// Submit the current scenario.
    ///
    /// Returns `None` when submission is unavailable. Resubmitting an index
    /// replaces its earlier result. Submitting the last scenario stores the
    /// run under `LATEST_RUN` and, when the completion policy allows it,
    /// marks the level complete.
    pub fn submit_current(
        &mut self,
        priors: &dyn QualityPrior,
        storage: &mut dyn SessionStorage,
    ) -> Option<Submission> {
        let step = self.session.submit(priors)?;
        self.results[self.idx] = Some(step.clone());

        let level_finished = self.is_last();
        let mut completion_recorded = false;
        if level_finished {
            write_latest_run(storage, &self.record());
            if self.cfg.records_completion(self.pack.level) {
                StoredProgress::new(storage).set(self.pack.level);
                completion_recorded = true;
            }
            info!(
                level = self.pack.level,
                completion_recorded,
                "level finished"
            );
        }
        Some(Submission {
            index: self.idx,
            step,
            level_finished,
            completion_recorded,
        })
    }

    /// Persist the current position to the single save slot.
    pub fn save(&self, storage: &mut dyn SessionStorage) -> SaveState {
        write_save(
            storage,
            self.pack.level,
            self.idx,
            self.session.save_payload(),
        )
    }

    fn go_to(&mut self, idx: usize) {
        if let Some(scenario) = self.pack.scenarios.get(idx) {
            self.idx = idx;
            self.session = ScenarioSession::new(scenario.clone(), &self.cfg);
            debug!(level = self.pack.level, idx, scenario = %scenario.scenario_id, "moved");
        }
    }
}
