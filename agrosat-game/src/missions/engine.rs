//! Mission progression state machine.
use log::info;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

use super::{DialogueStep, Mission, MissionCatalog};
use crate::constants::LOG_TARGET;
use crate::error::{ActionError, InvalidReference, Rejection};
use crate::plots::{PlotChange, PlotMetric, PlotRegistry};
use crate::resources::{LedgerChange, ResourceLedger};

/// Where a mission stands in its narrative and decision flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MissionPhase {
    NotStarted,
    /// Showing intro line `line`.
    IntroPlaying { line: usize },
    AwaitingChoice,
    /// Decision applied (or skipped for narrative-only missions); feedback pending.
    Resolved,
    /// Showing completion line `line`.
    CompletionPlaying { line: usize },
    Completed,
}

impl MissionPhase {
    #[must_use]
    pub const fn is_awaiting_choice(self) -> bool {
        matches!(self, Self::AwaitingChoice)
    }

    /// Phase reached once the intro has been shown.
    const fn after_intro(mission_has_decision: bool) -> Self {
        if mission_has_decision {
            Self::AwaitingChoice
        } else {
            Self::Resolved
        }
    }

    fn entry(mission: &Mission) -> Self {
        if mission.intro_dialogue.is_empty() {
            Self::after_intro(mission.has_decision())
        } else {
            Self::IntroPlaying { line: 0 }
        }
    }

    fn completion_entry(mission: &Mission) -> Self {
        if mission.completion_dialogue.is_empty() {
            Self::Completed
        } else {
            Self::CompletionPlaying { line: 0 }
        }
    }
}

/// Per-mission runtime record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionProgress {
    pub phase: MissionPhase,
    /// Flips once from false to true.
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen: Option<String>,
}

impl Default for MissionProgress {
    fn default() -> Self {
        Self {
            phase: MissionPhase::NotStarted,
            completed: false,
            chosen: None,
        }
    }
}

impl MissionProgress {
    fn enter(&mut self, phase: MissionPhase) {
        if matches!(phase, MissionPhase::Resolved) {
            self.completed = true;
        }
        self.phase = phase;
    }
}

/// Result of a successful mission decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionOutcome {
    pub mission_id: String,
    pub choice_id: String,
    pub change: LedgerChange,
    pub plot_changes: SmallVec<[PlotChange; 2]>,
    pub feedback: Option<DialogueStep>,
    pub phase: MissionPhase,
}

/// Tracks every mission's progress and the single current-mission pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MissionEngine {
    progress: BTreeMap<String, MissionProgress>,
    current: Option<String>,
}

impl MissionEngine {
    #[must_use]
    pub fn new(catalog: &MissionCatalog) -> Self {
        Self {
            progress: catalog
                .iter()
                .map(|mission| (mission.id.clone(), MissionProgress::default()))
                .collect(),
            current: None,
        }
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn progress(&self, mission_id: &str) -> Option<&MissionProgress> {
        self.progress.get(mission_id)
    }

    #[must_use]
    pub fn phase(&self, mission_id: &str) -> MissionPhase {
        self.progress
            .get(mission_id)
            .map_or(MissionPhase::NotStarted, |progress| progress.phase)
    }

    #[must_use]
    pub fn is_completed(&self, mission_id: &str) -> bool {
        self.progress
            .get(mission_id)
            .is_some_and(|progress| progress.completed)
    }

    pub fn completed_ids(&self) -> impl Iterator<Item = &str> {
        self.progress
            .iter()
            .filter(|(_, progress)| progress.completed)
            .map(|(id, _)| id.as_str())
    }

    /// Make `mission` current and rewind its dialogue cursor.
    ///
    /// An unfinished mission that loses the pointer goes back to `NotStarted`.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::MissionCompleted`] for missions already decided.
    pub fn start(&mut self, mission: &Mission) -> Result<MissionPhase, Rejection> {
        if self.is_completed(&mission.id) {
            return Err(Rejection::MissionCompleted {
                mission_id: mission.id.clone(),
            });
        }
        if let Some(previous) = self.current.take()
            && previous != mission.id
            && let Some(progress) = self.progress.get_mut(&previous)
            && !progress.completed
        {
            progress.phase = MissionPhase::NotStarted;
        }
        let phase = MissionPhase::entry(mission);
        self.progress
            .entry(mission.id.clone())
            .or_default()
            .enter(phase);
        self.current = Some(mission.id.clone());
        info!(target: LOG_TARGET, "mission {} started ({phase:?})", mission.id);
        Ok(phase)
    }

    /// Move the dialogue cursor of the current mission one step forward.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::NoDialoguePending`] when nothing is being narrated
    /// (not started, waiting for a decision, or finished).
    pub fn advance(&mut self, mission: &Mission) -> Result<MissionPhase, Rejection> {
        let progress = self.current_progress_mut(mission)?;
        let next = match progress.phase {
            MissionPhase::IntroPlaying { line } if line + 1 < mission.intro_dialogue.len() => {
                MissionPhase::IntroPlaying { line: line + 1 }
            }
            MissionPhase::IntroPlaying { .. } => MissionPhase::after_intro(mission.has_decision()),
            MissionPhase::Resolved => MissionPhase::completion_entry(mission),
            MissionPhase::CompletionPlaying { line }
                if line + 1 < mission.completion_dialogue.len() =>
            {
                MissionPhase::CompletionPlaying { line: line + 1 }
            }
            MissionPhase::CompletionPlaying { .. } => MissionPhase::Completed,
            MissionPhase::NotStarted | MissionPhase::AwaitingChoice | MissionPhase::Completed => {
                return Err(Rejection::NoDialoguePending);
            }
        };
        progress.enter(next);
        Ok(next)
    }

    /// Jump past the remaining intro lines.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::NoDialoguePending`] if the mission is not current.
    pub fn skip_intro(&mut self, mission: &Mission) -> Result<MissionPhase, Rejection> {
        let progress = self.current_progress_mut(mission)?;
        if let MissionPhase::IntroPlaying { .. } = progress.phase {
            progress.enter(MissionPhase::after_intro(mission.has_decision()));
        }
        Ok(progress.phase)
    }

    /// The line under the dialogue cursor, if a line is being shown.
    #[must_use]
    pub fn current_line<'a>(&self, mission: &'a Mission) -> Option<&'a DialogueStep> {
        if self.current.as_deref() != Some(mission.id.as_str()) {
            return None;
        }
        match self.phase(&mission.id) {
            MissionPhase::IntroPlaying { line } => mission.intro_dialogue.get(line),
            MissionPhase::CompletionPlaying { line } => mission.completion_dialogue.get(line),
            _ => None,
        }
    }

    /// Resolve the pending decision of `mission` with `choice_id`.
    ///
    /// `choice.cost` gates the decision; the ledger moves by `choice.effects`
    /// only, applied as one batch together with the plot readings.
    ///
    /// # Errors
    ///
    /// - [`InvalidReference::UnknownChoice`] when the mission has no such choice.
    /// - [`Rejection::MissionCompleted`] / [`Rejection::MissionNotAwaitingChoice`]
    ///   when the mission is not waiting for a decision.
    /// - [`Rejection::InsufficientFunds`] when money is below the choice cost.
    pub fn choose(
        &mut self,
        mission: &Mission,
        choice_id: &str,
        ledger: &mut ResourceLedger,
        plots: &mut PlotRegistry,
    ) -> Result<MissionOutcome, ActionError> {
        let choice = mission
            .choice(choice_id)
            .ok_or_else(|| InvalidReference::UnknownChoice {
                mission_id: mission.id.clone(),
                choice_id: choice_id.to_string(),
            })?;
        let is_current = self.current.as_deref() == Some(mission.id.as_str());
        if !is_current || !self.phase(&mission.id).is_awaiting_choice() {
            if self.is_completed(&mission.id) {
                return Err(Rejection::MissionCompleted {
                    mission_id: mission.id.clone(),
                }
                .into());
            }
            return Err(Rejection::MissionNotAwaitingChoice {
                mission_id: mission.id.clone(),
            }
            .into());
        }
        if !ledger.can_afford(choice.cost) {
            return Err(Rejection::InsufficientFunds {
                required: choice.cost,
                available: ledger.money(),
            }
            .into());
        }

        let change = ledger.apply(&choice.effects.resources);
        let plot_changes: SmallVec<[PlotChange; 2]> = [
            (PlotMetric::Ndvi, choice.effects.plot_ndvi.as_ref()),
            (PlotMetric::Humidity, choice.effects.plot_humidity.as_ref()),
        ]
        .into_iter()
        .filter_map(|(metric, delta)| delta.and_then(|delta| plots.adjust(metric, delta)))
        .collect();

        let progress = self.progress.entry(mission.id.clone()).or_default();
        progress.chosen = Some(choice.id.clone());
        progress.enter(MissionPhase::Resolved);
        info!(
            target: LOG_TARGET,
            "mission {} resolved with {} (money {} -> {})",
            mission.id,
            choice.id,
            change.before.money,
            change.after.money
        );

        Ok(MissionOutcome {
            mission_id: mission.id.clone(),
            choice_id: choice.id.clone(),
            change,
            plot_changes,
            feedback: choice.feedback.clone(),
            phase: progress.phase,
        })
    }

    fn current_progress_mut(
        &mut self,
        mission: &Mission,
    ) -> Result<&mut MissionProgress, Rejection> {
        if self.current.as_deref() != Some(mission.id.as_str()) {
            return Err(Rejection::NoDialoguePending);
        }
        self.progress
            .get_mut(&mission.id)
            .ok_or(Rejection::NoDialoguePending)
    }
}
