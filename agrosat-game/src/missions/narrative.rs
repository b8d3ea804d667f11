//! Timed narration scripts for mission intros and resolutions.
//!
//! Scripts are lazy and borrow the mission data; the host pulls one event at a
//! time, waits `delay_ms`, and shows it. Dropping or restarting a script
//! cancels whatever was still pending.
use serde::Serialize;

use super::{DialogueStep, Mission, MissionChoice};
use crate::constants::{
    COMPLETION_LINE_GAP_MS, DECISION_PROMPT_DELAY_MS, FEEDBACK_DELAY_MS, INTRO_LEAD_IN_MS,
    INTRO_LINE_GAP_MS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum NarrativeKind<'a> {
    /// Intro line spoken by the guide.
    Line(&'a DialogueStep),
    /// The mission's choices should be shown now.
    DecisionPrompt,
    /// Label of the choice just made.
    Milestone(&'a str),
    Feedback(&'a DialogueStep),
    CompletionLine(&'a DialogueStep),
    MissionComplete,
}

/// One scheduled narration beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeEvent<'a> {
    /// Wait since the previous event, in wall-clock milliseconds.
    pub delay_ms: u64,
    #[serde(flatten)]
    pub kind: NarrativeKind<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage<'a> {
    Intro,
    Resolution(Option<&'a MissionChoice>),
}

#[derive(Debug, Clone)]
pub struct NarrativeScript<'a> {
    mission: &'a Mission,
    stage: Stage<'a>,
    cursor: usize,
}

impl<'a> NarrativeScript<'a> {
    /// Intro lines followed by the decision prompt, when the mission has one.
    #[must_use]
    pub const fn intro(mission: &'a Mission) -> Self {
        Self {
            mission,
            stage: Stage::Intro,
            cursor: 0,
        }
    }

    /// Milestone and feedback for `choice` (if any), then the completion lines.
    #[must_use]
    pub const fn resolution(mission: &'a Mission, choice: Option<&'a MissionChoice>) -> Self {
        Self {
            mission,
            stage: Stage::Resolution(choice),
            cursor: 0,
        }
    }

    /// Rewind to the first event.
    pub const fn restart(&mut self) {
        self.cursor = 0;
    }

    /// Sum of every delay in the script.
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        let mut fresh = self.clone();
        fresh.restart();
        fresh.map(|event| event.delay_ms).sum()
    }

    fn total_events(&self) -> usize {
        match self.stage {
            Stage::Intro => {
                self.mission.intro_dialogue.len() + usize::from(self.mission.has_decision())
            }
            Stage::Resolution(choice) => {
                let decision =
                    choice.map_or(0, |choice| 1 + usize::from(choice.feedback.is_some()));
                decision + self.mission.completion_dialogue.len() + 1
            }
        }
    }

    fn event_at(&self, index: usize) -> Option<NarrativeEvent<'a>> {
        match self.stage {
            Stage::Intro => self.intro_event(index),
            Stage::Resolution(choice) => self.resolution_event(choice, index),
        }
    }

    fn intro_event(&self, index: usize) -> Option<NarrativeEvent<'a>> {
        let lines = &self.mission.intro_dialogue;
        if let Some(line) = lines.get(index) {
            let delay_ms = if index == 0 {
                INTRO_LEAD_IN_MS
            } else {
                INTRO_LINE_GAP_MS
            };
            return Some(NarrativeEvent {
                delay_ms,
                kind: NarrativeKind::Line(line),
            });
        }
        (index == lines.len() && self.mission.has_decision()).then_some(NarrativeEvent {
            delay_ms: DECISION_PROMPT_DELAY_MS,
            kind: NarrativeKind::DecisionPrompt,
        })
    }

    fn resolution_event(
        &self,
        choice: Option<&'a MissionChoice>,
        mut index: usize,
    ) -> Option<NarrativeEvent<'a>> {
        if let Some(choice) = choice {
            if index == 0 {
                return Some(NarrativeEvent {
                    delay_ms: 0,
                    kind: NarrativeKind::Milestone(&choice.label),
                });
            }
            index -= 1;
            if let Some(feedback) = &choice.feedback {
                if index == 0 {
                    return Some(NarrativeEvent {
                        delay_ms: FEEDBACK_DELAY_MS,
                        kind: NarrativeKind::Feedback(feedback),
                    });
                }
                index -= 1;
            }
        }
        let lines = &self.mission.completion_dialogue;
        if let Some(line) = lines.get(index) {
            return Some(NarrativeEvent {
                delay_ms: COMPLETION_LINE_GAP_MS,
                kind: NarrativeKind::CompletionLine(line),
            });
        }
        (index == lines.len()).then_some(NarrativeEvent {
            delay_ms: COMPLETION_LINE_GAP_MS,
            kind: NarrativeKind::MissionComplete,
        })
    }
}

impl<'a> Iterator for NarrativeScript<'a> {
    type Item = NarrativeEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.event_at(self.cursor)?;
        self.cursor += 1;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total_events().saturating_sub(self.cursor);
        (left, Some(left))
    }
}

impl ExactSizeIterator for NarrativeScript<'_> {}
