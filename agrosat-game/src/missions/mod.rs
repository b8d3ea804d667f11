//! Scripted missions: narrated intros, weighted choices and completion lines.
use serde::{Deserialize, Serialize};

use crate::plots::PlotDelta;
use crate::resources::ResourceDelta;

pub mod engine;
pub mod narrative;

pub use engine::{MissionEngine, MissionOutcome, MissionPhase, MissionProgress};
pub use narrative::{NarrativeEvent, NarrativeKind, NarrativeScript};

/// Emotion tag attached to each narrated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Worried,
    Sad,
}

/// One narrated line spoken by the guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueStep {
    pub text: String,
    #[serde(default)]
    pub emotion: Emotion,
}

impl DialogueStep {
    #[must_use]
    pub fn new(text: impl Into<String>, emotion: Emotion) -> Self {
        Self {
            text: text.into(),
            emotion,
        }
    }
}

/// Everything a mission choice changes: meters plus optional plot readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceEffects {
    #[serde(flatten)]
    pub resources: ResourceDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_ndvi: Option<PlotDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_humidity: Option<PlotDelta>,
}

impl ChoiceEffects {
    /// Plot ids referenced by this effect.
    pub fn plot_refs(&self) -> impl Iterator<Item = &str> {
        self.plot_ndvi
            .iter()
            .chain(self.plot_humidity.iter())
            .map(|delta| delta.plot_id.as_str())
    }
}

/// A decision offered by a mission.
///
/// `cost` only gates eligibility; the balance moves by `effects.money`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionChoice {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub effects: ChoiceEffects,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<DialogueStep>,
}

/// Static mission definition. Completion state lives in [`MissionEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub intro_dialogue: Vec<DialogueStep>,
    /// Empty means the mission is narrative-only.
    #[serde(default)]
    pub choices: Vec<MissionChoice>,
    #[serde(default)]
    pub completion_dialogue: Vec<DialogueStep>,
}

impl Mission {
    #[must_use]
    pub fn choice(&self, choice_id: &str) -> Option<&MissionChoice> {
        self.choices.iter().find(|choice| choice.id == choice_id)
    }

    #[must_use]
    pub fn has_decision(&self) -> bool {
        !self.choices.is_empty()
    }
}

/// Ordered mission catalog. The first entry is where every session begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MissionCatalog {
    pub missions: Vec<Mission>,
}

impl MissionCatalog {
    #[must_use]
    pub fn from_missions(missions: Vec<Mission>) -> Self {
        Self { missions }
    }

    /// Load missions from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a mission catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn get(&self, mission_id: &str) -> Option<&Mission> {
        self.missions.iter().find(|mission| mission.id == mission_id)
    }

    #[must_use]
    pub fn first(&self) -> Option<&Mission> {
        self.missions.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mission> {
        self.missions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_effects_parse_flat_meters_and_plot_deltas() {
        let json = r#"{
            "missions": [{
                "id": "mission-1",
                "title": "Lemon Planting",
                "introDialogue": [{ "text": "Hello!", "emotion": "happy" }],
                "choices": [{
                    "id": "drip",
                    "label": "Drip irrigation",
                    "cost": 8000,
                    "effects": {
                        "money": -8000,
                        "beaHealth": 20,
                        "plotNdvi": { "plotId": "plot-1", "change": 0.15 },
                        "plotHumidity": { "plotId": "plot-1", "change": 15 }
                    },
                    "feedback": { "text": "Great call.", "emotion": "happy" }
                }]
            }]
        }"#;
        let catalog = MissionCatalog::from_json(json).unwrap();
        let mission = catalog.first().unwrap();
        assert!(mission.has_decision());
        assert!(mission.completion_dialogue.is_empty());
        let choice = mission.choice("drip").unwrap();
        assert_eq!(choice.cost, 8_000);
        assert_eq!(choice.effects.resources.money, Some(-8_000));
        assert_eq!(choice.effects.resources.guide_health, Some(20));
        assert_eq!(choice.effects.resources.productivity, None);
        assert_eq!(choice.effects.plot_refs().collect::<Vec<_>>(), ["plot-1", "plot-1"]);
        assert_eq!(choice.feedback.as_ref().unwrap().emotion, Emotion::Happy);
    }
}
