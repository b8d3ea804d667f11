//! Read-only projections of a session for rendering.
use serde::Serialize;

use crate::environment::EnvironmentalData;
use crate::missions::{DialogueStep, MissionPhase};
use crate::planting::PlotPhase;
use crate::plots::{PlotCondition, PlotLayout};
use crate::provinces::Province;
use crate::resources::{GuideMood, Resources};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantingView {
    pub crop_id: String,
    pub crop_name: String,
    pub monthly_cost: i64,
    pub growth_months: f64,
    pub elapsed_months: f64,
    pub remaining_months: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotSnapshot {
    pub plot_id: String,
    pub name: String,
    pub ndvi: f64,
    pub humidity: f64,
    pub condition: PlotCondition,
    pub layout: PlotLayout,
    pub phase: PlotPhase,
    pub planting: Option<PlantingView>,
    /// True for the plot with the highest NDVI.
    pub recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceView {
    pub id: String,
    pub label: String,
    pub description: String,
    pub cost: i64,
    pub affordable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionView {
    pub id: String,
    pub title: String,
    pub phase: MissionPhase,
    pub completed: bool,
    pub current_line: Option<DialogueStep>,
    /// Populated only while the mission waits for a decision.
    pub choices: Vec<ChoiceView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionView {
    pub resources: Resources,
    pub mood: GuideMood,
    pub game_over: bool,
    pub province: Option<Province>,
    pub speed_multiplier: u32,
    pub clock_running: bool,
    pub simulated_months: f64,
    pub plots: Vec<PlotSnapshot>,
    pub current_mission: Option<MissionView>,
    pub completed_missions: Vec<String>,
    pub environment: EnvironmentalData,
}
