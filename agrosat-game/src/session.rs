//! The game session: single owner of every ledger and the operation surface
//! the host view calls into.
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::GrowthClock;
use crate::config::{CropEffectTiming, EngineConfig};
use crate::constants::LOG_TARGET;
use crate::crops::ReactionTier;
use crate::data::CatalogBundle;
use crate::environment::{EnvironmentPatch, EnvironmentalData};
use crate::error::{ActionError, InvalidReference, Rejection};
use crate::events::EngineEvent;
use crate::missions::{
    DialogueStep, Mission, MissionEngine, MissionOutcome, MissionPhase, NarrativeScript,
};
use crate::planting::{PlantedCrop, PlantingLedger, ReadyPlots};
use crate::plots::PlotRegistry;
use crate::resources::{GuideMood, LedgerChange, ResourceDelta, ResourceLedger, Resources};
use crate::snapshot::{ChoiceView, GameSessionView, MissionView, PlantingView, PlotSnapshot};

/// Result of a successful planting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantOutcome {
    pub planted: PlantedCrop,
    /// Whether the crop lists the session's province as suitable.
    pub suitable: bool,
    pub reaction: ReactionTier,
    /// Present when crop effects apply at planting.
    pub change: Option<LedgerChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestOutcome {
    pub plot_id: String,
    pub crop_id: String,
    /// Present when crop effects apply at harvest.
    pub change: Option<LedgerChange>,
}

/// What one clock tick did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Clock units (ms at x1) of simulated time that elapsed.
    pub units: u64,
    pub months_charged: u64,
    pub upkeep_charged: i64,
    pub ready: ReadyPlots,
    pub change: Option<LedgerChange>,
}

impl TickReport {
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.units == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedChange {
    pub multiplier: u32,
    pub cost_charged: i64,
    pub change: Option<LedgerChange>,
}

fn log_rejection(operation: &'static str) -> impl Fn(&ActionError) {
    move |err| warn!(target: LOG_TARGET, "{operation} rejected: {err}")
}

/// Aggregate root for one playthrough.
///
/// Catalogs are shared and immutable; everything else is rebuilt by
/// [`GameSession::restart`].
#[derive(Debug, Clone)]
pub struct GameSession {
    catalogs: Arc<CatalogBundle>,
    config: EngineConfig,
    province_id: String,
    ledger: ResourceLedger,
    plots: PlotRegistry,
    plantings: PlantingLedger,
    clock: GrowthClock,
    missions: MissionEngine,
    environment: EnvironmentalData,
    game_over: bool,
    events: Vec<EngineEvent>,
}

impl GameSession {
    /// Build a session from the bundled catalogs and engine config.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled data fails to load or validate.
    pub fn create() -> anyhow::Result<Self> {
        let config = EngineConfig::load_from_static();
        config.validate()?;
        let catalogs = Arc::new(CatalogBundle::load_from_static()?);
        let province = config.starting_province.clone();
        Ok(Self::new(catalogs, config, &province)?)
    }

    /// Build a session located in `province_id`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReference`] if the province or the configured first
    /// mission is not in the catalogs.
    pub fn new(
        catalogs: Arc<CatalogBundle>,
        config: EngineConfig,
        province_id: &str,
    ) -> Result<Self, InvalidReference> {
        if !catalogs.provinces.contains(province_id) {
            return Err(InvalidReference::UnknownProvince(province_id.to_string()));
        }
        if let Some(first) = &config.first_mission
            && catalogs.missions.get(first).is_none()
        {
            return Err(InvalidReference::UnknownMission(first.clone()));
        }
        Ok(Self::initial(catalogs, config, province_id.to_string()))
    }

    fn initial(catalogs: Arc<CatalogBundle>, config: EngineConfig, province_id: String) -> Self {
        let ledger = ResourceLedger::new(config.initial_resources);
        let mut session = Self {
            plots: PlotRegistry::new(catalogs.plots.clone()),
            plantings: PlantingLedger::new(),
            clock: GrowthClock::new(config.month_ms),
            missions: MissionEngine::new(&catalogs.missions),
            environment: EnvironmentalData::default(),
            game_over: ledger.guide_health() <= 0,
            events: Vec::new(),
            ledger,
            catalogs,
            config,
            province_id,
        };
        let catalogs = Arc::clone(&session.catalogs);
        let first = match &session.config.first_mission {
            Some(id) => catalogs.missions.get(id),
            None => catalogs.missions.first(),
        };
        if let Some(mission) = first
            && let Err(err) = session.missions.start(mission)
        {
            warn!(target: LOG_TARGET, "could not start {}: {err}", mission.id);
        }
        session
    }

    /// Discard all progress and rebuild the session from its defaults.
    /// Allowed in every state, including game over.
    pub fn restart(&mut self) {
        *self = Self::initial(
            Arc::clone(&self.catalogs),
            self.config.clone(),
            self.province_id.clone(),
        );
        info!(target: LOG_TARGET, "session restarted in {}", self.province_id);
        self.events.push(EngineEvent::Restarted);
    }

    // Accessors -----------------------------------------------------------

    #[must_use]
    pub fn catalogs(&self) -> &CatalogBundle {
        &self.catalogs
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn province_id(&self) -> &str {
        &self.province_id
    }

    #[must_use]
    pub const fn resources(&self) -> Resources {
        self.ledger.values()
    }

    #[must_use]
    pub const fn plots(&self) -> &PlotRegistry {
        &self.plots
    }

    #[must_use]
    pub const fn plantings(&self) -> &PlantingLedger {
        &self.plantings
    }

    #[must_use]
    pub const fn missions(&self) -> &MissionEngine {
        &self.missions
    }

    #[must_use]
    pub const fn environment(&self) -> &EnvironmentalData {
        &self.environment
    }

    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub const fn speed_multiplier(&self) -> u32 {
        self.clock.multiplier()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Wall-clock cadence, in ms, at which the host should call [`Self::tick`].
    #[must_use]
    pub const fn tick_interval_ms(&self) -> u64 {
        self.config.tick_interval_ms
    }

    /// Simulated months elapsed since the session began.
    #[must_use]
    pub fn simulated_months(&self) -> f64 {
        self.clock.simulated_months()
    }

    #[must_use]
    pub fn current_mission(&self) -> Option<&Mission> {
        self.missions
            .current_id()
            .and_then(|id| self.catalogs.missions.get(id))
    }

    /// The dialogue line under the cursor of the current mission.
    #[must_use]
    pub fn current_line(&self) -> Option<&DialogueStep> {
        self.current_mission()
            .and_then(|mission| self.missions.current_line(mission))
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // Clock lifecycle -----------------------------------------------------

    /// Halt the growth clock; later ticks do nothing until [`Self::resume`].
    pub fn stop(&mut self) {
        self.clock.stop();
        debug!(target: LOG_TARGET, "clock stopped");
    }

    /// Restart the clock. Time missed while stopped is not backfilled.
    pub fn resume(&mut self) {
        self.clock.resume();
        debug!(target: LOG_TARGET, "clock resumed");
    }

    // Operations ----------------------------------------------------------

    /// Read-only view of one plot.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReference::UnknownPlot`] for ids not in the registry.
    pub fn select_plot(&self, plot_id: &str) -> Result<PlotSnapshot, InvalidReference> {
        self.plot_snapshot(plot_id)
            .ok_or_else(|| InvalidReference::UnknownPlot(plot_id.to_string()))
    }

    /// Put `crop_id` into an empty plot.
    ///
    /// # Errors
    ///
    /// Rejected when the session is over or the plot is occupied; invalid for
    /// unknown plot or crop ids.
    pub fn plant(&mut self, plot_id: &str, crop_id: &str) -> Result<PlantOutcome, ActionError> {
        self.ensure_active()
            .and_then(|()| self.apply_plant(plot_id, crop_id))
            .inspect_err(log_rejection("plant"))
    }

    /// Clear a ready plot.
    ///
    /// # Errors
    ///
    /// Rejected when the session is over or the plot is empty or still growing.
    pub fn harvest(&mut self, plot_id: &str) -> Result<HarvestOutcome, ActionError> {
        self.ensure_active()
            .and_then(|()| self.apply_harvest(plot_id))
            .inspect_err(log_rejection("harvest"))
    }

    /// Advance the growth clock by `real_elapsed_ms` of wall-clock time.
    ///
    /// Growth is applied first; upkeep for every whole simulated month that
    /// completed is then charged against the plantings present at the start
    /// of the tick. A stopped clock or zero elapsed time yields an idle report.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::GameOver`] once the session has ended.
    pub fn tick(&mut self, real_elapsed_ms: u64) -> Result<TickReport, Rejection> {
        if self.game_over {
            return Err(Rejection::GameOver);
        }
        let upkeep_per_month = self.plantings.upkeep_total();
        let advance = self.clock.advance(real_elapsed_ms);
        if advance.units == 0 {
            return Ok(TickReport::default());
        }

        let ready = self.plantings.advance(advance.units);
        for plot_id in &ready {
            if let Some(planted) = self.plantings.get(plot_id) {
                info!(target: LOG_TARGET, "{} on {plot_id} is ready to harvest", planted.crop_id);
                self.events.push(EngineEvent::CropReady {
                    plot_id: plot_id.clone(),
                    crop_id: planted.crop_id.clone(),
                });
            }
        }

        let mut report = TickReport {
            units: advance.units,
            ready,
            ..TickReport::default()
        };
        if advance.months_due > 0 && upkeep_per_month > 0 {
            let months = i64::try_from(advance.months_due).unwrap_or(i64::MAX);
            let amount = upkeep_per_month.saturating_mul(months);
            let change = self.ledger.apply(&ResourceDelta::money(-amount));
            debug!(
                target: LOG_TARGET,
                "upkeep {amount} for {} month(s); money {} -> {}",
                advance.months_due,
                change.before.money,
                change.after.money
            );
            self.events.push(EngineEvent::UpkeepCharged {
                months: advance.months_due,
                amount,
                money: change.after.money,
            });
            self.record_change(&change);
            report.months_charged = advance.months_due;
            report.upkeep_charged = amount;
            report.change = Some(change);
        }
        Ok(report)
    }

    /// Switch the time multiplier.
    ///
    /// Gated tiers charge their unlock cost each time they are switched into
    /// from another tier; reselecting the current tier is free.
    ///
    /// # Errors
    ///
    /// Rejected for insufficient funds or after game over; invalid for
    /// multipliers outside the speed policy.
    pub fn set_time_speed(&mut self, multiplier: u32) -> Result<SpeedChange, ActionError> {
        self.ensure_active()
            .and_then(|()| self.apply_speed(multiplier))
            .inspect_err(log_rejection("set_time_speed"))
    }

    /// Make `mission_id` the current mission and rewind its dialogue.
    ///
    /// # Errors
    ///
    /// Rejected for completed missions or after game over; invalid for
    /// unknown mission ids.
    pub fn start_mission(&mut self, mission_id: &str) -> Result<MissionPhase, ActionError> {
        self.ensure_active()
            .and_then(|()| {
                let catalogs = Arc::clone(&self.catalogs);
                let mission = catalogs
                    .missions
                    .get(mission_id)
                    .ok_or_else(|| InvalidReference::UnknownMission(mission_id.to_string()))?;
                Ok(self.missions.start(mission)?)
            })
            .inspect_err(log_rejection("start_mission"))
    }

    /// Step the current mission's dialogue cursor.
    ///
    /// # Errors
    ///
    /// Rejected when no line is pending or after game over.
    pub fn advance_dialogue(&mut self) -> Result<MissionPhase, ActionError> {
        self.ensure_active()
            .and_then(|()| {
                let catalogs = Arc::clone(&self.catalogs);
                let mission = self.current_mission_in(&catalogs)?;
                Ok(self.missions.advance(mission)?)
            })
            .inspect_err(log_rejection("advance_dialogue"))
    }

    /// Jump to the current mission's decision point.
    ///
    /// # Errors
    ///
    /// Rejected when there is no current mission or after game over.
    pub fn skip_intro(&mut self) -> Result<MissionPhase, ActionError> {
        self.ensure_active()
            .and_then(|()| {
                let catalogs = Arc::clone(&self.catalogs);
                let mission = self.current_mission_in(&catalogs)?;
                Ok(self.missions.skip_intro(mission)?)
            })
            .inspect_err(log_rejection("skip_intro"))
    }

    /// Resolve the decision of `mission_id`.
    ///
    /// # Errors
    ///
    /// Rejected for insufficient funds, a mission not awaiting a choice, or
    /// after game over; invalid for unknown mission or choice ids.
    pub fn choose_mission_option(
        &mut self,
        mission_id: &str,
        choice_id: &str,
    ) -> Result<MissionOutcome, ActionError> {
        self.ensure_active()
            .and_then(|()| self.apply_choice(mission_id, choice_id))
            .inspect_err(log_rejection("choose_mission_option"))
    }

    /// Merge new environmental readings. Allowed in every state.
    pub fn update_environment(&mut self, patch: EnvironmentPatch) {
        self.environment.apply(patch);
    }

    /// Intro script of the current mission.
    #[must_use]
    pub fn intro_script(&self) -> Option<NarrativeScript<'_>> {
        self.current_mission().map(NarrativeScript::intro)
    }

    /// Resolution script for a mission, using the choice it was resolved with.
    #[must_use]
    pub fn resolution_script(&self, mission_id: &str) -> Option<NarrativeScript<'_>> {
        let mission = self.catalogs.missions.get(mission_id)?;
        let progress = self.missions.progress(mission_id)?;
        if !progress.completed {
            return None;
        }
        let choice = progress
            .chosen
            .as_deref()
            .and_then(|choice_id| mission.choice(choice_id));
        Some(NarrativeScript::resolution(mission, choice))
    }

    /// Full read-only projection for rendering.
    #[must_use]
    pub fn snapshot(&self) -> GameSessionView {
        let resources = self.ledger.values();
        GameSessionView {
            resources,
            mood: GuideMood::from_health(resources.guide_health),
            game_over: self.game_over,
            province: self.catalogs.provinces.get(&self.province_id).cloned(),
            speed_multiplier: self.clock.multiplier(),
            clock_running: self.clock.is_running(),
            simulated_months: self.clock.simulated_months(),
            plots: self
                .plots
                .iter()
                .filter_map(|plot| self.plot_snapshot(&plot.id))
                .collect(),
            current_mission: self.mission_view(),
            completed_missions: self
                .missions
                .completed_ids()
                .map(str::to_string)
                .collect(),
            environment: self.environment.clone(),
        }
    }

    // Internals -----------------------------------------------------------

    fn ensure_active(&self) -> Result<(), ActionError> {
        if self.game_over {
            Err(Rejection::GameOver.into())
        } else {
            Ok(())
        }
    }

    fn current_mission_in<'a>(
        &self,
        catalogs: &'a CatalogBundle,
    ) -> Result<&'a Mission, Rejection> {
        self.missions
            .current_id()
            .and_then(|id| catalogs.missions.get(id))
            .ok_or(Rejection::NoDialoguePending)
    }

    /// Queue observation events for a ledger mutation and latch game over.
    fn record_change(&mut self, change: &LedgerChange) {
        if let Some(delta) = change.health_notice {
            self.events.push(EngineEvent::HealthChanged {
                delta,
                health: change.after.guide_health,
            });
        }
        if change.guide_collapsed() && !self.game_over {
            self.game_over = true;
            info!(target: LOG_TARGET, "guide health reached zero; game over");
            self.events.push(EngineEvent::GameOver);
        }
    }

    fn apply_plant(&mut self, plot_id: &str, crop_id: &str) -> Result<PlantOutcome, ActionError> {
        if !self.plots.contains(plot_id) {
            return Err(InvalidReference::UnknownPlot(plot_id.to_string()).into());
        }
        let catalogs = Arc::clone(&self.catalogs);
        let crop = catalogs
            .crops
            .get(crop_id)
            .ok_or_else(|| InvalidReference::UnknownCrop(crop_id.to_string()))?;
        let planted = self
            .plantings
            .plant(plot_id, crop, self.config.month_ms)?
            .clone();
        info!(target: LOG_TARGET, "planted {crop_id} on {plot_id}");
        if planted.is_ready() {
            self.events.push(EngineEvent::CropReady {
                plot_id: plot_id.to_string(),
                crop_id: crop_id.to_string(),
            });
        }

        let change = match self.config.crop_effect_timing {
            CropEffectTiming::OnPlanting => {
                let change = self.ledger.apply(&crop.effects);
                self.record_change(&change);
                Some(change)
            }
            CropEffectTiming::OnHarvest => None,
        };
        Ok(PlantOutcome {
            planted,
            suitable: crop.suits(&self.province_id),
            reaction: crop.reaction,
            change,
        })
    }

    fn apply_harvest(&mut self, plot_id: &str) -> Result<HarvestOutcome, ActionError> {
        if !self.plots.contains(plot_id) {
            return Err(InvalidReference::UnknownPlot(plot_id.to_string()).into());
        }
        let harvested = self.plantings.take_ready(plot_id)?;
        info!(target: LOG_TARGET, "harvested {} from {plot_id}", harvested.crop_id);

        let change = match self.config.crop_effect_timing {
            CropEffectTiming::OnHarvest => {
                let catalogs = Arc::clone(&self.catalogs);
                catalogs.crops.get(&harvested.crop_id).map(|crop| {
                    let change = self.ledger.apply(&crop.effects);
                    self.record_change(&change);
                    change
                })
            }
            CropEffectTiming::OnPlanting => None,
        };
        Ok(HarvestOutcome {
            plot_id: harvested.plot_id,
            crop_id: harvested.crop_id,
            change,
        })
    }

    fn apply_speed(&mut self, multiplier: u32) -> Result<SpeedChange, ActionError> {
        let tier = self
            .config
            .speed_tiers
            .tier(multiplier)
            .ok_or(InvalidReference::UnknownSpeedTier(multiplier))?;
        if tier.multiplier == self.clock.multiplier() {
            return Ok(SpeedChange {
                multiplier,
                cost_charged: 0,
                change: None,
            });
        }
        let change = if tier.is_gated() {
            if !self.ledger.can_afford(tier.unlock_cost) {
                return Err(Rejection::InsufficientFunds {
                    required: tier.unlock_cost,
                    available: self.ledger.money(),
                }
                .into());
            }
            let change = self.ledger.apply(&ResourceDelta::money(-tier.unlock_cost));
            self.record_change(&change);
            Some(change)
        } else {
            None
        };
        let cost_charged = change.map_or(0, |_| tier.unlock_cost);
        self.clock.set_multiplier(multiplier);
        info!(target: LOG_TARGET, "time speed set to x{multiplier} (cost {cost_charged})");
        self.events.push(EngineEvent::SpeedChanged {
            multiplier,
            cost: cost_charged,
        });
        Ok(SpeedChange {
            multiplier,
            cost_charged,
            change,
        })
    }

    fn apply_choice(
        &mut self,
        mission_id: &str,
        choice_id: &str,
    ) -> Result<MissionOutcome, ActionError> {
        let catalogs = Arc::clone(&self.catalogs);
        let mission = catalogs
            .missions
            .get(mission_id)
            .ok_or_else(|| InvalidReference::UnknownMission(mission_id.to_string()))?;
        let outcome =
            self.missions
                .choose(mission, choice_id, &mut self.ledger, &mut self.plots)?;
        self.events.push(EngineEvent::MissionResolved {
            mission_id: outcome.mission_id.clone(),
            choice_id: outcome.choice_id.clone(),
        });
        self.record_change(&outcome.change);
        Ok(outcome)
    }

    fn plot_snapshot(&self, plot_id: &str) -> Option<PlotSnapshot> {
        let plot = self.plots.get(plot_id)?;
        let planting = self.plantings.get(plot_id).map(|planted| PlantingView {
            crop_id: planted.crop_id.clone(),
            crop_name: self
                .catalogs
                .crops
                .get(&planted.crop_id)
                .map_or_else(|| planted.crop_id.clone(), |crop| crop.name.clone()),
            monthly_cost: planted.monthly_cost,
            growth_months: planted.growth_months(),
            elapsed_months: planted.elapsed_months(),
            remaining_months: planted.remaining_months(),
        });
        Some(PlotSnapshot {
            plot_id: plot.id.clone(),
            name: plot.name.clone(),
            ndvi: plot.ndvi(),
            humidity: plot.humidity(),
            condition: plot.condition(),
            layout: plot.layout,
            phase: self.plantings.phase(plot_id),
            planting,
            recommended: self
                .plots
                .best_plot()
                .is_some_and(|best| best.id == plot.id),
        })
    }

    fn mission_view(&self) -> Option<MissionView> {
        let mission = self.current_mission()?;
        let phase = self.missions.phase(&mission.id);
        let choices = if phase.is_awaiting_choice() {
            mission
                .choices
                .iter()
                .map(|choice| ChoiceView {
                    id: choice.id.clone(),
                    label: choice.label.clone(),
                    description: choice.description.clone(),
                    cost: choice.cost,
                    affordable: self.ledger.can_afford(choice.cost),
                })
                .collect()
        } else {
            Vec::new()
        };
        Some(MissionView {
            id: mission.id.clone(),
            title: mission.title.clone(),
            phase,
            completed: self.missions.is_completed(&mission.id),
            current_line: self.missions.current_line(mission).cloned(),
            choices,
        })
    }
}
