use std::collections::BTreeMap;
use std::sync::Arc;

use agrosat_game::{
    CatalogBundle, CropDefinition, EngineConfig, GameSession, MissionChoice, MissionPhase,
    Resources,
};
use anyhow::{Context, Result};

use crate::logic::policy::{FarmPolicy, FarmingStrategy, PolicyDecision};

/// Wall-clock milliseconds fed to each `tick` unless a plan says otherwise.
/// Simulated months a plan runs for unless it says otherwise.
pub const DEFAULT_SIM_MONTHS: u32 = 24;
/// Hard stop for runs that stop making clock progress.
const MAX_STEPS: usize = 200_000;
/// Invariant failures kept per run; the rest are counted.
const MAX_RECORDED_VIOLATIONS: usize = 16;

/// Catalogs and config shared by every run.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    pub catalogs: Arc<CatalogBundle>,
    pub config: EngineConfig,
}

impl TesterAssets {
    /// Load the bundled data the engine ships with.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled catalogs or config fail validation.
    pub fn load_default() -> Result<Self> {
        let config = EngineConfig::load_from_static();
        config.validate().context("bundled engine config")?;
        let catalogs = CatalogBundle::load_from_static().context("bundled catalogs")?;
        Ok(Self {
            catalogs: Arc::new(catalogs),
            config,
        })
    }
}

/// What to play and what must hold afterwards.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: FarmingStrategy,
    pub max_months: u32,
    /// Wall-clock ms per tick; the engine's host tick interval when unset.
    pub step_ms: Option<u64>,
    pub province: Option<String>,
    pub setup: Option<fn(&mut EngineConfig)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: FarmingStrategy) -> Self {
        Self {
            strategy,
            max_months: DEFAULT_SIM_MONTHS,
            step_ms: None,
            province: None,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_months(mut self, max_months: u32) -> Self {
        self.max_months = max_months;
        self
    }

    #[must_use]
    pub const fn with_step_ms(mut self, step_ms: u64) -> Self {
        self.step_ms = Some(step_ms);
        self
    }

    #[must_use]
    pub fn with_province(mut self, province: impl Into<String>) -> Self {
        self.province = Some(province.into());
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut EngineConfig)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// One mission decision taken by a policy.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRecord {
    pub month: f64,
    pub mission_id: String,
    pub choice_id: String,
    pub policy_name: &'static str,
    pub rationale: Option<String>,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: FarmingStrategy,
    pub province: String,
    pub speed_multiplier: u32,
    pub steps: usize,
    pub months_simulated: f64,
    pub plantings: u32,
    pub harvests: BTreeMap<String, u32>,
    pub upkeep_paid: i64,
    pub decisions: Vec<DecisionRecord>,
    pub missions_completed: Vec<String>,
    pub initial: Resources,
    pub final_resources: Resources,
    pub lowest_guide_health: i32,
    pub game_over: bool,
    /// Engine rejections of actions the runner believed legal.
    pub rejections: Vec<String>,
    /// Invariant breaches observed between steps.
    pub violations: Vec<String>,
    pub events_seen: usize,
}

impl SimulationSummary {
    fn new(seed: u64, plan: &SimulationPlan, session: &GameSession) -> Self {
        let initial = session.resources();
        Self {
            seed,
            strategy: plan.strategy,
            province: session.province_id().to_string(),
            speed_multiplier: session.speed_multiplier(),
            steps: 0,
            months_simulated: 0.0,
            plantings: 0,
            harvests: BTreeMap::new(),
            upkeep_paid: 0,
            decisions: Vec::new(),
            missions_completed: Vec::new(),
            initial,
            final_resources: initial,
            lowest_guide_health: initial.guide_health,
            game_over: session.is_game_over(),
            rejections: Vec::new(),
            violations: Vec::new(),
            events_seen: 0,
        }
    }

    #[must_use]
    pub fn total_harvests(&self) -> u32 {
        self.harvests.values().sum()
    }

    fn violation(&mut self, message: String) {
        if self.violations.len() < MAX_RECORDED_VIOLATIONS {
            self.violations.push(message);
        }
    }
}

/// Headless deterministic runner for the engine.
#[derive(Debug, Clone)]
pub struct GameTester {
    verbose: bool,
    assets: Arc<TesterAssets>,
}

impl GameTester {
    pub const fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self { verbose, assets }
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Play `plan` with a policy seeded from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan's province or setup produce a session the
    /// engine refuses to build.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut config = self.assets.config.clone();
        if let Some(setup) = plan.setup {
            setup(&mut config);
        }
        let province = plan
            .province
            .clone()
            .unwrap_or_else(|| config.starting_province.clone());
        let mut session = GameSession::new(Arc::clone(&self.assets.catalogs), config, &province)
            .with_context(|| format!("building session in {province}"))?;
        let mut policy = plan.strategy.create_policy(seed);
        let mut summary = SimulationSummary::new(seed, plan, &session);
        let step_ms = plan.step_ms.unwrap_or_else(|| session.tick_interval_ms());

        select_speed(&mut session, policy.as_mut(), &mut summary);
        if self.verbose {
            log_initial_state(seed, plan, &session);
        }

        let target = f64::from(plan.max_months);
        while session.simulated_months() < target
            && !session.is_game_over()
            && summary.steps < MAX_STEPS
        {
            self.step(&mut session, policy.as_mut(), step_ms, &mut summary);
            summary.steps += 1;
        }

        summary.months_simulated = session.simulated_months();
        summary.final_resources = session.resources();
        summary.game_over = session.is_game_over();
        summary.missions_completed = session
            .missions()
            .completed_ids()
            .map(str::to_string)
            .collect();
        summary.events_seen += session.drain_events().len();

        if self.verbose {
            log_final_state(&summary);
        }
        Ok(summary)
    }

    fn step(
        &self,
        session: &mut GameSession,
        policy: &mut dyn FarmPolicy,
        step_ms: u64,
        summary: &mut SimulationSummary,
    ) {
        self.drive_mission(session, policy, summary);
        if session.is_game_over() {
            return;
        }
        harvest_ready(session, summary);
        if session.is_game_over() {
            return;
        }
        plant_empty(session, policy, summary);
        if session.is_game_over() {
            return;
        }

        match session.tick(step_ms) {
            Ok(report) => {
                summary.upkeep_paid += report.upkeep_charged;
                if self.verbose && report.months_charged > 0 {
                    println!(
                        "📅 Month {:.0} | upkeep {} | Money:{} Health:{}",
                        session.simulated_months(),
                        report.upkeep_charged,
                        session.resources().money,
                        session.resources().guide_health
                    );
                }
            }
            Err(err) => summary.rejections.push(format!("tick: {err}")),
        }
        summary.events_seen += session.drain_events().len();
        check_invariants(session, summary);
    }

    fn drive_mission(
        &self,
        session: &mut GameSession,
        policy: &mut dyn FarmPolicy,
        summary: &mut SimulationSummary,
    ) {
        let Some(mission_id) = session.missions().current_id().map(str::to_string) else {
            return;
        };
        let result = match session.missions().phase(&mission_id) {
            MissionPhase::NotStarted => session.start_mission(&mission_id).map(|_| ()),
            MissionPhase::IntroPlaying { .. }
            | MissionPhase::Resolved
            | MissionPhase::CompletionPlaying { .. } => session.advance_dialogue().map(|_| ()),
            MissionPhase::AwaitingChoice => {
                let Some(decision) = choose(session, policy, &mission_id) else {
                    return;
                };
                let outcome = session.choose_mission_option(&mission_id, &decision.pick);
                if outcome.is_ok() {
                    if self.verbose {
                        println!(
                            "🎯 {} -> {} ({}, {})",
                            mission_id,
                            decision.pick,
                            policy.name(),
                            decision.rationale.as_deref().unwrap_or("-")
                        );
                    }
                    summary.decisions.push(DecisionRecord {
                        month: session.simulated_months(),
                        mission_id: mission_id.clone(),
                        choice_id: decision.pick,
                        policy_name: policy.name(),
                        rationale: decision.rationale,
                    });
                }
                outcome.map(|_| ())
            }
            MissionPhase::Completed => {
                let next = session
                    .catalogs()
                    .missions
                    .iter()
                    .find(|mission| !session.missions().is_completed(&mission.id))
                    .map(|mission| mission.id.clone());
                match next {
                    Some(next) => session.start_mission(&next).map(|_| ()),
                    None => Ok(()),
                }
            }
        };
        if let Err(err) = result {
            summary.rejections.push(format!("mission {mission_id}: {err}"));
        }
    }
}

fn select_speed(
    session: &mut GameSession,
    policy: &mut dyn FarmPolicy,
    summary: &mut SimulationSummary,
) {
    let wanted = policy.preferred_speed(session);
    let affordable = session
        .config()
        .speed_tiers
        .tier(wanted)
        .is_some_and(|tier| tier.unlock_cost <= session.resources().money);
    if !affordable {
        return;
    }
    match session.set_time_speed(wanted) {
        Ok(change) => summary.speed_multiplier = change.multiplier,
        Err(err) => summary.rejections.push(format!("speed x{wanted}: {err}")),
    }
}

fn choose(
    session: &GameSession,
    policy: &mut dyn FarmPolicy,
    mission_id: &str,
) -> Option<PolicyDecision> {
    let mission = session.catalogs().missions.get(mission_id)?;
    let money = session.resources().money;
    let affordable: Vec<&MissionChoice> = mission
        .choices
        .iter()
        .filter(|choice| choice.cost <= money)
        .collect();
    policy.pick_choice(session, mission, &affordable)
}

fn harvest_ready(session: &mut GameSession, summary: &mut SimulationSummary) {
    let ready: Vec<String> = session
        .plantings()
        .iter()
        .filter(|planted| planted.is_ready())
        .map(|planted| planted.plot_id.clone())
        .collect();
    for plot_id in ready {
        match session.harvest(&plot_id) {
            Ok(outcome) => *summary.harvests.entry(outcome.crop_id).or_default() += 1,
            Err(err) => summary.rejections.push(format!("harvest {plot_id}: {err}")),
        }
    }
}

fn plant_empty(
    session: &mut GameSession,
    policy: &mut dyn FarmPolicy,
    summary: &mut SimulationSummary,
) {
    let empty: Vec<String> = session
        .plots()
        .iter()
        .filter(|plot| session.plantings().get(&plot.id).is_none())
        .map(|plot| plot.id.clone())
        .collect();
    for plot_id in empty {
        let decision = {
            let crops: Vec<&CropDefinition> = session.catalogs().crops.iter().collect();
            policy.pick_crop(session, &crops)
        };
        let Some(decision) = decision else {
            continue;
        };
        match session.plant(&plot_id, &decision.pick) {
            Ok(_) => summary.plantings += 1,
            Err(err) => summary
                .rejections
                .push(format!("plant {} on {plot_id}: {err}", decision.pick)),
        }
        if session.is_game_over() {
            return;
        }
    }
}

fn check_invariants(session: &GameSession, summary: &mut SimulationSummary) {
    let values = session.resources();
    summary.lowest_guide_health = summary.lowest_guide_health.min(values.guide_health);
    let step = summary.steps;

    if values.money < 0 {
        summary.violation(format!("step {step}: money {} below zero", values.money));
    }
    for (name, meter) in [
        ("productivity", values.productivity),
        ("biodiversity", values.biodiversity),
        ("guide health", values.guide_health),
    ] {
        if !(0..=100).contains(&meter) {
            summary.violation(format!("step {step}: {name} {meter} out of range"));
        }
    }
    if values.guide_health <= 0 && !session.is_game_over() {
        summary.violation(format!("step {step}: guide collapsed without game over"));
    }
    for plot in session.plots().iter() {
        if !(0.0..=1.0).contains(&plot.ndvi()) || !(0.0..=100.0).contains(&plot.humidity()) {
            summary.violation(format!(
                "step {step}: {} out of range (ndvi {:.2}, humidity {:.1})",
                plot.id,
                plot.ndvi(),
                plot.humidity()
            ));
        }
    }
}

fn log_initial_state(seed: u64, plan: &SimulationPlan, session: &GameSession) {
    let values = session.resources();
    println!(
        "🎮 Starting simulation | seed:{seed} province:{} policy:{} speed:x{}",
        session.province_id(),
        plan.strategy.label(),
        session.speed_multiplier()
    );
    println!(
        "📊 Initial resources | Money:{} Productivity:{} Biodiversity:{} Health:{}",
        values.money, values.productivity, values.biodiversity, values.guide_health
    );
}

fn log_final_state(summary: &SimulationSummary) {
    let values = summary.final_resources;
    let status = if summary.game_over {
        "game over"
    } else {
        "finished"
    };
    println!(
        "🏁 Simulation {status} (seed {}) in {} at x{} after {:.1} months | Money:{} Health:{} plantings:{} harvests:{} missions:{} events:{}",
        summary.seed,
        summary.province,
        summary.speed_multiplier,
        summary.months_simulated,
        values.money,
        values.guide_health,
        summary.plantings,
        summary.total_harvests(),
        summary.missions_completed.len(),
        summary.events_seen
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> GameTester {
        let assets = Arc::new(TesterAssets::load_default().expect("bundled assets"));
        GameTester::new(assets, false)
    }

    #[test]
    fn zero_month_plan_does_not_tick() {
        let plan = SimulationPlan::new(FarmingStrategy::Balanced).with_max_months(0);
        let summary = tester().run_plan(&plan, 1).unwrap();
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.final_resources, summary.initial);
        assert!(summary.months_simulated.abs() < f64::EPSILON);
    }

    #[test]
    fn cautious_run_completes_every_mission() {
        let plan = SimulationPlan::new(FarmingStrategy::Cautious).with_max_months(6);
        let summary = tester().run_plan(&plan, 42).unwrap();
        assert!(summary.rejections.is_empty(), "{:?}", summary.rejections);
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        assert_eq!(summary.missions_completed.len(), 3);
        assert_eq!(summary.decisions.len(), 3);
        assert!(!summary.game_over);
        assert!(summary.months_simulated >= 6.0);
        assert!(summary.total_harvests() > 0);
    }

    #[test]
    fn runs_are_deterministic_per_seed() {
        let tester = tester();
        let plan = SimulationPlan::new(FarmingStrategy::Random).with_max_months(12);
        let first = tester.run_plan(&plan, 99).unwrap();
        let second = tester.run_plan(&plan, 99).unwrap();
        assert_eq!(first.final_resources, second.final_resources);
        assert_eq!(first.harvests, second.harvests);
        assert_eq!(first.decisions, second.decisions);
        assert_eq!(first.steps, second.steps);
    }

    #[test]
    fn unknown_province_fails_the_run() {
        let plan = SimulationPlan::new(FarmingStrategy::Balanced).with_province("atlantis");
        assert!(tester().run_plan(&plan, 1).is_err());
    }

    #[test]
    fn setup_hook_adjusts_config() {
        fn poor(config: &mut EngineConfig) {
            config.initial_resources.money = 1_500;
        }
        let plan = SimulationPlan::new(FarmingStrategy::Aggressive)
            .with_max_months(0)
            .with_setup(poor);
        let summary = tester().run_plan(&plan, 1).unwrap();
        assert_eq!(summary.initial.money, 1_500);
        // Too poor for any gated tier; the best free tier wins.
        assert_eq!(summary.speed_multiplier, 4);
    }

    #[test]
    fn step_defaults_to_the_engine_tick_interval() {
        fn coarse_ticks(config: &mut EngineConfig) {
            config.tick_interval_ms = 30_000;
        }
        let plan = SimulationPlan::new(FarmingStrategy::Cautious)
            .with_max_months(2)
            .with_setup(coarse_ticks);
        let tester = tester();
        let configured = tester.run_plan(&plan, 5).unwrap();
        let explicit = tester
            .run_plan(&plan.clone().with_step_ms(30_000), 5)
            .unwrap();
        let bundled = tester
            .run_plan(&SimulationPlan::new(FarmingStrategy::Cautious).with_max_months(2), 5)
            .unwrap();
        assert!(configured.steps > 0);
        assert_eq!(configured.steps, explicit.steps);
        assert!(bundled.steps > configured.steps);
    }
}
