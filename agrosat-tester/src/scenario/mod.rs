use agrosat_game::{CatalogBundle, EngineConfig};
use anyhow::{Context, Result};

use crate::logic::{FarmingStrategy, SimulationPlan, SimulationSummary};

/// Named plan the tester can run across seeds.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Keys in the order `all` expands to.
const SCENARIOS: [(&str, &str); 7] = [
    ("smoke", "Smoke Test"),
    ("cautious-farmer", "Cautious Farmer"),
    ("balanced-farmer", "Balanced Farmer"),
    ("aggressive-farmer", "Aggressive Farmer"),
    ("random-walk", "Random Walk"),
    ("upkeep-stress", "Upkeep Stress Test"),
    ("mission-campaign", "Mission Campaign"),
];

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.to_vec()
}

pub fn scenario_keys() -> Vec<String> {
    SCENARIOS.iter().map(|(key, _)| (*key).to_string()).collect()
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let scenario = match name.to_lowercase().as_str() {
        "smoke" => TestScenario::simulation(
            "Smoke Test",
            SimulationPlan::new(FarmingStrategy::Balanced)
                .with_max_months(3)
                .with_expectation(clean_run),
        ),
        "cautious-farmer" | "cautious" => TestScenario::simulation(
            "Cautious Farmer",
            SimulationPlan::new(FarmingStrategy::Cautious)
                .with_expectation(clean_run)
                .with_expectation(guide_never_hurt),
        ),
        "balanced-farmer" | "balanced" => TestScenario::simulation(
            "Balanced Farmer",
            SimulationPlan::new(FarmingStrategy::Balanced)
                .with_expectation(clean_run)
                .with_expectation(harvested_something)
                .with_expectation(every_mission_completed),
        ),
        "aggressive-farmer" | "aggressive" => TestScenario::simulation(
            "Aggressive Farmer",
            SimulationPlan::new(FarmingStrategy::Aggressive)
                .with_expectation(clean_run)
                .with_expectation(harvested_something)
                .with_expectation(money_grew),
        ),
        "random-walk" | "random" => TestScenario::simulation(
            "Random Walk",
            SimulationPlan::new(FarmingStrategy::Random)
                .with_max_months(12)
                .with_step_ms(2_500)
                .with_expectation(clean_run),
        ),
        "upkeep-stress" | "stress" => TestScenario::simulation(
            "Upkeep Stress Test",
            SimulationPlan::new(FarmingStrategy::Aggressive)
                .with_max_months(12)
                .with_setup(shoestring_budget)
                .with_expectation(clean_run)
                .with_expectation(upkeep_was_charged),
        ),
        "mission-campaign" | "missions" => TestScenario::simulation(
            "Mission Campaign",
            SimulationPlan::new(FarmingStrategy::Cautious)
                .with_max_months(6)
                .with_province("corrientes")
                .with_expectation(clean_run)
                .with_expectation(every_mission_completed),
        ),
        _ => return None,
    };
    Some(scenario)
}

fn shoestring_budget(config: &mut EngineConfig) {
    config.initial_resources.money = 1_500;
}

fn clean_run(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.rejections.is_empty(),
        "engine rejected legal actions: {}",
        summary.rejections.join("; ")
    );
    anyhow::ensure!(
        summary.violations.is_empty(),
        "invariants broken: {}",
        summary.violations.join("; ")
    );
    anyhow::ensure!(
        summary.game_over || summary.months_simulated > 0.0 || summary.steps == 0,
        "clock never advanced"
    );
    Ok(())
}

fn guide_never_hurt(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(!summary.game_over, "guide collapsed");
    anyhow::ensure!(
        summary.lowest_guide_health >= summary.initial.guide_health,
        "guide health fell to {}",
        summary.lowest_guide_health
    );
    Ok(())
}

fn harvested_something(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.total_harvests() > 0,
        "no harvest in {:.1} months",
        summary.months_simulated
    );
    Ok(())
}

fn money_grew(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.final_resources.money > summary.initial.money,
        "money went from {} to {}",
        summary.initial.money,
        summary.final_resources.money
    );
    Ok(())
}

fn upkeep_was_charged(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(summary.upkeep_paid > 0, "no upkeep charged");
    Ok(())
}

fn every_mission_completed(summary: &SimulationSummary) -> Result<()> {
    let catalogs = CatalogBundle::load_from_static().context("bundled catalogs")?;
    let missing: Vec<&str> = catalogs
        .missions
        .iter()
        .map(|mission| mission.id.as_str())
        .filter(|id| !summary.missions_completed.iter().any(|done| done == id))
        .collect();
    anyhow::ensure!(
        missing.is_empty(),
        "missions left unfinished: {}",
        missing.join(", ")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, label) in list_scenarios() {
            let scenario = get_scenario(key).unwrap();
            assert_eq!(scenario.name, label);
            assert!(!scenario.plan.expectations.is_empty());
        }
        assert_eq!(scenario_keys().len(), list_scenarios().len());
    }

    #[test]
    fn aliases_and_case_are_accepted() {
        assert_eq!(get_scenario("STRESS").unwrap().name, "Upkeep Stress Test");
        assert_eq!(get_scenario("missions").unwrap().name, "Mission Campaign");
        assert!(get_scenario("vehicle-system").is_none());
    }

    #[test]
    fn shoestring_budget_only_touches_money() {
        let mut config = EngineConfig::default_config();
        shoestring_budget(&mut config);
        assert_eq!(config.initial_resources.money, 1_500);
        assert_eq!(config.initial_resources.guide_health, 100);
    }
}
