use std::fmt;

use agrosat_game::{CropDefinition, GameSession, Mission, MissionChoice, ResourceDelta};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Decision returned by a [`FarmPolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub pick: String,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(pick: impl Into<String>, rationale: Option<String>) -> Self {
        Self {
            pick: pick.into(),
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
///
/// Policies only see legal options; the runner filters out occupied plots and
/// unaffordable choices before asking.
pub trait FarmPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Multiplier to run the clock at, given the tiers the session offers.
    fn preferred_speed(&mut self, session: &GameSession) -> u32;

    /// Select a crop for an empty plot, or `None` to leave it fallow.
    fn pick_crop(
        &mut self,
        session: &GameSession,
        crops: &[&CropDefinition],
    ) -> Option<PolicyDecision>;

    /// Select one of the affordable choices of a mission at its decision point.
    fn pick_choice(
        &mut self,
        session: &GameSession,
        mission: &Mission,
        choices: &[&MissionChoice],
    ) -> Option<PolicyDecision>;
}

/// Built-in farming strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FarmingStrategy {
    Cautious,
    Balanced,
    Aggressive,
    Random,
}

impl FarmingStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Balanced => "Balanced",
            Self::Aggressive => "Aggressive",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn FarmPolicy + Send> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Aggressive => Box::new(AggressivePolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for FarmingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct BalancedPolicy;
struct AggressivePolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl FarmPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn preferred_speed(&mut self, _session: &GameSession) -> u32 {
        1
    }

    fn pick_crop(
        &mut self,
        session: &GameSession,
        crops: &[&CropDefinition],
    ) -> Option<PolicyDecision> {
        let money = session.resources().money;
        let committed = session.plantings().upkeep_total();
        crops
            .iter()
            .filter(|crop| crop.suits(session.province_id()))
            .filter(|crop| delta_health(&crop.effects) >= 0)
            // Keep a year of upkeep in reserve for everything planted.
            .filter(|crop| money >= (committed + crop.monthly_cost) * 12)
            .min_by_key(|crop| crop.monthly_cost)
            .map(|crop| {
                PolicyDecision::new(&crop.id, Some(format!("upkeep {}", crop.monthly_cost)))
            })
    }

    fn pick_choice(
        &mut self,
        _session: &GameSession,
        _mission: &Mission,
        choices: &[&MissionChoice],
    ) -> Option<PolicyDecision> {
        choices
            .iter()
            .max_by_key(|choice| (delta_health(&choice.effects.resources), -choice.cost))
            .map(|choice| {
                let health = delta_health(&choice.effects.resources);
                PolicyDecision::new(&choice.id, Some(format!("health {health:+}")))
            })
    }
}

impl FarmPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn preferred_speed(&mut self, _session: &GameSession) -> u32 {
        2
    }

    fn pick_crop(
        &mut self,
        session: &GameSession,
        crops: &[&CropDefinition],
    ) -> Option<PolicyDecision> {
        let money = session.resources().money;
        let committed = session.plantings().upkeep_total();
        crops
            .iter()
            .filter(|crop| crop.suits(session.province_id()))
            .filter(|crop| money >= (committed + crop.monthly_cost) * 6)
            .map(|crop| {
                let score = crop_score(crop) - VARIETY_PENALTY * planted_count(session, crop);
                (crop, score)
            })
            .max_by_key(|(_, score)| *score)
            .map(|(crop, score)| PolicyDecision::new(&crop.id, Some(format!("score {score}"))))
    }

    fn pick_choice(
        &mut self,
        _session: &GameSession,
        _mission: &Mission,
        choices: &[&MissionChoice],
    ) -> Option<PolicyDecision> {
        choices
            .iter()
            .map(|choice| (choice, balanced_score(&choice.effects.resources)))
            .max_by_key(|(_, score)| *score)
            .map(|(choice, score)| {
                PolicyDecision::new(&choice.id, Some(format!("score {score}")))
            })
    }
}

impl FarmPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn preferred_speed(&mut self, session: &GameSession) -> u32 {
        let money = session.resources().money;
        session
            .config()
            .speed_tiers
            .tiers()
            .iter()
            .filter(|tier| tier.unlock_cost <= money / 2)
            .map(|tier| tier.multiplier)
            .max()
            .unwrap_or(1)
    }

    fn pick_crop(
        &mut self,
        session: &GameSession,
        crops: &[&CropDefinition],
    ) -> Option<PolicyDecision> {
        let values = session.resources();
        crops
            .iter()
            .filter(|crop| values.money >= crop.monthly_cost)
            // Harmful crops only while the guide can absorb a full field of them.
            .filter(|crop| delta_health(&crop.effects) >= 0 || values.guide_health > 50)
            .map(|crop| (crop, monthly_yield(crop)))
            .max_by_key(|(_, per_month)| *per_month)
            .map(|(crop, per_month)| {
                PolicyDecision::new(&crop.id, Some(format!("yield {per_month}/month")))
            })
    }

    fn pick_choice(
        &mut self,
        _session: &GameSession,
        _mission: &Mission,
        choices: &[&MissionChoice],
    ) -> Option<PolicyDecision> {
        choices
            .iter()
            .max_by_key(|choice| choice.effects.resources.money.unwrap_or(0))
            .map(|choice| {
                let money = choice.effects.resources.money.unwrap_or(0);
                PolicyDecision::new(&choice.id, Some(format!("money {money:+}")))
            })
    }
}

impl FarmPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn preferred_speed(&mut self, session: &GameSession) -> u32 {
        let tiers = session.config().speed_tiers.tiers();
        if tiers.is_empty() {
            return 1;
        }
        tiers[self.rng.gen_range(0..tiers.len())].multiplier
    }

    fn pick_crop(
        &mut self,
        _session: &GameSession,
        crops: &[&CropDefinition],
    ) -> Option<PolicyDecision> {
        // Leave plots fallow now and then.
        if crops.is_empty() || self.rng.gen_bool(0.25) {
            return None;
        }
        let crop = crops[self.rng.gen_range(0..crops.len())];
        Some(PolicyDecision::new(&crop.id, None))
    }

    fn pick_choice(
        &mut self,
        _session: &GameSession,
        _mission: &Mission,
        choices: &[&MissionChoice],
    ) -> Option<PolicyDecision> {
        if choices.is_empty() {
            return None;
        }
        let choice = choices[self.rng.gen_range(0..choices.len())];
        Some(PolicyDecision::new(&choice.id, None))
    }
}

fn delta_health(delta: &ResourceDelta) -> i32 {
    delta.guide_health.unwrap_or(0)
}

fn balanced_score(delta: &ResourceDelta) -> i64 {
    delta.money.unwrap_or(0) / 1_000
        + i64::from(delta.productivity.unwrap_or(0))
        + i64::from(delta.biodiversity.unwrap_or(0))
        + i64::from(delta_health(delta)) * 2
}

/// Net money per simulated month over a full growth cycle.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn monthly_yield(crop: &CropDefinition) -> i64 {
    let months = crop.growth_months.max(1.0);
    let net = crop.effects.money.unwrap_or(0) as f64 - crop.monthly_cost as f64 * months;
    (net / months).round() as i64
}

fn crop_score(crop: &CropDefinition) -> i64 {
    monthly_yield(crop) / 50
        + balanced_score(&ResourceDelta {
            money: None,
            ..crop.effects
        })
}

/// Score lost per plot already growing the same crop.
const VARIETY_PENALTY: i64 = 20;

fn planted_count(session: &GameSession, crop: &CropDefinition) -> i64 {
    let count = session
        .plantings()
        .iter()
        .filter(|planted| planted.crop_id == crop.id)
        .count();
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        GameSession::create().expect("bundled session")
    }

    fn catalog_crops(session: &GameSession) -> Vec<&CropDefinition> {
        session.catalogs().crops.iter().collect()
    }

    #[test]
    fn cautious_prefers_healthy_cheap_crops() {
        let session = session();
        let crops = catalog_crops(&session);
        let decision = CautiousPolicy.pick_crop(&session, &crops).unwrap();
        assert_eq!(decision.pick, "soy");
    }

    #[test]
    fn aggressive_maximizes_money_per_month() {
        let session = session();
        let crops = catalog_crops(&session);
        let decision = AggressivePolicy.pick_crop(&session, &crops).unwrap();
        assert_eq!(decision.pick, "dragonfruit");
        assert_eq!(decision.rationale.as_deref(), Some("yield 5400/month"));
        assert_eq!(AggressivePolicy.preferred_speed(&session), 10);

        let healthy: Vec<&CropDefinition> = crops
            .into_iter()
            .filter(|crop| crop.effects.guide_health.unwrap_or(0) >= 0)
            .collect();
        let decision = AggressivePolicy.pick_crop(&session, &healthy).unwrap();
        assert_eq!(decision.pick, "soy");
    }

    #[test]
    fn balanced_spreads_crops_across_plots() {
        let mut session = session();
        let mut picks = Vec::new();
        for plot in ["plot-1", "plot-2", "plot-3"] {
            let pick = {
                let crops = catalog_crops(&session);
                BalancedPolicy.pick_crop(&session, &crops).unwrap().pick
            };
            session.plant(plot, &pick).unwrap();
            picks.push(pick);
        }
        assert_eq!(picks, vec!["soy", "soy", "sugarcane"]);
    }

    #[test]
    fn mission_choices_follow_strategy() {
        let session = session();
        let mission = session.catalogs().missions.get("mission-1").unwrap();
        let choices: Vec<&MissionChoice> = mission.choices.iter().collect();

        let pick = |policy: &mut dyn FarmPolicy| {
            policy
                .pick_choice(&session, mission, &choices)
                .map(|decision| decision.pick)
        };
        assert_eq!(
            pick(&mut CautiousPolicy).as_deref(),
            Some("choice-drip-irrigation")
        );
        assert_eq!(
            pick(&mut BalancedPolicy).as_deref(),
            Some("choice-drip-irrigation")
        );
        assert_eq!(
            pick(&mut AggressivePolicy).as_deref(),
            Some("choice-wait-rain")
        );
    }

    #[test]
    fn random_policy_is_seed_deterministic() {
        let session = session();
        let crops = catalog_crops(&session);
        let picks = |seed| {
            let mut policy = RandomPolicy::new(seed);
            (0..16)
                .map(|_| policy.pick_crop(&session, &crops).map(|d| d.pick))
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(7), picks(7));
    }

    #[test]
    fn empty_options_yield_no_decision() {
        let session = session();
        let mission = session.catalogs().missions.get("mission-1").unwrap();
        assert!(BalancedPolicy.pick_crop(&session, &[]).is_none());
        assert!(
            FarmingStrategy::Random
                .create_policy(1)
                .pick_choice(&session, mission, &[])
                .is_none()
        );
    }
}
