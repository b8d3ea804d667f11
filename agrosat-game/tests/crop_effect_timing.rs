use agrosat_game::{
    CatalogBundle, CropEffectTiming, EngineConfig, GameSession, ResourceDelta, Resources,
};
use std::sync::Arc;

fn session(timing: CropEffectTiming) -> GameSession {
    let catalogs = Arc::new(CatalogBundle::load_from_static().unwrap());
    let config = EngineConfig::default_config().with_crop_effect_timing(timing);
    GameSession::new(catalogs, config, "tucuman").unwrap()
}

const SOY_EFFECTS: ResourceDelta = ResourceDelta {
    money: Some(12_000),
    productivity: Some(20),
    biodiversity: Some(-5),
    guide_health: Some(5),
};

#[test]
fn harvest_timing_rewards_completed_cultivation() {
    let mut session = session(CropEffectTiming::OnHarvest);
    let planted = session.plant("plot-1", "soy").unwrap();
    assert!(planted.change.is_none());
    assert_eq!(session.resources(), Resources::default());

    // 3.5 months at x2: 105 s. Upkeep lands for months 1..=3.
    session.set_time_speed(2).unwrap();
    for _ in 0..105 {
        session.tick(1_000).unwrap();
    }
    assert_eq!(session.resources().money, 50_000 - 3 * 300);

    let harvest = session.harvest("plot-1").unwrap();
    let change = harvest.change.unwrap();
    assert_eq!(change.before.money, 49_100);
    assert_eq!(change.after.money, 61_100);
    assert_eq!(change.after.productivity, 85);
    assert_eq!(change.after.biodiversity, 40);
    assert_eq!(change.after.guide_health, 100);
    assert_eq!(change.health_notice, SOY_EFFECTS.guide_health);
}

#[test]
fn planting_timing_applies_effects_immediately() {
    let mut session = session(CropEffectTiming::OnPlanting);
    let planted = session.plant("plot-1", "soy").unwrap();
    let change = planted.change.unwrap();
    assert_eq!(change.after.money, 62_000);
    assert_eq!(change.applied().productivity, SOY_EFFECTS.productivity);

    session.tick(210_000).unwrap();
    let harvest = session.harvest("plot-1").unwrap();
    assert!(harvest.change.is_none());
    // One big tick covers three whole months of upkeep.
    assert_eq!(session.resources().money, 62_000 - 3 * 300);
}

#[test]
fn unfavorable_crop_effects_can_collapse_the_guide() {
    let catalogs = Arc::new(CatalogBundle::load_from_static().unwrap());
    let config = EngineConfig {
        initial_resources: Resources {
            guide_health: 12,
            ..Resources::default()
        },
        ..EngineConfig::default_config().with_crop_effect_timing(CropEffectTiming::OnPlanting)
    };
    let mut session = GameSession::new(catalogs, config, "tucuman").unwrap();
    session.plant("plot-1", "dragonfruit").unwrap();
    assert_eq!(session.resources().guide_health, 0);
    assert!(session.is_game_over());
}
