use agrosat_game::{
    ActionError, CatalogBundle, CropCatalog, EngineConfig, EngineEvent, GameSession,
    InvalidReference, Mission, MissionCatalog, MissionPhase, PlotPhase, Rejection, Resources,
};
use serde_json::json;
use std::sync::Arc;

const SECOND: u64 = 1_000;

fn session_with(config: EngineConfig, missions: Option<Vec<Mission>>) -> GameSession {
    let mut bundle = CatalogBundle::load_from_static().unwrap();
    if let Some(missions) = missions {
        bundle.missions = MissionCatalog::from_missions(missions);
    }
    bundle.validate().unwrap();
    GameSession::new(Arc::new(bundle), config, "tucuman").unwrap()
}

fn health_mission(id: &str, delta: i32) -> Mission {
    serde_json::from_value(json!({
        "id": id,
        "title": id,
        "choices": [{
            "id": "take",
            "label": "Take it",
            "cost": 0,
            "effects": { "beaHealth": delta }
        }]
    }))
    .unwrap()
}

#[test]
fn cost_gate_and_money_effect_apply_once() {
    let mut session = GameSession::create().unwrap();
    assert_eq!(session.resources().money, 50_000);
    session.skip_intro().unwrap();

    let outcome = session
        .choose_mission_option("mission-1", "choice-drip-irrigation")
        .unwrap();
    assert_eq!(outcome.change.before.money, 50_000);
    assert_eq!(outcome.change.after.money, 42_000);
    assert_eq!(session.resources().money, 42_000);

    let plot = session.select_plot("plot-1").unwrap();
    assert!((plot.ndvi - 0.60).abs() < 1e-9);
    assert!((plot.humidity - 50.0).abs() < 1e-9);
}

#[test]
fn soy_is_ready_after_three_and_a_half_months() {
    let mut session = GameSession::create().unwrap();
    session.plant("plot-1", "soy").unwrap();

    for _ in 0..209 {
        session.tick(SECOND).unwrap();
    }
    let planted = session.plantings().get("plot-1").unwrap();
    assert!(planted.remaining_months() > 0.0);
    assert_eq!(session.plantings().phase("plot-1"), PlotPhase::Growing);
    assert!(matches!(
        session.harvest("plot-1"),
        Err(ActionError::Rejected(Rejection::PlotNotReady { .. }))
    ));

    let report = session.tick(SECOND).unwrap();
    assert_eq!(report.ready.as_slice(), ["plot-1".to_string()]);
    let planted = session.plantings().get("plot-1").unwrap();
    assert_eq!(planted.remaining_units(), 0);
    assert!(planted.remaining_months().abs() < f64::EPSILON);
    assert_eq!(session.plantings().phase("plot-1"), PlotPhase::ReadyToHarvest);

    let harvest = session.harvest("plot-1").unwrap();
    assert_eq!(harvest.crop_id, "soy");
    assert_eq!(session.plantings().phase("plot-1"), PlotPhase::Empty);
}

#[test]
fn crop_shorter_than_a_clock_unit_is_announced_ready_on_planting() {
    let mut bundle = CatalogBundle::load_from_static().unwrap();
    let mut crops: Vec<_> = bundle.crops.iter().cloned().collect();
    if let Some(soy) = crops.iter_mut().find(|crop| crop.id == "soy") {
        soy.growth_months = 0.000_001;
    }
    bundle.crops = CropCatalog::from_crops(crops);
    bundle.validate().unwrap();
    let mut session =
        GameSession::new(Arc::new(bundle), EngineConfig::default_config(), "tucuman").unwrap();
    session.drain_events();

    session.plant("plot-1", "soy").unwrap();
    assert_eq!(session.plantings().phase("plot-1"), PlotPhase::ReadyToHarvest);
    session.tick(SECOND).unwrap();

    let ready = session
        .drain_events()
        .into_iter()
        .filter(|event| {
            matches!(event, EngineEvent::CropReady { plot_id, .. } if plot_id == "plot-1")
        })
        .count();
    assert_eq!(ready, 1);
    assert_eq!(session.harvest("plot-1").unwrap().crop_id, "soy");
}

#[test]
fn upkeep_is_charged_once_per_month() {
    let mut session = GameSession::create().unwrap();
    session.plant("plot-1", "sugarcane").unwrap();
    session.plant("plot-2", "soy").unwrap();
    session.drain_events();

    for _ in 0..59 {
        session.tick(SECOND).unwrap();
    }
    assert_eq!(session.resources().money, 50_000);

    let report = session.tick(SECOND).unwrap();
    assert_eq!(report.upkeep_charged, 800);
    assert_eq!(report.months_charged, 1);
    assert_eq!(session.resources().money, 49_200);
    assert_eq!(
        session.drain_events(),
        vec![EngineEvent::UpkeepCharged {
            months: 1,
            amount: 800,
            money: 49_200
        }]
    );

    // Nothing more until the next month boundary.
    for _ in 0..59 {
        session.tick(SECOND).unwrap();
    }
    assert_eq!(session.resources().money, 49_200);
}

#[test]
fn upkeep_follows_the_multiplier() {
    let mut session = GameSession::create().unwrap();
    session.plant("plot-1", "sugarcane").unwrap();
    session.set_time_speed(4).unwrap();
    for _ in 0..15 {
        session.tick(SECOND).unwrap();
    }
    assert_eq!(session.resources().money, 49_500);
}

#[test]
fn unaffordable_speed_tier_is_rejected() {
    let config = EngineConfig {
        initial_resources: Resources {
            money: 3_000,
            ..Resources::default()
        },
        ..EngineConfig::default_config()
    };
    let mut session = session_with(config, None);
    session.set_time_speed(2).unwrap();

    let err = session.set_time_speed(10).unwrap_err();
    assert_eq!(
        err,
        ActionError::Rejected(Rejection::InsufficientFunds {
            required: 10_000,
            available: 3_000
        })
    );
    assert_eq!(session.resources().money, 3_000);
    assert_eq!(session.speed_multiplier(), 2);
}

#[test]
fn guide_health_declines_then_collapses() {
    let config = EngineConfig {
        first_mission: None,
        ..EngineConfig::default_config()
    };
    let missions = vec![
        health_mission("h1", -15),
        health_mission("h2", -15),
        health_mission("h3", -15),
        health_mission("h4", -60),
    ];
    let mut session = session_with(config, Some(missions));

    let mut health = vec![session.resources().guide_health];
    for id in ["h1", "h2", "h3"] {
        if session.missions().current_id() != Some(id) {
            session.start_mission(id).unwrap();
        }
        assert_eq!(session.missions().phase(id), MissionPhase::AwaitingChoice);
        session.choose_mission_option(id, "take").unwrap();
        health.push(session.resources().guide_health);
        assert!(!session.is_game_over());
    }
    assert_eq!(health, vec![100, 85, 70, 55]);

    session.start_mission("h4").unwrap();
    let outcome = session.choose_mission_option("h4", "take").unwrap();
    assert_eq!(outcome.change.after.guide_health, 0);
    assert_eq!(outcome.change.health_notice, Some(-60));
    assert!(session.is_game_over());
    assert!(session.snapshot().game_over);
    assert!(session.drain_events().contains(&EngineEvent::GameOver));
}

#[test]
fn unknown_choice_is_reported_as_invalid_reference() {
    let mut session = GameSession::create().unwrap();
    session.skip_intro().unwrap();
    let err = session
        .choose_mission_option("mission-1", "choice-teleport")
        .unwrap_err();
    assert_eq!(
        err,
        ActionError::Invalid(InvalidReference::UnknownChoice {
            mission_id: "mission-1".into(),
            choice_id: "choice-teleport".into()
        })
    );
    assert!(matches!(
        session.start_mission("mission-9"),
        Err(ActionError::Invalid(InvalidReference::UnknownMission(_)))
    ));
}
