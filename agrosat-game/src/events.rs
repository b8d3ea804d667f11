//! Observation hooks for the host. Events are queued by the session and
//! drained by the host; they never feed back into the simulation.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Raw, unclamped guide-health delta requested by an effect.
    HealthChanged { delta: i32, health: i32 },
    UpkeepCharged { months: u64, amount: i64, money: i64 },
    CropReady { plot_id: String, crop_id: String },
    SpeedChanged { multiplier: u32, cost: i64 },
    MissionResolved { mission_id: String, choice_id: String },
    GameOver,
    Restarted,
}
