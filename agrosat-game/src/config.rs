//! Engine tuning loaded from `engine.json`.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::SpeedPolicy;
use crate::constants::{DEFAULT_MONTH_MS, DEFAULT_TICK_INTERVAL_MS, METER_MAX, METER_MIN};
use crate::resources::Resources;

const DEFAULT_ENGINE_DATA: &str = include_str!("../assets/data/engine.json");

/// When a crop's resource effects land on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CropEffectTiming {
    /// Reward for a completed cultivation.
    #[default]
    #[serde(rename = "harvest")]
    OnHarvest,
    /// Applied as soon as the crop goes into the ground.
    #[serde(rename = "planting")]
    OnPlanting,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("engine config JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("speed tier list is empty")]
    NoSpeedTiers,
    #[error("speed tiers must include a free x1 tier")]
    MissingBaseSpeed,
    #[error("speed tiers must be strictly ascending (x{previous} is followed by x{next})")]
    UnsortedSpeedTiers { previous: u32, next: u32 },
    #[error("speed tier x{multiplier} has a negative unlock cost ({cost})")]
    NegativeUnlockCost { multiplier: u32, cost: i64 },
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("initial {field} must be between {min} and {max} (got {value})")]
    InitialMeterOutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("starting province id is empty")]
    MissingProvince,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub initial_resources: Resources,
    /// Real milliseconds between host ticks.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Real milliseconds per simulated month at x1.
    #[serde(default = "default_month_ms")]
    pub month_ms: u64,
    #[serde(default)]
    pub speed_tiers: SpeedPolicy,
    #[serde(default)]
    pub crop_effect_timing: CropEffectTiming,
    pub starting_province: String,
    /// Mission made current when a session starts; falls back to the first
    /// catalog entry when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_mission: Option<String>,
}

const fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

const fn default_month_ms() -> u64 {
    DEFAULT_MONTH_MS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_resources: Resources::default(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            month_ms: DEFAULT_MONTH_MS,
            speed_tiers: SpeedPolicy::default(),
            crop_effect_timing: CropEffectTiming::OnHarvest,
            starting_province: "tucuman".to_string(),
            first_mission: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate an engine config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the JSON is malformed or a value is out of bounds.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the bundled engine config.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::default_config()
    }

    /// Embedded defaults, or the built-in values if the bundle does not parse.
    #[must_use]
    pub fn default_config() -> Self {
        Self::from_json(DEFAULT_ENGINE_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn with_crop_effect_timing(mut self, timing: CropEffectTiming) -> Self {
        self.crop_effect_timing = timing;
        self
    }

    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.month_ms == 0 {
            return Err(ConfigError::ZeroDuration { field: "month_ms" });
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "tick_interval_ms",
            });
        }
        if self.starting_province.trim().is_empty() {
            return Err(ConfigError::MissingProvince);
        }
        self.validate_speed_tiers()?;
        self.validate_initial_resources()
    }

    fn validate_speed_tiers(&self) -> Result<(), ConfigError> {
        let tiers = self.speed_tiers.tiers();
        if tiers.is_empty() {
            return Err(ConfigError::NoSpeedTiers);
        }
        for pair in tiers.windows(2) {
            if pair[0].multiplier >= pair[1].multiplier {
                return Err(ConfigError::UnsortedSpeedTiers {
                    previous: pair[0].multiplier,
                    next: pair[1].multiplier,
                });
            }
        }
        if let Some(tier) = tiers.iter().find(|tier| tier.unlock_cost < 0) {
            return Err(ConfigError::NegativeUnlockCost {
                multiplier: tier.multiplier,
                cost: tier.unlock_cost,
            });
        }
        match self.speed_tiers.tier(1) {
            Some(base) if !base.is_gated() => Ok(()),
            _ => Err(ConfigError::MissingBaseSpeed),
        }
    }

    fn validate_initial_resources(&self) -> Result<(), ConfigError> {
        let start = self.initial_resources;
        if start.money < 0 {
            return Err(ConfigError::InitialMeterOutOfRange {
                field: "money",
                min: 0,
                max: i64::MAX,
                value: start.money,
            });
        }
        for (field, value) in [
            ("productivity", start.productivity),
            ("biodiversity", start.biodiversity),
            ("beaHealth", start.guide_health),
        ] {
            if !(METER_MIN..=METER_MAX).contains(&value) {
                return Err(ConfigError::InitialMeterOutOfRange {
                    field,
                    min: i64::from(METER_MIN),
                    max: i64::from(METER_MAX),
                    value: i64::from(value),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SpeedTier;

    #[test]
    fn bundled_config_matches_built_in_defaults() {
        let bundled = EngineConfig::from_json(DEFAULT_ENGINE_DATA).unwrap();
        assert_eq!(bundled.initial_resources, Resources::default());
        assert_eq!(bundled.month_ms, 60_000);
        assert_eq!(bundled.tick_interval_ms, 1_000);
        assert_eq!(bundled.speed_tiers, SpeedPolicy::default());
        assert_eq!(bundled.crop_effect_timing, CropEffectTiming::OnHarvest);
        assert_eq!(bundled.starting_province, "tucuman");
        assert_eq!(bundled.first_mission.as_deref(), Some("mission-1"));
    }

    #[test]
    fn timing_parses_from_short_names() {
        let config = EngineConfig::from_json(
            r#"{"startingProvince": "mendoza", "cropEffectTiming": "planting"}"#,
        )
        .unwrap();
        assert_eq!(config.crop_effect_timing, CropEffectTiming::OnPlanting);
        assert_eq!(config.month_ms, DEFAULT_MONTH_MS);
    }

    #[test]
    fn validate_rejects_bad_tiers() {
        let mut config = EngineConfig {
            speed_tiers: SpeedPolicy::new(vec![SpeedTier::free(2), SpeedTier::free(1)]),
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsortedSpeedTiers {
                previous: 2,
                next: 1
            })
        ));

        config.speed_tiers = SpeedPolicy::new(vec![SpeedTier::gated(1, 10)]);
        assert!(matches!(config.validate(), Err(ConfigError::MissingBaseSpeed)));

        config.speed_tiers = SpeedPolicy::new(Vec::new());
        assert!(matches!(config.validate(), Err(ConfigError::NoSpeedTiers)));
    }

    #[test]
    fn validate_rejects_zero_month_and_bad_meters() {
        let config = EngineConfig {
            month_ms: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration { field: "month_ms" })
        ));

        let mut config = EngineConfig::default();
        config.initial_resources.guide_health = 120;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "initial beaHealth must be between 0 and 100 (got 120)"
        );
    }
}
