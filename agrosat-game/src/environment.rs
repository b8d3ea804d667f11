//! Satellite-style environmental readings shown beside the farm.
use serde::{Deserialize, Serialize};

use crate::constants::{HUMIDITY_MAX, HUMIDITY_MIN};
use crate::numbers::clamp_f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Autumn,
    Winter,
}

/// Current readings for the session's province. Informational only; the
/// growth model does not consume them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalData {
    pub temperature_min: f64,
    pub temperature_max: f64,
    /// Millimetres of rain during the last month.
    pub precipitation_last_month: f64,
    pub soil_humidity: f64,
    pub season: Season,
    pub month_label: String,
}

impl Default for EnvironmentalData {
    fn default() -> Self {
        Self {
            temperature_min: 12.0,
            temperature_max: 22.0,
            precipitation_last_month: 50.0,
            soil_humidity: 35.0,
            season: Season::Spring,
            month_label: "September-October".to_string(),
        }
    }
}

/// Partial update merged over [`EnvironmentalData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_last_month: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_label: Option<String>,
}

impl EnvironmentalData {
    /// Merge present fields of `patch`. Soil humidity clamps to `[0, 100]`,
    /// precipitation floors at zero, and the temperature pair is kept ordered.
    pub fn apply(&mut self, patch: EnvironmentPatch) {
        if let Some(value) = patch.temperature_min {
            self.temperature_min = value;
        }
        if let Some(value) = patch.temperature_max {
            self.temperature_max = value;
        }
        if self.temperature_min > self.temperature_max {
            std::mem::swap(&mut self.temperature_min, &mut self.temperature_max);
        }
        if let Some(value) = patch.precipitation_last_month {
            self.precipitation_last_month = clamp_f64(value, 0.0, f64::MAX);
        }
        if let Some(value) = patch.soil_humidity {
            self.soil_humidity = clamp_f64(value, HUMIDITY_MIN, HUMIDITY_MAX);
        }
        if let Some(season) = patch.season {
            self.season = season;
        }
        if let Some(label) = patch.month_label {
            self.month_label = label;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_merges_only_present_fields() {
        let mut env = EnvironmentalData::default();
        env.apply(EnvironmentPatch {
            precipitation_last_month: Some(120.0),
            season: Some(Season::Summer),
            ..EnvironmentPatch::default()
        });
        assert!((env.precipitation_last_month - 120.0).abs() < f64::EPSILON);
        assert_eq!(env.season, Season::Summer);
        assert!((env.soil_humidity - 35.0).abs() < f64::EPSILON);
        assert_eq!(env.month_label, "September-October");
    }

    #[test]
    fn patch_clamps_and_orders_readings() {
        let mut env = EnvironmentalData::default();
        env.apply(EnvironmentPatch {
            temperature_min: Some(30.0),
            soil_humidity: Some(140.0),
            precipitation_last_month: Some(-4.0),
            ..EnvironmentPatch::default()
        });
        assert!((env.temperature_min - 22.0).abs() < f64::EPSILON);
        assert!((env.temperature_max - 30.0).abs() < f64::EPSILON);
        assert!((env.soil_humidity - 100.0).abs() < f64::EPSILON);
        assert!(env.precipitation_last_month.abs() < f64::EPSILON);
    }

    #[test]
    fn patch_parses_from_camel_case() {
        let patch: EnvironmentPatch =
            serde_json::from_str(r#"{"soilHumidity": 48, "monthLabel": "November"}"#).unwrap();
        assert_eq!(patch.soil_humidity, Some(48.0));
        assert_eq!(patch.month_label.as_deref(), Some("November"));
    }
}
