//! Crop catalog: growth times, upkeep and harvest effects.
use serde::{Deserialize, Serialize};

use crate::resources::ResourceDelta;

/// How the guide reacts when a crop is chosen. Drives narrative only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReactionTier {
    #[default]
    Favorable,
    Unfavorable,
}

/// Static definition of a plantable crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Simulated months from planting until harvestable.
    pub growth_months: f64,
    /// Money debited once per simulated month while planted.
    pub monthly_cost: i64,
    #[serde(default)]
    pub effects: ResourceDelta,
    /// Province ids where this crop thrives.
    #[serde(default)]
    pub suitable_regions: Vec<String>,
    #[serde(default)]
    pub reaction: ReactionTier,
}

impl CropDefinition {
    #[must_use]
    pub fn suits(&self, province_id: &str) -> bool {
        self.suitable_regions.iter().any(|id| id == province_id)
    }
}

/// Immutable lookup of crop definitions, kept in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CropCatalog {
    pub crops: Vec<CropDefinition>,
}

impl CropCatalog {
    #[must_use]
    pub fn from_crops(crops: Vec<CropDefinition>) -> Self {
        Self { crops }
    }

    /// Load crop definitions from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a crop catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn get(&self, crop_id: &str) -> Option<&CropDefinition> {
        self.crops.iter().find(|crop| crop.id == crop_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropDefinition> {
        self.crops.iter()
    }

    /// Crops that list `province_id` among their suitable regions.
    pub fn suitable_for<'a>(
        &'a self,
        province_id: &'a str,
    ) -> impl Iterator<Item = &'a CropDefinition> + 'a {
        self.crops.iter().filter(move |crop| crop.suits(province_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "crops": [
            {
                "id": "soy",
                "name": "Soy",
                "growthMonths": 3.5,
                "monthlyCost": 300,
                "effects": { "money": 12000, "productivity": 20, "biodiversity": -5, "beaHealth": 5 },
                "suitableRegions": ["tucuman", "mendoza"]
            },
            {
                "id": "pear",
                "name": "Pears",
                "growthMonths": 48,
                "monthlyCost": 700,
                "reaction": "unfavorable",
                "suitableRegions": ["mendoza"]
            }
        ]
    }"#;

    #[test]
    fn catalog_parses_and_filters_by_region() {
        let catalog = CropCatalog::from_json(SAMPLE).unwrap();
        let soy = catalog.get("soy").unwrap();
        assert!((soy.growth_months - 3.5).abs() < f64::EPSILON);
        assert_eq!(soy.effects.guide_health, Some(5));
        assert_eq!(soy.reaction, ReactionTier::Favorable);
        assert_eq!(catalog.get("pear").unwrap().reaction, ReactionTier::Unfavorable);

        let tucuman: Vec<_> = catalog.suitable_for("tucuman").map(|c| c.id.as_str()).collect();
        assert_eq!(tucuman, vec!["soy"]);
        assert_eq!(catalog.suitable_for("mendoza").count(), 2);
        assert!(catalog.get("banana").is_none());
    }
}
