//! Provinces a farm can be located in.
use serde::{Deserialize, Serialize};

/// Static climate profile of a province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Province {
    pub id: String,
    pub name: String,
    pub capital: String,
    pub climate: String,
    /// Annual rainfall range, as shown to the player (e.g. "900-1200 mm").
    pub rainfall: String,
    #[serde(default)]
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProvinceCatalog {
    pub provinces: Vec<Province>,
}

impl ProvinceCatalog {
    #[must_use]
    pub fn from_provinces(provinces: Vec<Province>) -> Self {
        Self { provinces }
    }

    /// Load provinces from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a province catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn get(&self, province_id: &str) -> Option<&Province> {
        self.provinces
            .iter()
            .find(|province| province.id == province_id)
    }

    #[must_use]
    pub fn contains(&self, province_id: &str) -> bool {
        self.get(province_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Province> {
        self.provinces.iter()
    }
}
