//! Bundled catalogs and their load-time validation.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::constants::{HUMIDITY_MAX, HUMIDITY_MIN, NDVI_MAX, NDVI_MIN};
use crate::crops::CropCatalog;
use crate::missions::MissionCatalog;
use crate::plots::Plot;
use crate::provinces::ProvinceCatalog;

const DEFAULT_CROP_DATA: &str = include_str!("../assets/data/crops.json");
const DEFAULT_MISSION_DATA: &str = include_str!("../assets/data/missions.json");
const DEFAULT_PLOT_DATA: &str = include_str!("../assets/data/plots.json");
const DEFAULT_PROVINCE_DATA: &str = include_str!("../assets/data/provinces.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{catalog} catalog JSON parse error: {source}")]
    Parse {
        catalog: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{catalog} catalog is empty")]
    Empty { catalog: &'static str },
    #[error("duplicate {catalog} id `{id}`")]
    DuplicateId { catalog: &'static str, id: String },
    #[error("crop `{crop_id}` has invalid growth duration {months}")]
    InvalidGrowth { crop_id: String, months: f64 },
    #[error("{kind} `{id}` has negative cost {cost}")]
    NegativeCost {
        kind: &'static str,
        id: String,
        cost: i64,
    },
    #[error("plot `{plot_id}` {field} {value} is outside [{min}, {max}]")]
    PlotOutOfRange {
        plot_id: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("choice `{choice_id}` of mission `{mission_id}` references unknown plot `{plot_id}`")]
    UnknownPlotReference {
        mission_id: String,
        choice_id: String,
        plot_id: String,
    },
    #[error("crop `{crop_id}` lists unknown province `{province_id}`")]
    UnknownRegion {
        crop_id: String,
        province_id: String,
    },
}

/// Starting plot set as stored in `plots.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlotList {
    pub plots: Vec<Plot>,
}

/// Every static catalog a session reads from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogBundle {
    pub crops: CropCatalog,
    pub missions: MissionCatalog,
    pub plots: Vec<Plot>,
    pub provinces: ProvinceCatalog,
}

fn parse<T: serde::de::DeserializeOwned>(
    catalog: &'static str,
    json: &str,
) -> Result<T, CatalogError> {
    serde_json::from_str(json).map_err(|source| CatalogError::Parse { catalog, source })
}

fn ensure_unique<'a>(
    catalog: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                catalog,
                id: id.to_string(),
            });
        }
    }
    if seen.is_empty() {
        return Err(CatalogError::Empty { catalog });
    }
    Ok(())
}

fn ensure_in_range(
    plot: &Plot,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), CatalogError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CatalogError::PlotOutOfRange {
            plot_id: plot.id.clone(),
            field,
            value,
            min,
            max,
        })
    }
}

impl CatalogBundle {
    /// Parse all four catalogs and validate them as a set.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on malformed JSON or on any cross-reference or
    /// range violation.
    pub fn from_json(
        crops: &str,
        missions: &str,
        plots: &str,
        provinces: &str,
    ) -> Result<Self, CatalogError> {
        let plots: PlotList = parse("plot", plots)?;
        let bundle = Self {
            crops: parse("crop", crops)?,
            missions: parse("mission", missions)?,
            plots: plots.plots,
            provinces: parse("province", provinces)?,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Load the catalogs embedded in the crate.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the bundled data fails validation.
    pub fn load_from_static() -> Result<Self, CatalogError> {
        Self::from_json(
            DEFAULT_CROP_DATA,
            DEFAULT_MISSION_DATA,
            DEFAULT_PLOT_DATA,
            DEFAULT_PROVINCE_DATA,
        )
    }

    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        ensure_unique("province", self.provinces.iter().map(|p| p.id.as_str()))?;
        ensure_unique("plot", self.plots.iter().map(|p| p.id.as_str()))?;
        ensure_unique("crop", self.crops.iter().map(|c| c.id.as_str()))?;
        ensure_unique("mission", self.missions.iter().map(|m| m.id.as_str()))?;

        for plot in &self.plots {
            ensure_in_range(plot, "ndvi", plot.ndvi(), NDVI_MIN, NDVI_MAX)?;
            ensure_in_range(plot, "humidity", plot.humidity(), HUMIDITY_MIN, HUMIDITY_MAX)?;
        }
        self.validate_crops()?;
        self.validate_missions()
    }

    fn validate_crops(&self) -> Result<(), CatalogError> {
        for crop in self.crops.iter() {
            if !crop.growth_months.is_finite() || crop.growth_months <= 0.0 {
                return Err(CatalogError::InvalidGrowth {
                    crop_id: crop.id.clone(),
                    months: crop.growth_months,
                });
            }
            if crop.monthly_cost < 0 {
                return Err(CatalogError::NegativeCost {
                    kind: "crop",
                    id: crop.id.clone(),
                    cost: crop.monthly_cost,
                });
            }
            if let Some(region) = crop
                .suitable_regions
                .iter()
                .find(|region| !self.provinces.contains(region))
            {
                return Err(CatalogError::UnknownRegion {
                    crop_id: crop.id.clone(),
                    province_id: region.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_missions(&self) -> Result<(), CatalogError> {
        for mission in self.missions.iter() {
            ensure_unique(
                "choice",
                mission.choices.iter().map(|choice| choice.id.as_str()),
            )
            .or_else(|err| match err {
                CatalogError::Empty { .. } => Ok(()),
                other => Err(other),
            })?;
            for choice in &mission.choices {
                if choice.cost < 0 {
                    return Err(CatalogError::NegativeCost {
                        kind: "choice",
                        id: choice.id.clone(),
                        cost: choice.cost,
                    });
                }
                if let Some(plot_id) = choice
                    .effects
                    .plot_refs()
                    .find(|plot_id| !self.plots.iter().any(|plot| plot.id == *plot_id))
                {
                    return Err(CatalogError::UnknownPlotReference {
                        mission_id: mission.id.clone(),
                        choice_id: choice.id.clone(),
                        plot_id: plot_id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Failure of the bundled [`StaticDataLoader`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Host-provided source of catalogs and engine tuning.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load and validate the static catalogs.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogs cannot be read or fail validation.
    fn load_catalogs(&self) -> Result<CatalogBundle, Self::Error>;

    /// Load engine tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or parsed.
    fn load_engine_config(&self) -> Result<EngineConfig, Self::Error>;
}

/// Loader backed by the JSON compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

impl DataLoader for StaticDataLoader {
    type Error = LoadError;

    fn load_catalogs(&self) -> Result<CatalogBundle, Self::Error> {
        Ok(CatalogBundle::load_from_static()?)
    }

    fn load_engine_config(&self) -> Result<EngineConfig, Self::Error> {
        let config = EngineConfig::load_from_static();
        config.validate()?;
        Ok(config)
    }
}
