//! Farm plots and their satellite readings (NDVI, soil humidity).
use serde::{Deserialize, Serialize};

use crate::constants::{
    HUMIDITY_MAX, HUMIDITY_MIN, NDVI_EXCELLENT_ABOVE, NDVI_GOOD_ABOVE, NDVI_MAX, NDVI_MIN,
};
use crate::numbers::clamp_f64;

/// Screen placement of a plot on the farm map, in percent of the map box.
/// Carried through for the host; the simulation never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PlotLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A unit of farmland with its own vegetation and moisture state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub id: String,
    pub name: String,
    ndvi: f64,
    humidity: f64,
    #[serde(default)]
    pub layout: PlotLayout,
}

impl Plot {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, ndvi: f64, humidity: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ndvi: clamp_f64(ndvi, NDVI_MIN, NDVI_MAX),
            humidity: clamp_f64(humidity, HUMIDITY_MIN, HUMIDITY_MAX),
            layout: PlotLayout::default(),
        }
    }

    #[must_use]
    pub const fn with_layout(mut self, layout: PlotLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub const fn ndvi(&self) -> f64 {
        self.ndvi
    }

    #[must_use]
    pub const fn humidity(&self) -> f64 {
        self.humidity
    }

    #[must_use]
    pub fn condition(&self) -> PlotCondition {
        PlotCondition::from_ndvi(self.ndvi)
    }

    fn clamp_readings(&mut self) {
        self.ndvi = clamp_f64(self.ndvi, NDVI_MIN, NDVI_MAX);
        self.humidity = clamp_f64(self.humidity, HUMIDITY_MIN, HUMIDITY_MAX);
    }
}

/// Qualitative reading of a plot's NDVI used by the guide's recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotCondition {
    Excellent,
    Good,
    NeedsAttention,
}

impl PlotCondition {
    #[must_use]
    pub fn from_ndvi(ndvi: f64) -> Self {
        if ndvi > NDVI_EXCELLENT_ABOVE {
            Self::Excellent
        } else if ndvi > NDVI_GOOD_ABOVE {
            Self::Good
        } else {
            Self::NeedsAttention
        }
    }
}

/// Which plot reading an effect targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotMetric {
    Ndvi,
    Humidity,
}

/// A change to one plot's reading, as carried by mission choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotDelta {
    pub plot_id: String,
    pub change: f64,
}

/// Before/after record of a plot reading mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotChange {
    pub plot_id: String,
    pub metric: PlotMetric,
    pub before: f64,
    pub after: f64,
}

/// The fixed set of plots for a session. Plots are mutated in place and
/// never added or removed during play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlotRegistry {
    plots: Vec<Plot>,
}

impl PlotRegistry {
    #[must_use]
    pub fn new(plots: Vec<Plot>) -> Self {
        let mut registry = Self { plots };
        for plot in &mut registry.plots {
            plot.clamp_readings();
        }
        registry
    }

    #[must_use]
    pub fn get(&self, plot_id: &str) -> Option<&Plot> {
        self.plots.iter().find(|plot| plot.id == plot_id)
    }

    #[must_use]
    pub fn contains(&self, plot_id: &str) -> bool {
        self.get(plot_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plot> {
        self.plots.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    /// Plot with the highest NDVI; the earliest plot wins ties.
    #[must_use]
    pub fn best_plot(&self) -> Option<&Plot> {
        self.plots.iter().fold(None, |best: Option<&Plot>, plot| match best {
            Some(current) if current.ndvi >= plot.ndvi => Some(current),
            _ => Some(plot),
        })
    }

    /// Shift one reading of a plot and clamp it. Returns `None` for unknown plots.
    pub fn adjust(&mut self, metric: PlotMetric, delta: &PlotDelta) -> Option<PlotChange> {
        let plot = self.plots.iter_mut().find(|plot| plot.id == delta.plot_id)?;
        let before = match metric {
            PlotMetric::Ndvi => plot.ndvi,
            PlotMetric::Humidity => plot.humidity,
        };
        match metric {
            PlotMetric::Ndvi => plot.ndvi += delta.change,
            PlotMetric::Humidity => plot.humidity += delta.change,
        }
        plot.clamp_readings();
        let after = match metric {
            PlotMetric::Ndvi => plot.ndvi,
            PlotMetric::Humidity => plot.humidity,
        };
        Some(PlotChange {
            plot_id: plot.id.clone(),
            metric,
            before,
            after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PlotRegistry {
        PlotRegistry::new(vec![
            Plot::new("plot-1", "North", 0.45, 35.0),
            Plot::new("plot-2", "South", 0.72, 65.0),
            Plot::new("plot-3", "East", 0.28, 25.0),
        ])
    }

    #[test]
    fn adjust_clamps_ndvi_and_humidity() {
        let mut plots = registry();
        let change = plots
            .adjust(
                PlotMetric::Ndvi,
                &PlotDelta {
                    plot_id: "plot-2".into(),
                    change: 0.5,
                },
            )
            .unwrap();
        assert!((change.before - 0.72).abs() < 1e-9);
        assert!((change.after - 1.0).abs() < f64::EPSILON);

        let change = plots
            .adjust(
                PlotMetric::Humidity,
                &PlotDelta {
                    plot_id: "plot-3".into(),
                    change: -40.0,
                },
            )
            .unwrap();
        assert!(change.after.abs() < f64::EPSILON);
        assert!(plots.get("plot-3").unwrap().humidity().abs() < f64::EPSILON);
    }

    #[test]
    fn adjust_unknown_plot_is_none() {
        let mut plots = registry();
        let before = plots.clone();
        assert!(
            plots
                .adjust(
                    PlotMetric::Ndvi,
                    &PlotDelta {
                        plot_id: "plot-9".into(),
                        change: 0.1,
                    },
                )
                .is_none()
        );
        assert_eq!(plots, before);
    }

    #[test]
    fn best_plot_prefers_highest_ndvi_then_first() {
        let plots = registry();
        assert_eq!(plots.best_plot().unwrap().id, "plot-2");

        let tied = PlotRegistry::new(vec![
            Plot::new("a", "A", 0.6, 10.0),
            Plot::new("b", "B", 0.6, 10.0),
        ]);
        assert_eq!(tied.best_plot().unwrap().id, "a");
        assert!(PlotRegistry::default().best_plot().is_none());
    }

    #[test]
    fn condition_thresholds_are_strict() {
        assert_eq!(PlotCondition::from_ndvi(0.85), PlotCondition::Excellent);
        assert_eq!(PlotCondition::from_ndvi(0.7), PlotCondition::Good);
        assert_eq!(PlotCondition::from_ndvi(0.5), PlotCondition::NeedsAttention);
    }

    #[test]
    fn registry_clamps_deserialized_plots() {
        let plots: Vec<Plot> =
            serde_json::from_str(r#"[{"id": "x", "name": "X", "ndvi": 1.7, "humidity": -3}]"#)
                .unwrap();
        let registry = PlotRegistry::new(plots);
        let plot = registry.get("x").unwrap();
        assert!((plot.ndvi() - 1.0).abs() < f64::EPSILON);
        assert!(plot.humidity().abs() < f64::EPSILON);
    }
}
