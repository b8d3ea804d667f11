//! Active plantings per plot and their growth progress.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::crops::CropDefinition;
use crate::error::Rejection;
use crate::numbers::{months_to_units, units_to_months};

/// Plot ids whose crops finished growing during one advance.
pub type ReadyPlots = SmallVec<[String; 4]>;

/// Lifecycle of a plot with respect to plantings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotPhase {
    Empty,
    Growing,
    ReadyToHarvest,
}

/// A crop growing on a plot.
///
/// Progress is tracked in clock units (wall-clock milliseconds at 1x speed)
/// so that growth completion is an exact integer comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantedCrop {
    pub plot_id: String,
    pub crop_id: String,
    pub monthly_cost: i64,
    growth_target: u64,
    elapsed: u64,
    month_ms: u64,
}

impl PlantedCrop {
    #[must_use]
    pub fn new(plot_id: impl Into<String>, crop: &CropDefinition, month_ms: u64) -> Self {
        Self {
            plot_id: plot_id.into(),
            crop_id: crop.id.clone(),
            monthly_cost: crop.monthly_cost,
            growth_target: months_to_units(crop.growth_months, month_ms),
            elapsed: 0,
            month_ms,
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.elapsed >= self.growth_target
    }

    #[must_use]
    pub const fn phase(&self) -> PlotPhase {
        if self.is_ready() {
            PlotPhase::ReadyToHarvest
        } else {
            PlotPhase::Growing
        }
    }

    #[must_use]
    pub fn elapsed_months(&self) -> f64 {
        units_to_months(self.elapsed, self.month_ms)
    }

    #[must_use]
    pub fn growth_months(&self) -> f64 {
        units_to_months(self.growth_target, self.month_ms)
    }

    /// `max(0, growth duration - elapsed)` in simulated months.
    #[must_use]
    pub fn remaining_months(&self) -> f64 {
        units_to_months(self.remaining_units(), self.month_ms)
    }

    #[must_use]
    pub const fn remaining_units(&self) -> u64 {
        self.growth_target.saturating_sub(self.elapsed)
    }

    /// Advance a growing crop; returns true when this call made it ready.
    fn grow(&mut self, units: u64) -> bool {
        if self.is_ready() || units == 0 {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(units);
        self.is_ready()
    }
}

/// Tracks at most one live planting per plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlantingLedger {
    entries: BTreeMap<String, PlantedCrop>,
}

impl PlantingLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, plot_id: &str) -> Option<&PlantedCrop> {
        self.entries.get(plot_id)
    }

    #[must_use]
    pub fn phase(&self, plot_id: &str) -> PlotPhase {
        self.entries
            .get(plot_id)
            .map_or(PlotPhase::Empty, PlantedCrop::phase)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlantedCrop> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start a crop on an empty plot.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::PlotOccupied`] when the plot is growing or awaiting harvest.
    pub fn plant(
        &mut self,
        plot_id: &str,
        crop: &CropDefinition,
        month_ms: u64,
    ) -> Result<&PlantedCrop, Rejection> {
        if self.entries.contains_key(plot_id) {
            return Err(Rejection::PlotOccupied {
                plot_id: plot_id.to_string(),
            });
        }
        let planted = PlantedCrop::new(plot_id, crop, month_ms);
        Ok(self.entries.entry(plot_id.to_string()).or_insert(planted))
    }

    /// Remove a ready crop from its plot.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::NothingPlanted`] for empty plots and
    /// [`Rejection::PlotNotReady`] while the crop is still growing.
    pub fn take_ready(&mut self, plot_id: &str) -> Result<PlantedCrop, Rejection> {
        match self.entries.get(plot_id) {
            None => Err(Rejection::NothingPlanted {
                plot_id: plot_id.to_string(),
            }),
            Some(planted) if !planted.is_ready() => Err(Rejection::PlotNotReady {
                plot_id: plot_id.to_string(),
                months_remaining: planted.remaining_months(),
            }),
            Some(_) => self
                .entries
                .remove(plot_id)
                .ok_or_else(|| Rejection::NothingPlanted {
                    plot_id: plot_id.to_string(),
                }),
        }
    }

    /// Sum of monthly upkeep over every live planting, growing or ready.
    #[must_use]
    pub fn upkeep_total(&self) -> i64 {
        self.entries
            .values()
            .map(|planted| planted.monthly_cost)
            .sum()
    }

    /// Advance every growing crop by `units`, then report plots that became ready.
    pub fn advance(&mut self, units: u64) -> ReadyPlots {
        let mut ready = ReadyPlots::new();
        for planted in self.entries.values_mut() {
            if planted.grow(units) {
                ready.push(planted.plot_id.clone());
            }
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crops::ReactionTier;
    use crate::resources::ResourceDelta;

    const MONTH: u64 = 60_000;

    fn crop(id: &str, months: f64, cost: i64) -> CropDefinition {
        CropDefinition {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            growth_months: months,
            monthly_cost: cost,
            effects: ResourceDelta::money(1_000),
            suitable_regions: Vec::new(),
            reaction: ReactionTier::Favorable,
        }
    }

    #[test]
    fn plot_cycles_through_phases() {
        let mut ledger = PlantingLedger::new();
        assert_eq!(ledger.phase("plot-1"), PlotPhase::Empty);

        ledger.plant("plot-1", &crop("soy", 1.0, 300), MONTH).unwrap();
        assert_eq!(ledger.phase("plot-1"), PlotPhase::Growing);

        let ready = ledger.advance(MONTH - 1);
        assert!(ready.is_empty());
        assert_eq!(ledger.get("plot-1").unwrap().remaining_units(), 1);

        let ready = ledger.advance(1);
        assert_eq!(ready.as_slice(), ["plot-1".to_string()]);
        assert_eq!(ledger.phase("plot-1"), PlotPhase::ReadyToHarvest);

        // Ready crops stay put and do not report again.
        assert!(ledger.advance(MONTH).is_empty());

        let harvested = ledger.take_ready("plot-1").unwrap();
        assert_eq!(harvested.crop_id, "soy");
        assert_eq!(ledger.phase("plot-1"), PlotPhase::Empty);
    }

    #[test]
    fn occupied_plot_rejects_planting_without_change() {
        let mut ledger = PlantingLedger::new();
        ledger.plant("plot-1", &crop("soy", 2.0, 300), MONTH).unwrap();
        let before = ledger.clone();
        let err = ledger
            .plant("plot-1", &crop("lemon", 36.0, 850), MONTH)
            .unwrap_err();
        assert_eq!(
            err,
            Rejection::PlotOccupied {
                plot_id: "plot-1".into()
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn harvest_requires_ready_crop() {
        let mut ledger = PlantingLedger::new();
        assert!(matches!(
            ledger.take_ready("plot-1"),
            Err(Rejection::NothingPlanted { .. })
        ));
        ledger.plant("plot-1", &crop("soy", 2.0, 300), MONTH).unwrap();
        ledger.advance(MONTH / 2);
        let before = ledger.clone();
        match ledger.take_ready("plot-1") {
            Err(Rejection::PlotNotReady {
                months_remaining, ..
            }) => assert!((months_remaining - 1.5).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ledger, before);
    }

    #[test]
    fn upkeep_counts_growing_and_ready() {
        let mut ledger = PlantingLedger::new();
        ledger.plant("plot-1", &crop("fast", 0.5, 500), MONTH).unwrap();
        ledger.plant("plot-2", &crop("slow", 10.0, 300), MONTH).unwrap();
        ledger.advance(MONTH);
        assert_eq!(ledger.phase("plot-1"), PlotPhase::ReadyToHarvest);
        assert_eq!(ledger.upkeep_total(), 800);
    }

    #[test]
    fn elapsed_growth_is_monotonic() {
        let mut ledger = PlantingLedger::new();
        ledger.plant("plot-1", &crop("soy", 3.5, 300), MONTH).unwrap();
        let mut last = 0.0;
        for step in [0, 1_000, 0, 7_500, 60_000] {
            ledger.advance(step);
            let elapsed = ledger.get("plot-1").unwrap().elapsed_months();
            assert!(elapsed >= last);
            last = elapsed;
        }
    }
}
