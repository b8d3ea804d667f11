//! Time acceleration: speed tiers and the growth/upkeep clock.
use serde::{Deserialize, Serialize};

use crate::numbers::units_to_months;

/// A selectable time multiplier and the one-time cost to switch into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedTier {
    pub multiplier: u32,
    #[serde(default)]
    pub unlock_cost: i64,
}

impl SpeedTier {
    #[must_use]
    pub const fn free(multiplier: u32) -> Self {
        Self {
            multiplier,
            unlock_cost: 0,
        }
    }

    #[must_use]
    pub const fn gated(multiplier: u32, unlock_cost: i64) -> Self {
        Self {
            multiplier,
            unlock_cost,
        }
    }

    #[must_use]
    pub const fn is_gated(&self) -> bool {
        self.unlock_cost > 0
    }
}

/// Ordered list of the multipliers a player may pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeedPolicy {
    tiers: Vec<SpeedTier>,
}

impl Default for SpeedPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                SpeedTier::free(1),
                SpeedTier::free(2),
                SpeedTier::free(3),
                SpeedTier::free(4),
                SpeedTier::gated(5, 4_000),
                SpeedTier::gated(10, 10_000),
            ],
        }
    }
}

impl SpeedPolicy {
    #[must_use]
    pub fn new(tiers: Vec<SpeedTier>) -> Self {
        Self { tiers }
    }

    #[must_use]
    pub fn tier(&self, multiplier: u32) -> Option<SpeedTier> {
        self.tiers
            .iter()
            .copied()
            .find(|tier| tier.multiplier == multiplier)
    }

    #[must_use]
    pub fn tiers(&self) -> &[SpeedTier] {
        &self.tiers
    }
}

/// Output of one clock advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockAdvance {
    /// Clock units of simulated time that elapsed.
    pub units: u64,
    /// Whole simulated months completed during this advance.
    pub months_due: u64,
}

/// Converts real elapsed time into simulated growth and month boundaries.
///
/// The upkeep cadence is tracked separately from growth so upkeep lands once
/// per simulated month no matter how the real time was sliced into ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthClock {
    multiplier: u32,
    month_ms: u64,
    upkeep_progress: u64,
    total_units: u64,
    running: bool,
}

impl GrowthClock {
    #[must_use]
    pub const fn new(month_ms: u64) -> Self {
        Self {
            multiplier: 1,
            month_ms,
            upkeep_progress: 0,
            total_units: 0,
            running: true,
        }
    }

    #[must_use]
    pub const fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Takes effect on the next advance; no backfill.
    pub const fn set_multiplier(&mut self, multiplier: u32) {
        self.multiplier = multiplier;
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    pub const fn stop(&mut self) {
        self.running = false;
    }

    pub const fn resume(&mut self) {
        self.running = true;
    }

    #[must_use]
    pub const fn month_ms(&self) -> u64 {
        self.month_ms
    }

    /// Total simulated months since the session began.
    #[must_use]
    pub fn simulated_months(&self) -> f64 {
        units_to_months(self.total_units, self.month_ms)
    }

    /// Fraction of the current upkeep month already elapsed, in clock units.
    #[must_use]
    pub const fn upkeep_progress(&self) -> u64 {
        self.upkeep_progress
    }

    /// Advance by `real_elapsed_ms` of wall-clock time at the current multiplier.
    pub fn advance(&mut self, real_elapsed_ms: u64) -> ClockAdvance {
        if !self.running || real_elapsed_ms == 0 || self.month_ms == 0 {
            return ClockAdvance::default();
        }
        let units = real_elapsed_ms.saturating_mul(u64::from(self.multiplier));
        self.total_units = self.total_units.saturating_add(units);
        let progress = self.upkeep_progress.saturating_add(units);
        let months_due = progress / self.month_ms;
        self.upkeep_progress = progress % self.month_ms;
        ClockAdvance { units, months_due }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_month_at_1x_is_sixty_seconds() {
        let mut clock = GrowthClock::new(60_000);
        let mut due = 0;
        for _ in 0..59 {
            due += clock.advance(1_000).months_due;
        }
        assert_eq!(due, 0);
        assert_eq!(clock.advance(1_000).months_due, 1);
        assert_eq!(clock.upkeep_progress(), 0);
        assert!((clock.simulated_months() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn multiplier_shortens_the_month() {
        let mut clock = GrowthClock::new(60_000);
        clock.set_multiplier(10);
        let mut due = 0;
        for _ in 0..6 {
            due += clock.advance(1_000).months_due;
        }
        assert_eq!(due, 1);
    }

    #[test]
    fn zero_elapsed_and_stopped_clock_are_inert() {
        let mut clock = GrowthClock::new(60_000);
        let before = clock.clone();
        assert_eq!(clock.advance(0), ClockAdvance::default());
        assert_eq!(clock, before);

        clock.stop();
        assert_eq!(clock.advance(120_000), ClockAdvance::default());
        clock.resume();
        assert_eq!(clock.advance(1_000).units, 1_000);
        assert_eq!(clock.upkeep_progress(), 1_000);
    }

    #[test]
    fn default_policy_gates_fast_tiers() {
        let policy = SpeedPolicy::default();
        assert!(!policy.tier(4).unwrap().is_gated());
        assert_eq!(policy.tier(5).unwrap().unlock_cost, 4_000);
        assert_eq!(policy.tier(10).unwrap().unlock_cost, 10_000);
        assert!(policy.tier(7).is_none());
    }
}
