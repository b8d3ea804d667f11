//! Farm resource meters: money, productivity, biodiversity and guide health.
use serde::{Deserialize, Serialize};

use crate::constants::{
    GUIDE_HEALTHY_ABOVE, GUIDE_WORRIED_ABOVE, METER_MAX, METER_MIN, MONEY_FLOOR,
};

/// Partial change to the resource meters. Absent fields leave the meter untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub money: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub productivity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biodiversity: Option<i32>,
    #[serde(default, rename = "beaHealth", skip_serializing_if = "Option::is_none")]
    pub guide_health: Option<i32>,
}

impl ResourceDelta {
    #[must_use]
    pub const fn money(amount: i64) -> Self {
        Self {
            money: Some(amount),
            productivity: None,
            biodiversity: None,
            guide_health: None,
        }
    }

    #[must_use]
    pub const fn guide_health(amount: i32) -> Self {
        Self {
            money: None,
            productivity: None,
            biodiversity: None,
            guide_health: Some(amount),
        }
    }

    #[must_use]
    pub const fn with_productivity(mut self, amount: i32) -> Self {
        self.productivity = Some(amount);
        self
    }

    #[must_use]
    pub const fn with_biodiversity(mut self, amount: i32) -> Self {
        self.biodiversity = Some(amount);
        self
    }

    #[must_use]
    pub const fn with_money(mut self, amount: i64) -> Self {
        self.money = Some(amount);
        self
    }

    #[must_use]
    pub const fn with_guide_health(mut self, amount: i32) -> Self {
        self.guide_health = Some(amount);
        self
    }

    /// True when no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.money.is_none()
            && self.productivity.is_none()
            && self.biodiversity.is_none()
            && self.guide_health.is_none()
    }
}

/// Current values of the four meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    pub money: i64,
    pub productivity: i32,
    pub biodiversity: i32,
    #[serde(rename = "beaHealth")]
    pub guide_health: i32,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            money: 50_000,
            productivity: 65,
            biodiversity: 45,
            guide_health: 100,
        }
    }
}

impl Resources {
    fn clamped(self) -> Self {
        Self {
            money: self.money.max(MONEY_FLOOR),
            productivity: clamp_meter(self.productivity),
            biodiversity: clamp_meter(self.biodiversity),
            guide_health: clamp_meter(self.guide_health),
        }
    }

    /// Field-by-field difference `self - before`, omitting unchanged meters.
    #[must_use]
    pub fn diff(&self, before: &Self) -> ResourceDelta {
        let nonzero_i64 = |v: i64| (v != 0).then_some(v);
        let nonzero_i32 = |v: i32| (v != 0).then_some(v);
        ResourceDelta {
            money: nonzero_i64(self.money - before.money),
            productivity: nonzero_i32(self.productivity - before.productivity),
            biodiversity: nonzero_i32(self.biodiversity - before.biodiversity),
            guide_health: nonzero_i32(self.guide_health - before.guide_health),
        }
    }
}

fn clamp_meter(value: i32) -> i32 {
    value.clamp(METER_MIN, METER_MAX)
}

/// Result of applying a [`ResourceDelta`] to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerChange {
    pub before: Resources,
    pub after: Resources,
    /// Raw, unclamped guide-health delta that was requested, for transient UI feedback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_notice: Option<i32>,
}

impl LedgerChange {
    /// Deltas that actually landed after clamping.
    #[must_use]
    pub fn applied(&self) -> ResourceDelta {
        self.after.diff(&self.before)
    }

    #[must_use]
    pub const fn guide_collapsed(&self) -> bool {
        self.after.guide_health <= METER_MIN
    }
}

/// Owns the four bounded meters. Every mutation re-clamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    values: Resources,
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new(Resources::default())
    }
}

impl ResourceLedger {
    /// Create a ledger from starting values, clamping anything out of bounds.
    #[must_use]
    pub fn new(initial: Resources) -> Self {
        Self {
            values: initial.clamped(),
        }
    }

    #[must_use]
    pub const fn values(&self) -> Resources {
        self.values
    }

    #[must_use]
    pub const fn money(&self) -> i64 {
        self.values.money
    }

    #[must_use]
    pub const fn guide_health(&self) -> i32 {
        self.values.guide_health
    }

    #[must_use]
    pub const fn can_afford(&self, cost: i64) -> bool {
        self.values.money >= cost
    }

    /// Apply every present field of `delta` in one step.
    ///
    /// Money floors at zero; the other meters clamp to `[0, 100]`. Never fails.
    pub fn apply(&mut self, delta: &ResourceDelta) -> LedgerChange {
        let before = self.values;
        let raw = Resources {
            money: before.money.saturating_add(delta.money.unwrap_or(0)),
            productivity: before
                .productivity
                .saturating_add(delta.productivity.unwrap_or(0)),
            biodiversity: before
                .biodiversity
                .saturating_add(delta.biodiversity.unwrap_or(0)),
            guide_health: before
                .guide_health
                .saturating_add(delta.guide_health.unwrap_or(0)),
        };
        self.values = raw.clamped();
        LedgerChange {
            before,
            after: self.values,
            health_notice: delta.guide_health.filter(|amount| *amount != 0),
        }
    }
}

/// Narrative mood of the guide derived from guide health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideMood {
    Healthy,
    Worried,
    InDanger,
}

impl GuideMood {
    #[must_use]
    pub const fn from_health(health: i32) -> Self {
        if health > GUIDE_HEALTHY_ABOVE {
            Self::Healthy
        } else if health > GUIDE_WORRIED_ABOVE {
            Self::Worried
        } else {
            Self::InDanger
        }
    }
}
