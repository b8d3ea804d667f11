//! Centralized bounds and pacing constants for the AgroSat engine.
//!
//! Balance values that designers tune (starting meters, speed tiers, month
//! length) live in `assets/data/engine.json`; the values here are structural
//! limits of the simulation and change only with code review.

// Meter bounds -------------------------------------------------------------
pub const METER_MIN: i32 = 0;
pub const METER_MAX: i32 = 100;
pub const MONEY_FLOOR: i64 = 0;

// Plot bounds --------------------------------------------------------------
pub const NDVI_MIN: f64 = 0.0;
pub const NDVI_MAX: f64 = 1.0;
pub const HUMIDITY_MIN: f64 = 0.0;
pub const HUMIDITY_MAX: f64 = 100.0;

// Plot condition thresholds (strictly greater than) -----------------------
pub const NDVI_EXCELLENT_ABOVE: f64 = 0.7;
pub const NDVI_GOOD_ABOVE: f64 = 0.5;

// Guide mood thresholds (strictly greater than) ---------------------------
pub const GUIDE_HEALTHY_ABOVE: i32 = 70;
pub const GUIDE_WORRIED_ABOVE: i32 = 40;

// Default clock tuning -----------------------------------------------------
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MONTH_MS: u64 = 60_000;

// Narrative pacing ---------------------------------------------------------
pub const INTRO_LEAD_IN_MS: u64 = 1_000;
pub const INTRO_LINE_GAP_MS: u64 = 3_000;
pub const DECISION_PROMPT_DELAY_MS: u64 = 2_000;
pub const FEEDBACK_DELAY_MS: u64 = 1_000;
pub const COMPLETION_LINE_GAP_MS: u64 = 2_000;

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_TARGET: &str = "agrosat::engine";
