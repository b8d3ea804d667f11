//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert a simulated month count to whole clock units.
///
/// A clock unit is one wall-clock millisecond at 1x speed, so a month spans
/// `month_ms` units. Non-finite or non-positive inputs map to zero.
#[must_use]
pub fn months_to_units(months: f64, month_ms: u64) -> u64 {
    if !months.is_finite() || months <= 0.0 {
        return 0;
    }
    let scaled = (months * u64_to_f64(month_ms)).round();
    cast::<f64, u64>(scaled).unwrap_or(u64::MAX)
}

/// Convert clock units back to fractional simulated months.
#[must_use]
pub fn units_to_months(units: u64, month_ms: u64) -> f64 {
    if month_ms == 0 {
        return 0.0;
    }
    u64_to_f64(units) / u64_to_f64(month_ms)
}

/// Clamp a f64 into `[min, max]`, mapping NaN to `min`.
#[must_use]
pub fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_round_trip_through_units() {
        assert_eq!(months_to_units(3.5, 60_000), 210_000);
        assert_eq!(months_to_units(1.0, 60_000), 60_000);
        assert!((units_to_months(210_000, 60_000) - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn months_to_units_rejects_garbage() {
        assert_eq!(months_to_units(f64::NAN, 60_000), 0);
        assert_eq!(months_to_units(-2.0, 60_000), 0);
        assert_eq!(months_to_units(f64::INFINITY, 60_000), 0);
        assert!(units_to_months(10, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn clamp_handles_nan() {
        assert!(clamp_f64(f64::NAN, 0.0, 1.0).abs() < f64::EPSILON);
        assert!((clamp_f64(1.4, 0.0, 1.0) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_f64(-3.0, 0.0, 100.0)).abs() < f64::EPSILON);
    }
}
