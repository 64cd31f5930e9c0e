//! Pure financial calculation primitives
//!
//! Stateless functions shared by the verification engine and the
//! discrepancy analyzer.

use crate::claim::ClaimUnit;

/// Percentage growth from `previous` to `current`.
///
/// Returns `None` when `previous` is zero (growth is undefined).
pub fn growth_rate(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some(((current - previous) / previous.abs()) * 100.0)
}

/// A ratio of two line items expressed as a percentage.
///
/// Returns `None` when the denominator is zero.
pub fn margin(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    Some((numerator / denominator) * 100.0)
}

/// Convert a raw dollar value into the named unit.
///
/// Basis points scale down to percentage points; percent, ratio, and
/// share counts pass through unchanged.
pub fn normalize_to_unit(value: f64, unit: ClaimUnit) -> f64 {
    match unit {
        ClaimUnit::UsdBillions => value / 1_000_000_000.0,
        ClaimUnit::UsdMillions => value / 1_000_000.0,
        ClaimUnit::BasisPoints => value / 100.0,
        ClaimUnit::Usd | ClaimUnit::Percent | ClaimUnit::Ratio | ClaimUnit::Shares => value,
    }
}

/// Convert a value in the named unit back to raw dollars.
pub fn denormalize_from_unit(value: f64, unit: ClaimUnit) -> f64 {
    match unit {
        ClaimUnit::UsdBillions => value * 1_000_000_000.0,
        ClaimUnit::UsdMillions => value * 1_000_000.0,
        ClaimUnit::BasisPoints => value * 100.0,
        ClaimUnit::Usd | ClaimUnit::Percent | ClaimUnit::Ratio | ClaimUnit::Shares => value,
    }
}

/// Basis points to percentage points.
pub fn basis_points_to_percent(bps: f64) -> f64 {
    bps / 100.0
}

/// Percentage points to basis points.
pub fn percent_to_basis_points(pct: f64) -> f64 {
    pct * 100.0
}

/// How close a stated value is to the actual value, in `[0.0, 1.0]`.
///
/// `1.0` is a perfect match. When `actual` is zero the score is `1.0`
/// iff `stated` is also zero, otherwise `0.0`.
pub fn accuracy_score(stated: f64, actual: f64) -> f64 {
    if actual == 0.0 {
        return if stated == 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - (stated - actual).abs() / actual.abs()).max(0.0)
}

/// Signed percentage difference of `stated` relative to `actual`.
///
/// Positive means the stated value overshoots. `None` when `actual` is
/// zero.
pub fn percentage_difference(stated: f64, actual: f64) -> Option<f64> {
    if actual == 0.0 {
        return None;
    }
    Some(((stated - actual) / actual.abs()) * 100.0)
}
