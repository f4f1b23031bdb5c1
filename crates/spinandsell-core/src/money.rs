//! Integer minor-unit arithmetic.
//!
//! Every amount in the marketplace is an `i64` count of minor currency units
//! (cents). Percentages are applied in 128-bit integer space and rounded half
//! up to the nearest unit, never through floating point.

/// An amount in minor currency units.
pub type MinorUnits = i64;

/// Returns `amount × percent / 100`, rounded half up to the nearest unit.
#[must_use]
pub fn percent_of(amount: MinorUnits, percent: u32) -> MinorUnits {
    let scaled = i128::from(amount) * i128::from(percent);
    let rounded = (scaled + 50).div_euclid(100);
    i64::try_from(rounded).unwrap_or(if rounded > 0 { i64::MAX } else { i64::MIN })
}

/// Formats minor units as a major-unit decimal string, e.g. `89900` → `"899.00"`.
#[must_use]
pub fn format_minor_units(amount: MinorUnits) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
