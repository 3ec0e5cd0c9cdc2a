//! Unit conversions and pace/speed derivations.
//!
//! Rates are `None` whenever their denominator is absent, zero or negative,
//! so callers never see infinity or NaN.

/// Meters in a statute mile.
pub const METERS_PER_MILE: f64 = 1609.34;
/// Meters in a yard.
pub const METERS_PER_YARD: f64 = 0.9144;
/// Meters in a kilometer.
pub const METERS_PER_KILOMETER: f64 = 1000.0;
/// Seconds in an hour.
pub const SECONDS_PER_HOUR: f64 = 3600.0;
/// Yards in the swim pace unit.
pub const YARDS_PER_PACE_UNIT: f64 = 100.0;

/// Convert meters to miles.
pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

/// Convert meters to yards.
pub fn meters_to_yards(meters: f64) -> f64 {
    meters / METERS_PER_YARD
}

/// Convert meters to kilometers.
pub fn meters_to_km(meters: f64) -> f64 {
    meters / METERS_PER_KILOMETER
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Running pace in seconds per mile.
pub fn pace_seconds_per_mile(duration_seconds: Option<i64>, distance_m: Option<f64>) -> Option<f64> {
    let miles = meters_to_miles(positive(distance_m)?);
    let duration = duration_seconds? as f64;
    finite(duration / miles)
}

/// Cycling speed in miles per hour.
///
/// Absent when the duration is absent or non-positive, and also when there is
/// no positive distance: a ride without distance has no meaningful speed.
pub fn speed_mph(distance_m: Option<f64>, duration_seconds: Option<i64>) -> Option<f64> {
    let hours = positive(duration_seconds.map(|d| d as f64))? / SECONDS_PER_HOUR;
    let miles = meters_to_miles(positive(distance_m)?);
    finite(miles / hours)
}

/// Swimming pace in seconds per 100 yards.
pub fn pace_seconds_per_100yd(
    duration_seconds: Option<i64>,
    distance_m: Option<f64>,
) -> Option<f64> {
    let hundreds = meters_to_yards(positive(distance_m)?) / YARDS_PER_PACE_UNIT;
    let duration = duration_seconds? as f64;
    finite(duration / hundreds)
}

/// Format a pace in seconds as `m:ss`. Absent paces format as an empty string.
pub fn format_pace(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let total = s as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => String::new(),
    }
}
