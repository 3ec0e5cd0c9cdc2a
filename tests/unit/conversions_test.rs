//! Unit tests for unit conversions and pace formatting.

use irontrack::views::conversions::{
    meters_to_km, meters_to_miles, meters_to_yards, pace_seconds_per_100yd,
    pace_seconds_per_mile, speed_mph, METERS_PER_MILE,
};
use irontrack::views::format_pace;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_distance_conversions() {
    assert!(approx(meters_to_miles(METERS_PER_MILE), 1.0));
    assert!(approx(meters_to_yards(91.44), 100.0));
    assert!(approx(meters_to_km(42_195.0), 42.195));
}

#[test]
fn test_ten_minute_mile() {
    let pace = pace_seconds_per_mile(Some(600), Some(METERS_PER_MILE)).unwrap();
    assert!(approx(pace, 600.0));
    assert_eq!(format_pace(Some(pace)), "10:00");
}

#[test]
fn test_twenty_mph() {
    // 20 miles in one hour
    let speed = speed_mph(Some(20.0 * METERS_PER_MILE), Some(3600)).unwrap();
    assert!(approx(speed, 20.0));
}

#[test]
fn test_swim_pace_per_hundred_yards() {
    // 500 yards in 7:30
    let pace = pace_seconds_per_100yd(Some(450), Some(457.2)).unwrap();
    assert!(approx(pace, 90.0));
    assert_eq!(format_pace(Some(pace)), "1:30");
}

#[test]
fn test_zero_or_missing_denominators_are_absent() {
    assert_eq!(pace_seconds_per_mile(Some(600), None), None);
    assert_eq!(pace_seconds_per_mile(Some(600), Some(0.0)), None);
    assert_eq!(pace_seconds_per_100yd(Some(600), Some(0.0)), None);
    assert_eq!(speed_mph(Some(10_000.0), Some(0)), None);
    assert_eq!(speed_mph(Some(10_000.0), None), None);
    assert_eq!(speed_mph(None, Some(3600)), None);
    assert_eq!(speed_mph(Some(0.0), Some(3600)), None);
}

#[test]
fn test_format_pace_absent() {
    assert_eq!(format_pace(None), "");
    assert_eq!(format_pace(Some(f64::NAN)), "");
    assert_eq!(format_pace(Some(65.9)), "1:05");
}
