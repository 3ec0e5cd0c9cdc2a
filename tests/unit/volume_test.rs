//! Unit tests for weekly volume aggregation.

use chrono::NaiveDate;
use irontrack::records::Workout;
use irontrack::views::weekly_volume;
use uuid::Uuid;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

#[test]
fn test_sunday_belongs_to_previous_week() {
    let user_id = Uuid::new_v4();
    // 2025-11-09 is a Sunday, 2025-11-10 a Monday
    let workouts = vec![
        Workout::new(user_id, "swim", date(11, 9), 1800, 5).with_distance_m(1500.0),
        Workout::new(user_id, "swim", date(11, 10), 1800, 5).with_distance_m(2000.0),
    ];

    let volume = weekly_volume(&workouts);
    assert_eq!(volume.len(), 2);
    assert_eq!(volume[0].week_start, date(11, 3));
    assert_eq!(volume[1].week_start, date(11, 10));
}

#[test]
fn test_week_spanning_month_end() {
    let user_id = Uuid::new_v4();
    // Week of Monday 2025-10-27 runs into November
    let workouts = vec![
        Workout::new(user_id, "bike", date(10, 28), 3600, 6).with_distance_km(30.0),
        Workout::new(user_id, "bike", date(11, 1), 7200, 7).with_distance_km(60.0),
    ];

    let volume = weekly_volume(&workouts);
    assert_eq!(volume.len(), 1);
    assert_eq!(volume[0].week_start, date(10, 27));
    assert!((volume[0].total_distance_km - 90.0).abs() < 1e-9);
    assert_eq!(volume[0].total_duration_seconds, 10_800);
    assert_eq!(volume[0].workout_count, 2);
}

#[test]
fn test_empty_input() {
    assert!(weekly_volume(&[]).is_empty());
}
