//! Weekly training volume per sport.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::records::Workout;
use crate::views::conversions::meters_to_km;

/// Totals for one sport in one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyVolume {
    /// Monday of the week
    pub week_start: NaiveDate,
    /// Workout type name
    pub workout_type: String,
    /// Summed distance in kilometers; workouts without distance count as zero
    pub total_distance_km: f64,
    /// Summed duration in seconds
    pub total_duration_seconds: i64,
    /// Number of workouts in the bucket
    pub workout_count: usize,
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Bucket workouts by (week, sport), ordered by week then sport name.
pub fn weekly_volume(workouts: &[Workout]) -> Vec<WeeklyVolume> {
    let mut buckets: BTreeMap<(NaiveDate, &str), (f64, i64, usize)> = BTreeMap::new();

    for workout in workouts {
        let key = (week_start(workout.workout_date), workout.workout_type.as_str());
        let entry = buckets.entry(key).or_insert((0.0, 0, 0));
        entry.0 += workout.distance_m.unwrap_or(0.0);
        entry.1 += workout.duration_seconds;
        entry.2 += 1;
    }

    buckets
        .into_iter()
        .map(|((week_start, workout_type), (meters, seconds, count))| WeeklyVolume {
            week_start,
            workout_type: workout_type.to_string(),
            total_distance_km: meters_to_km(meters),
            total_duration_seconds: seconds,
            workout_count: count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2025-10-06 is a Monday
        assert_eq!(week_start(day(6)), day(6));
        assert_eq!(week_start(day(8)), day(6));
        assert_eq!(week_start(day(12)), day(6));
        assert_eq!(week_start(day(13)), day(13));
    }

    #[test]
    fn test_weekly_buckets() {
        let user = Uuid::new_v4();
        let workouts = vec![
            Workout::new(user, "run", day(6), 1800, 5).with_distance_km(5.0),
            Workout::new(user, "run", day(9), 3600, 6).with_distance_km(10.0),
            Workout::new(user, "bike", day(7), 5400, 6),
            Workout::new(user, "run", day(14), 1200, 4).with_distance_km(3.0),
        ];

        let volume = weekly_volume(&workouts);
        assert_eq!(volume.len(), 3);

        assert_eq!(volume[0].week_start, day(6));
        assert_eq!(volume[0].workout_type, "bike");
        assert_eq!(volume[0].total_distance_km, 0.0);
        assert_eq!(volume[0].total_duration_seconds, 5400);

        assert_eq!(volume[1].workout_type, "run");
        assert!((volume[1].total_distance_km - 15.0).abs() < 1e-9);
        assert_eq!(volume[1].total_duration_seconds, 5400);
        assert_eq!(volume[1].workout_count, 2);

        assert_eq!(volume[2].week_start, day(13));
    }
}
