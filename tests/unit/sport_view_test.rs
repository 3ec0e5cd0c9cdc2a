//! Unit tests for per-sport workout views.

use chrono::NaiveDate;
use irontrack::records::Workout;
use irontrack::views::{bike_workouts, run_workouts, swim_workouts, SportView};
use uuid::Uuid;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
}

#[test]
fn test_views_partition_by_sport() {
    let user_id = Uuid::new_v4();
    let workouts = vec![
        Workout::new(user_id, "run", day(), 1800, 5).with_distance_km(5.0),
        Workout::new(user_id, "bike", day(), 3600, 6).with_distance_km(30.0),
        Workout::new(user_id, "swim", day(), 2400, 4).with_distance_m(2000.0),
        Workout::new(user_id, "run", day(), 2700, 6).with_distance_km(8.0),
    ];

    assert_eq!(run_workouts(&workouts).len(), 2);
    assert_eq!(bike_workouts(&workouts).len(), 1);
    assert_eq!(swim_workouts(&workouts).len(), 1);
}

#[test]
fn test_other_types_have_no_view() {
    let strength = Workout::new(Uuid::new_v4(), "strength", day(), 1800, 5);
    assert!(SportView::from_workout(&strength).is_none());
}

#[test]
fn test_run_view_copies_shared_fields() {
    let mut run = Workout::new(Uuid::new_v4(), "run", day(), 3000, 7).with_distance_km(10.0);
    run.avg_heart_rate_bpm = Some(158);
    run.avg_cadence = Some(172.0);
    run.notes = Some("Tempo run".to_string());

    let view = &run_workouts(std::slice::from_ref(&run))[0];
    assert_eq!(view.workout_id, run.id);
    assert_eq!(view.avg_heart_rate_bpm, Some(158));
    assert_eq!(view.avg_cadence_spm, Some(172.0));
    assert_eq!(view.notes.as_deref(), Some("Tempo run"));
    assert!((view.distance_miles.unwrap() - 6.2137).abs() < 1e-3);
}

#[test]
fn test_rates_absent_without_distance() {
    let user_id = Uuid::new_v4();
    for sport in ["run", "bike", "swim"] {
        let missing = Workout::new(user_id, sport, day(), 1800, 5);
        let zero = Workout::new(user_id, sport, day(), 1800, 5).with_distance_m(0.0);

        for workout in [missing, zero] {
            let view = SportView::from_workout(&workout).expect("sport view");
            assert_eq!(view.rate(), None, "{} with {:?}", sport, workout.distance_m);
        }
    }
}

#[test]
fn test_views_are_recomputed_from_source() {
    let mut ride = Workout::new(Uuid::new_v4(), "bike", day(), 3600, 6).with_distance_km(30.0);
    let before = bike_workouts(std::slice::from_ref(&ride))[0].speed_mph.unwrap();

    ride.distance_m = Some(60_000.0);
    let after = bike_workouts(std::slice::from_ref(&ride))[0].speed_mph.unwrap();

    assert!((after - 2.0 * before).abs() < 1e-9);
}
