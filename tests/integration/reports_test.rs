//! Integration tests for reports over seeded demo data.

use chrono::NaiveDate;
use irontrack::records::{Gear, GearType, Sport, User, Workout};
use irontrack::storage::{seed_demo, Database, ReportStore, WorkoutFilter};
use irontrack::views::week_start;

fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create database")
}

#[test]
fn test_demo_views_cover_every_workout() {
    let db = setup_db();
    let summary = seed_demo(&db, "cam").expect("Failed to seed");
    let store = ReportStore::new(db.connection());
    let all = WorkoutFilter::default();

    let runs = store.run_workouts(&summary.user_id, &all).unwrap();
    let rides = store.bike_workouts(&summary.user_id, &all).unwrap();
    let swims = store.swim_workouts(&summary.user_id, &all).unwrap();

    assert_eq!(runs.len() + rides.len() + swims.len(), summary.workouts);
    assert!(runs.iter().all(|r| r.pace_seconds_per_mile.is_some()));
    assert!(rides.iter().all(|r| r.speed_mph.is_some() && r.avg_power_w.is_some()));
    assert!(swims.iter().all(|s| s.pace_seconds_per_100yd.is_some()));
}

#[test]
fn test_sql_view_counts_match_accessors() {
    let db = setup_db();
    let summary = seed_demo(&db, "cam").unwrap();
    let store = ReportStore::new(db.connection());
    let all = WorkoutFilter::default();

    for sport in Sport::ALL {
        let sql = format!("SELECT COUNT(*) FROM {}_workouts WHERE user_id = ?1", sport);
        let from_sql: i64 = db
            .connection()
            .query_row(&sql, [summary.user_id.to_string()], |row| row.get(0))
            .unwrap();

        let from_rust = match sport {
            Sport::Run => store.run_workouts(&summary.user_id, &all).unwrap().len(),
            Sport::Bike => store.bike_workouts(&summary.user_id, &all).unwrap().len(),
            Sport::Swim => store.swim_workouts(&summary.user_id, &all).unwrap().len(),
        };
        assert_eq!(from_sql as usize, from_rust, "{}", sport);
    }
}

#[test]
fn test_weekly_volume_totals_match_workouts() {
    let db = setup_db();
    let summary = seed_demo(&db, "cam").unwrap();
    let store = ReportStore::new(db.connection());

    let volume = store.weekly_volume(&summary.user_id, None, None).unwrap();
    let workouts = db
        .list_workouts(&summary.user_id, &WorkoutFilter::default())
        .unwrap();

    let counted: usize = volume.iter().map(|v| v.workout_count).sum();
    assert_eq!(counted, workouts.len());

    let seconds: i64 = volume.iter().map(|v| v.total_duration_seconds).sum();
    assert_eq!(seconds, workouts.iter().map(|w| w.duration_seconds).sum::<i64>());

    assert!(volume.iter().all(|v| week_start(v.week_start) == v.week_start));
    assert!(volume.windows(2).all(|pair| {
        (pair[0].week_start, &pair[0].workout_type) < (pair[1].week_start, &pair[1].workout_type)
    }));
}

#[test]
fn test_gear_totals_sum_linked_distance() {
    let db = setup_db();
    let summary = seed_demo(&db, "cam").unwrap();
    let store = ReportStore::new(db.connection());

    let totals = store.gear_totals(&summary.user_id).unwrap();
    assert_eq!(totals.len(), 6);
    assert!(totals
        .windows(2)
        .all(|pair| pair[0].total_distance_km >= pair[1].total_distance_km));

    // Goggles go to every swim
    let goggles = totals
        .iter()
        .find(|t| t.gear_type == GearType::Goggles)
        .unwrap();
    let swim_km: f64 = store
        .swim_workouts(&summary.user_id, &WorkoutFilter::default())
        .unwrap()
        .iter()
        .filter_map(|s| s.distance_yards)
        .map(|yards| yards * 0.9144 / 1000.0)
        .sum();
    assert!((goggles.total_distance_km - swim_km).abs() < 1e-6);
}

#[test]
fn test_gear_distance_zero_then_three_km() {
    let db = setup_db();
    let user = User::new("cam", "cam@example.com", "hash");
    db.insert_user(&user).unwrap();
    let shoe = Gear::new(user.id, GearType::Shoe);
    db.insert_gear(&shoe).unwrap();

    let store = ReportStore::new(db.connection());
    assert_eq!(store.gear_distance(&user.id).unwrap()[0].total_distance_m, 0.0);

    let day = NaiveDate::from_ymd_opt(2025, 10, 6).unwrap();
    for meters in [1000.0, 2000.0] {
        let w = Workout::new(user.id, "run", day, 600, 5).with_distance_m(meters);
        db.insert_workout(&w).unwrap();
        db.attach_gear(&w.id, &[shoe.id, shoe.id]).unwrap();
    }

    let store = ReportStore::new(db.connection());
    assert_eq!(store.gear_distance(&user.id).unwrap()[0].total_distance_m, 3000.0);
}
