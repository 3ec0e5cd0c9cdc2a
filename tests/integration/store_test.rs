//! Integration tests for the workout store on a real database file.

use chrono::NaiveDate;
use irontrack::records::{ConstraintError, Gear, GearType, User, Workout};
use irontrack::storage::{Database, DatabaseError, WorkoutFilter};
use tempfile::TempDir;
use uuid::Uuid;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
}

fn open(dir: &TempDir) -> Database {
    Database::open(&dir.path().join("data").join("irontrack.db")).expect("Failed to open database")
}

#[test]
fn test_reopen_keeps_data_and_seed() {
    let dir = TempDir::new().unwrap();

    let user = User::new("cam", "cam@example.com", "hash");
    let workout = Workout::new(user.id, "run", date(6), 3600, 7).with_distance_km(10.0);
    {
        let db = open(&dir);
        db.insert_user(&user).unwrap();
        db.insert_workout(&workout).unwrap();
    }

    let db = open(&dir);
    assert_eq!(db.list_workout_types().unwrap().len(), 3);
    assert_eq!(db.seed_workout_types().unwrap(), 0);

    let loaded = db.get_workout(&workout.id).unwrap().expect("Workout not found");
    assert_eq!(loaded.distance_m, Some(10_000.0));
    assert_eq!(loaded.user_id, user.id);
}

#[test]
fn test_failed_write_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let user = User::new("cam", "cam@example.com", "hash");
    db.insert_user(&user).unwrap();

    let mut bad = Workout::new(user.id, "bike", date(6), 3600, 5);
    bad.avg_heart_rate_bpm = Some(300);

    let err = db.insert_workout(&bad).unwrap_err();
    assert!(matches!(err, DatabaseError::Constraint(ConstraintError::Range { .. })));
    assert!(db.get_workout(&bad.id).unwrap().is_none());
    assert_eq!(db.count_workouts(&user.id).unwrap(), 0);
}

#[test]
fn test_workout_with_unknown_gear_is_not_logged() {
    let dir = TempDir::new().unwrap();
    let user = User::new("cam", "cam@example.com", "hash");
    let shoe = Gear::new(user.id, GearType::Shoe);
    let workout = Workout::new(user.id, "run", date(6), 1800, 5).with_distance_km(5.0);
    {
        let db = open(&dir);
        db.insert_user(&user).unwrap();
        db.insert_gear(&shoe).unwrap();

        let err = db
            .insert_workout_with_gear(&workout, &[shoe.id, Uuid::new_v4()])
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Constraint(ConstraintError::Referential { .. })
        ));
    }

    let db = open(&dir);
    assert_eq!(db.count_workouts(&user.id).unwrap(), 0);
    assert!(db.get_workout(&workout.id).unwrap().is_none());
    assert!(db.get_gear(&shoe.id).unwrap().is_some());
}

#[test]
fn test_user_delete_only_touches_that_user() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);

    let mut kept = Vec::new();
    let mut removed = Vec::new();
    for (name, bucket) in [("cam", &mut removed), ("sam", &mut kept)] {
        let user = User::new(name, format!("{}@example.com", name), "hash");
        db.insert_user(&user).unwrap();
        let shoe = Gear::new(user.id, GearType::Shoe);
        db.insert_gear(&shoe).unwrap();
        for day in 6..9 {
            let w = Workout::new(user.id, "run", date(day), 1800, 5).with_distance_km(5.0);
            db.insert_workout(&w).unwrap();
            db.attach_gear(&w.id, &[shoe.id]).unwrap();
            bucket.push(w.id);
        }
        if name == "cam" {
            db.delete_user(&user.id).unwrap();
            assert!(db.list_gear(&user.id).unwrap().is_empty());
        }
    }

    for id in &removed {
        assert!(db.get_workout(id).unwrap().is_none());
    }
    for id in &kept {
        assert_eq!(db.gear_for_workout(id).unwrap().len(), 1);
    }
    assert_eq!(db.count_users().unwrap(), 1);
}

#[test]
fn test_unknown_user_operations() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let ghost = Uuid::new_v4();

    assert!(matches!(db.delete_user(&ghost), Err(DatabaseError::NotFound(_))));
    assert!(matches!(db.clear_user_data(&ghost), Err(DatabaseError::NotFound(_))));
    assert!(db
        .list_workouts(&ghost, &WorkoutFilter::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_type_names_are_normalized() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let user = User::new("cam", "cam@example.com", "hash");
    db.insert_user(&user).unwrap();

    let w = Workout::new(user.id, " Swim ", date(6), 1800, 5);
    db.insert_workout(&w).unwrap();

    let swims = db
        .list_workouts(&user.id, &WorkoutFilter::of_type("SWIM"))
        .unwrap();
    assert_eq!(swims.len(), 1);
    assert_eq!(swims[0].workout_type, "swim");
    assert!(db.get_workout_type_by_name("Bike").unwrap().is_some());
}
