//! Read-only reporting over stored workouts.
//!
//! Provides:
//! - Per-sport projections (run, bike, swim)
//! - Weekly volume per sport
//! - Cumulative distance per gear item

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::records::{GearType, Sport};
use crate::storage::database::{query_workouts, DatabaseError, WorkoutFilter};
use crate::views::{self, BikeWorkout, GearDistance, GearTotal, RunWorkout, SwimWorkout, WeeklyVolume};

/// Report store for derived, never persisted data.
pub struct ReportStore<'a> {
    conn: &'a Connection,
}

impl<'a> ReportStore<'a> {
    /// Create a new report store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Sport Views ==========

    /// A user's runs, newest first.
    pub fn run_workouts(
        &self,
        user_id: &Uuid,
        filter: &WorkoutFilter,
    ) -> Result<Vec<RunWorkout>, DatabaseError> {
        let workouts = query_workouts(self.conn, user_id, &sport_filter(filter, Sport::Run))?;
        Ok(views::run_workouts(&workouts))
    }

    /// A user's rides, newest first.
    pub fn bike_workouts(
        &self,
        user_id: &Uuid,
        filter: &WorkoutFilter,
    ) -> Result<Vec<BikeWorkout>, DatabaseError> {
        let workouts = query_workouts(self.conn, user_id, &sport_filter(filter, Sport::Bike))?;
        Ok(views::bike_workouts(&workouts))
    }

    /// A user's swims, newest first.
    pub fn swim_workouts(
        &self,
        user_id: &Uuid,
        filter: &WorkoutFilter,
    ) -> Result<Vec<SwimWorkout>, DatabaseError> {
        let workouts = query_workouts(self.conn, user_id, &sport_filter(filter, Sport::Swim))?;
        Ok(views::swim_workouts(&workouts))
    }

    // ========== Volume ==========

    /// Weekly totals per sport between two dates, inclusive.
    pub fn weekly_volume(
        &self,
        user_id: &Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<WeeklyVolume>, DatabaseError> {
        let filter = WorkoutFilter::default().between(from, to);
        let workouts = query_workouts(self.conn, user_id, &filter)?;
        Ok(views::weekly_volume(&workouts))
    }

    // ========== Gear Distance ==========

    /// Distance per gear item for a user, read from the `gear_distance` view.
    ///
    /// Rows are ordered by gear creation time.
    pub fn gear_distance(&self, user_id: &Uuid) -> Result<Vec<GearDistance>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT gd.gear_id, gd.user_id, gd.gear_type, gd.brand, gd.model, gd.retired,
                 gd.total_distance_m
                 FROM gear_distance gd JOIN gear g ON g.id = gd.gear_id
                 WHERE gd.user_id = ?1 ORDER BY g.created_at, g.id",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(GearDistanceRow {
                    gear_id: row.get(0)?,
                    user_id: row.get(1)?,
                    gear_type: row.get(2)?,
                    brand: row.get(3)?,
                    model: row.get(4)?,
                    retired: row.get(5)?,
                    total_distance_m: row.get(6)?,
                })
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut totals = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            totals.push(row.into_gear_distance()?);
        }

        Ok(totals)
    }

    /// Distance per gear item in kilometers, longest first.
    pub fn gear_totals(&self, user_id: &Uuid) -> Result<Vec<GearTotal>, DatabaseError> {
        let mut totals: Vec<GearTotal> = self
            .gear_distance(user_id)?
            .iter()
            .map(GearTotal::from)
            .collect();

        totals.sort_by(|a, b| {
            b.total_distance_km
                .total_cmp(&a.total_distance_km)
                .then_with(|| a.gear_id.cmp(&b.gear_id))
        });

        Ok(totals)
    }
}

fn sport_filter(filter: &WorkoutFilter, sport: Sport) -> WorkoutFilter {
    WorkoutFilter {
        workout_type: Some(sport.as_str().to_string()),
        ..filter.clone()
    }
}

/// Intermediate struct for reading `gear_distance` rows.
struct GearDistanceRow {
    gear_id: String,
    user_id: String,
    gear_type: String,
    brand: Option<String>,
    model: Option<String>,
    retired: i32,
    total_distance_m: f64,
}

impl GearDistanceRow {
    fn into_gear_distance(self) -> Result<GearDistance, DatabaseError> {
        let parse = |value: &str| {
            Uuid::parse_str(value)
                .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))
        };

        let gear_type: GearType = self.gear_type.parse().map_err(|e| {
            DatabaseError::DeserializationError(format!("Invalid gear type: {}", e))
        })?;

        Ok(GearDistance {
            gear_id: parse(&self.gear_id)?,
            user_id: parse(&self.user_id)?,
            gear_type,
            brand: self.brand,
            model: self.model,
            retired: self.retired != 0,
            total_distance_m: self.total_distance_m,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Gear, User, Workout};
    use crate::storage::database::Database;

    fn setup_db() -> Database {
        Database::open_in_memory().expect("Failed to create database")
    }

    fn create_test_user(db: &Database) -> Uuid {
        let user = User::new("cam", "cam@example.com", "hash");
        db.insert_user(&user).expect("Failed to insert user");
        user.id
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[test]
    fn test_run_view_rates() {
        let db = setup_db();
        let user_id = create_test_user(&db);

        let measured = Workout::new(user_id, "run", day(6), 1609, 5).with_distance_m(1609.34);
        let unmeasured = Workout::new(user_id, "run", day(7), 1800, 4);
        let zero = Workout::new(user_id, "run", day(8), 1800, 4).with_distance_m(0.0);
        for w in [&measured, &unmeasured, &zero] {
            db.insert_workout(w).unwrap();
        }
        db.insert_workout(&Workout::new(user_id, "bike", day(6), 3600, 5)).unwrap();

        let store = ReportStore::new(db.connection());
        let runs = store.run_workouts(&user_id, &WorkoutFilter::default()).unwrap();
        assert_eq!(runs.len(), 3);

        assert_eq!(runs[0].workout_id, zero.id);
        assert_eq!(runs[0].pace_seconds_per_mile, None);
        assert_eq!(runs[1].pace_seconds_per_mile, None);
        let pace = runs[2].pace_seconds_per_mile.unwrap();
        assert!((pace - 1609.0).abs() < 1e-6);
    }

    #[test]
    fn test_sql_views_agree_with_accessors() {
        let db = setup_db();
        let user_id = create_test_user(&db);

        let mut ride = Workout::new(user_id, "bike", day(6), 3600, 6).with_distance_km(32.0);
        ride.avg_power_w = Some(190.0);
        db.insert_workout(&ride).unwrap();
        db.insert_workout(&Workout::new(user_id, "bike", day(7), 1800, 3)).unwrap();
        db.insert_workout(&Workout::new(user_id, "swim", day(8), 1500, 5).with_distance_m(1371.6))
            .unwrap();

        let store = ReportStore::new(db.connection());

        for bike in store.bike_workouts(&user_id, &WorkoutFilter::default()).unwrap() {
            let sql_speed: Option<f64> = db
                .connection()
                .query_row(
                    "SELECT speed_mph FROM bike_workouts WHERE workout_id = ?1",
                    [bike.workout_id.to_string()],
                    |row| row.get(0),
                )
                .unwrap();
            match (sql_speed, bike.speed_mph) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9),
                (a, b) => assert_eq!(a, b),
            }
        }

        let swims = store.swim_workouts(&user_id, &WorkoutFilter::default()).unwrap();
        assert_eq!(swims.len(), 1);
        let sql_pace: f64 = db
            .connection()
            .query_row(
                "SELECT pace_seconds_per_100yd FROM swim_workouts WHERE workout_id = ?1",
                [swims[0].workout_id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert!((sql_pace - swims[0].pace_seconds_per_100yd.unwrap()).abs() < 1e-9);
        assert!((sql_pace - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_weekly_volume_window() {
        let db = setup_db();
        let user_id = create_test_user(&db);

        db.insert_workout(&Workout::new(user_id, "run", day(6), 1800, 5).with_distance_km(5.0))
            .unwrap();
        db.insert_workout(&Workout::new(user_id, "run", day(12), 1800, 5).with_distance_km(6.0))
            .unwrap();
        db.insert_workout(&Workout::new(user_id, "run", day(13), 1800, 5).with_distance_km(7.0))
            .unwrap();

        let store = ReportStore::new(db.connection());
        let volume = store.weekly_volume(&user_id, Some(day(1)), Some(day(12))).unwrap();

        assert_eq!(volume.len(), 1);
        assert_eq!(volume[0].week_start, day(6));
        assert!((volume[0].total_distance_km - 11.0).abs() < 1e-9);
        assert_eq!(volume[0].workout_count, 2);
    }

    #[test]
    fn test_gear_distance_includes_unused_gear() {
        let db = setup_db();
        let user_id = create_test_user(&db);

        let used = Gear::new(user_id, GearType::Shoe).with_brand_model("Nike", "Pegasus 41");
        let unused = Gear::new(user_id, GearType::Shoe).with_brand_model("Nike", "Alphafly 3");
        db.insert_gear(&used).unwrap();
        db.insert_gear(&unused).unwrap();

        let first = Workout::new(user_id, "run", day(6), 600, 5).with_distance_m(1000.0);
        let second = Workout::new(user_id, "run", day(7), 900, 5).with_distance_m(2000.0);
        for w in [&first, &second] {
            db.insert_workout(w).unwrap();
            db.attach_gear(&w.id, &[used.id]).unwrap();
        }

        let store = ReportStore::new(db.connection());
        let rows = store.gear_distance(&user_id).unwrap();
        assert_eq!(rows.len(), 2);

        let by_id = |id: Uuid| rows.iter().find(|r| r.gear_id == id).unwrap();
        assert_eq!(by_id(used.id).total_distance_m, 3000.0);
        assert_eq!(by_id(unused.id).total_distance_m, 0.0);

        let totals = store.gear_totals(&user_id).unwrap();
        assert_eq!(totals[0].gear_id, used.id);
        assert!((totals[0].total_distance_km - 3.0).abs() < 1e-9);
        assert_eq!(totals[1].total_distance_km, 0.0);
    }
}
