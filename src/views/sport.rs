//! Per-sport projections of stored workouts.
//!
//! Each projection is recomputed from the canonical [`Workout`] on every read
//! and never written back, so it cannot drift from storage.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::{Sport, Workout};
use crate::views::conversions::{
    meters_to_miles, meters_to_yards, pace_seconds_per_100yd, pace_seconds_per_mile, speed_mph,
};

/// A run in imperial display units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunWorkout {
    pub workout_id: Uuid,
    pub user_id: Uuid,
    pub workout_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub distance_miles: Option<f64>,
    pub duration_seconds: i64,
    pub pace_seconds_per_mile: Option<f64>,
    pub elevation_gain_m: Option<f64>,
    pub calories_kcal: Option<i64>,
    pub avg_heart_rate_bpm: Option<i64>,
    /// Steps per minute
    pub avg_cadence_spm: Option<f64>,
    pub effort_level: i64,
    pub notes: Option<String>,
}

impl RunWorkout {
    /// Project a workout; `None` unless it is a run.
    pub fn from_workout(workout: &Workout) -> Option<Self> {
        if workout.sport() != Some(Sport::Run) {
            return None;
        }

        Some(Self {
            workout_id: workout.id,
            user_id: workout.user_id,
            workout_date: workout.workout_date,
            start_time: workout.start_time,
            distance_miles: workout.distance_m.map(meters_to_miles),
            duration_seconds: workout.duration_seconds,
            pace_seconds_per_mile: pace_seconds_per_mile(
                Some(workout.duration_seconds),
                workout.distance_m,
            ),
            elevation_gain_m: workout.elevation_gain_m,
            calories_kcal: workout.calories_kcal,
            avg_heart_rate_bpm: workout.avg_heart_rate_bpm,
            avg_cadence_spm: workout.avg_cadence,
            effort_level: workout.effort_level,
            notes: workout.notes.clone(),
        })
    }
}

/// A ride in imperial display units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeWorkout {
    pub workout_id: Uuid,
    pub user_id: Uuid,
    pub workout_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub distance_miles: Option<f64>,
    pub duration_seconds: i64,
    pub speed_mph: Option<f64>,
    pub elevation_gain_m: Option<f64>,
    pub calories_kcal: Option<i64>,
    pub avg_heart_rate_bpm: Option<i64>,
    /// Crank revolutions per minute
    pub avg_cadence_rpm: Option<f64>,
    pub avg_power_w: Option<f64>,
    pub effort_level: i64,
    pub notes: Option<String>,
}

impl BikeWorkout {
    /// Project a workout; `None` unless it is a ride.
    pub fn from_workout(workout: &Workout) -> Option<Self> {
        if workout.sport() != Some(Sport::Bike) {
            return None;
        }

        Some(Self {
            workout_id: workout.id,
            user_id: workout.user_id,
            workout_date: workout.workout_date,
            start_time: workout.start_time,
            distance_miles: workout.distance_m.map(meters_to_miles),
            duration_seconds: workout.duration_seconds,
            speed_mph: speed_mph(workout.distance_m, Some(workout.duration_seconds)),
            elevation_gain_m: workout.elevation_gain_m,
            calories_kcal: workout.calories_kcal,
            avg_heart_rate_bpm: workout.avg_heart_rate_bpm,
            avg_cadence_rpm: workout.avg_cadence,
            avg_power_w: workout.avg_power_w,
            effort_level: workout.effort_level,
            notes: workout.notes.clone(),
        })
    }
}

/// A swim in yards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimWorkout {
    pub workout_id: Uuid,
    pub user_id: Uuid,
    pub workout_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub distance_yards: Option<f64>,
    pub duration_seconds: i64,
    pub pace_seconds_per_100yd: Option<f64>,
    pub calories_kcal: Option<i64>,
    pub avg_heart_rate_bpm: Option<i64>,
    pub effort_level: i64,
    pub notes: Option<String>,
}

impl SwimWorkout {
    /// Project a workout; `None` unless it is a swim.
    pub fn from_workout(workout: &Workout) -> Option<Self> {
        if workout.sport() != Some(Sport::Swim) {
            return None;
        }

        Some(Self {
            workout_id: workout.id,
            user_id: workout.user_id,
            workout_date: workout.workout_date,
            start_time: workout.start_time,
            distance_yards: workout.distance_m.map(meters_to_yards),
            duration_seconds: workout.duration_seconds,
            pace_seconds_per_100yd: pace_seconds_per_100yd(
                Some(workout.duration_seconds),
                workout.distance_m,
            ),
            calories_kcal: workout.calories_kcal,
            avg_heart_rate_bpm: workout.avg_heart_rate_bpm,
            effort_level: workout.effort_level,
            notes: workout.notes.clone(),
        })
    }
}

/// Any of the sport projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sport", rename_all = "lowercase")]
pub enum SportView {
    Run(RunWorkout),
    Bike(BikeWorkout),
    Swim(SwimWorkout),
}

impl SportView {
    /// Project a workout through the view for its sport, if it has one.
    pub fn from_workout(workout: &Workout) -> Option<Self> {
        match workout.sport()? {
            Sport::Run => RunWorkout::from_workout(workout).map(SportView::Run),
            Sport::Bike => BikeWorkout::from_workout(workout).map(SportView::Bike),
            Sport::Swim => SwimWorkout::from_workout(workout).map(SportView::Swim),
        }
    }

    /// The headline rate: pace for run and swim, speed for bike.
    pub fn rate(&self) -> Option<f64> {
        match self {
            SportView::Run(run) => run.pace_seconds_per_mile,
            SportView::Bike(bike) => bike.speed_mph,
            SportView::Swim(swim) => swim.pace_seconds_per_100yd,
        }
    }
}

/// All runs among `workouts`, in input order.
pub fn run_workouts(workouts: &[Workout]) -> Vec<RunWorkout> {
    workouts.iter().filter_map(RunWorkout::from_workout).collect()
}

/// All rides among `workouts`, in input order.
pub fn bike_workouts(workouts: &[Workout]) -> Vec<BikeWorkout> {
    workouts.iter().filter_map(BikeWorkout::from_workout).collect()
}

/// All swims among `workouts`, in input order.
pub fn swim_workouts(workouts: &[Workout]) -> Vec<SwimWorkout> {
    workouts.iter().filter_map(SwimWorkout::from_workout).collect()
}
