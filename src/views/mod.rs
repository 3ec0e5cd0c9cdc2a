//! Read-only derivations over stored workouts: unit conversions, per-sport
//! views, gear mileage and weekly volume.

pub mod conversions;
pub mod gear;
pub mod sport;
pub mod volume;

pub use conversions::{format_pace, meters_to_km, meters_to_miles, meters_to_yards};
pub use gear::{GearDistance, GearTotal};
pub use sport::{
    bike_workouts, run_workouts, swim_workouts, BikeWorkout, RunWorkout, SportView, SwimWorkout,
};
pub use volume::{week_start, weekly_volume, WeeklyVolume};
