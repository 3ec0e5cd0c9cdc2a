//! Stored records and their write-time validation rules.

pub mod types;
pub mod validation;

pub use types::{
    gear_label, normalize_type_name, Gear, GearType, Location, LocationType, Sport, User, Workout,
    WorkoutGear, WorkoutType, SEEDED_WORKOUT_TYPES,
};
pub use validation::{ConstraintError, GearPolicy};
