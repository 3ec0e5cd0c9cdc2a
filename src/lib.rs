//! IronTrack - Triathlon Training Log
//!
//! A self-hosted store for swim, bike and run workouts backed by SQLite.
//! Workouts are kept in metric base units; per-sport views derive pace and
//! speed in display units on every read, and gear mileage is summed from
//! workout links.

pub mod records;
pub mod storage;
pub mod views;

// Re-export commonly used types
pub use records::{ConstraintError, Gear, GearPolicy, Location, Sport, User, Workout};
pub use storage::{AppConfig, Database, DatabaseError, ReportStore, WorkoutFilter};
