//! Record types stored by IronTrack.
//!
//! All physical quantities are kept in canonical metric units (meters,
//! seconds, kcal, bpm). Display units are derived in [`crate::views`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::records::validation::ConstraintError;

/// Workout type names seeded into every new database.
pub const SEEDED_WORKOUT_TYPES: [&str; 3] = ["swim", "bike", "run"];

/// A registered athlete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Login name, unique across users
    pub username: String,
    /// Contact address, unique across users
    pub email: String,
    /// Credential hash produced by the registration layer
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh identifier.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }
}

/// A row of the workout type table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutType {
    /// Database identifier
    pub id: i64,
    /// Lowercase sport name
    pub name: String,
}

/// Normalize a workout type name the way it is stored.
pub fn normalize_type_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The sports that have a dedicated derived view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Swim,
    Bike,
    Run,
}

impl Sport {
    /// All sports in seed order.
    pub const ALL: [Sport; 3] = [Sport::Swim, Sport::Bike, Sport::Run];

    /// Workout type name for this sport.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Swim => "swim",
            Sport::Bike => "bike",
            Sport::Run => "run",
        }
    }

    /// Look up the sport for a workout type name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "swim" => Some(Sport::Swim),
            "bike" => Some(Sport::Bike),
            "run" => Some(Sport::Run),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of place a workout happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Pool,
    FreshWater,
    SaltWater,
    Road,
    Trail,
    Track,
    Indoor,
    Other,
}

impl LocationType {
    pub const ALL: [LocationType; 8] = [
        LocationType::Pool,
        LocationType::FreshWater,
        LocationType::SaltWater,
        LocationType::Road,
        LocationType::Trail,
        LocationType::Track,
        LocationType::Indoor,
        LocationType::Other,
    ];

    /// Stored name of this location type.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Pool => "pool",
            LocationType::FreshWater => "fresh_water",
            LocationType::SaltWater => "salt_water",
            LocationType::Road => "road",
            LocationType::Trail => "trail",
            LocationType::Track => "track",
            LocationType::Indoor => "indoor",
            LocationType::Other => "other",
        }
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        LocationType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ConstraintError::category("location_type", s))
    }
}

/// A named place where workouts happen. Locations are shared between users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Kind of place
    pub location_type: LocationType,
    /// City, if known
    pub city: Option<String>,
    /// State or region, if known
    pub state: Option<String>,
}

impl Location {
    /// Create a new location with a fresh identifier.
    pub fn new(name: impl Into<String>, location_type: LocationType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location_type,
            city: None,
            state: None,
        }
    }
}

/// Category of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GearType {
    Shoe,
    Bike,
    Wetsuit,
    Goggles,
    Other,
}

impl GearType {
    pub const ALL: [GearType; 5] = [
        GearType::Shoe,
        GearType::Bike,
        GearType::Wetsuit,
        GearType::Goggles,
        GearType::Other,
    ];

    /// Stored name of this gear type.
    pub fn as_str(&self) -> &'static str {
        match self {
            GearType::Shoe => "shoe",
            GearType::Bike => "bike",
            GearType::Wetsuit => "wetsuit",
            GearType::Goggles => "goggles",
            GearType::Other => "other",
        }
    }
}

impl std::fmt::Display for GearType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GearType {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        GearType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ConstraintError::category("gear_type", s))
    }
}

/// A piece of equipment owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Equipment category
    pub gear_type: GearType,
    /// Manufacturer
    pub brand: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// Date of purchase
    pub purchase_date: Option<NaiveDate>,
    /// Retired gear is kept for history but no longer used
    pub retired: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Gear {
    /// Create a new, active gear item.
    pub fn new(user_id: Uuid, gear_type: GearType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            gear_type,
            brand: None,
            model: None,
            purchase_date: None,
            retired: false,
            created_at: Utc::now(),
        }
    }

    /// Set brand and model.
    pub fn with_brand_model(mut self, brand: impl Into<String>, model: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self.model = Some(model.into());
        self
    }

    /// Human readable label, e.g. "Nike Pegasus 41".
    pub fn label(&self) -> String {
        gear_label(self.gear_type, self.brand.as_deref(), self.model.as_deref())
    }
}

/// Brand and model joined by a space, whichever is present, or else the
/// gear type.
pub fn gear_label(gear_type: GearType, brand: Option<&str>, model: Option<&str>) -> String {
    match (brand, model) {
        (Some(brand), Some(model)) => format!("{} {}", brand, model),
        (Some(name), None) | (None, Some(name)) => name.to_string(),
        (None, None) => gear_type.to_string(),
    }
}

/// A single exercise session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Workout type name (e.g. "run"); fixed once stored
    pub workout_type: String,
    /// Where it happened
    pub location_id: Option<Uuid>,
    /// Primary gear item
    pub gear_id: Option<Uuid>,
    /// Calendar day of the session
    pub workout_date: NaiveDate,
    /// Local start time
    pub start_time: Option<NaiveTime>,
    /// Elapsed time in seconds (> 0)
    pub duration_seconds: i64,
    /// Distance in meters
    pub distance_m: Option<f64>,
    /// Elevation gain in meters
    pub elevation_gain_m: Option<f64>,
    /// Energy in kcal
    pub calories_kcal: Option<i64>,
    /// Average heart rate in bpm (30-250)
    pub avg_heart_rate_bpm: Option<i64>,
    /// Steps/min for runs, rev/min for rides
    pub avg_cadence: Option<f64>,
    /// Average power in watts
    pub avg_power_w: Option<f64>,
    /// Perceived effort (1-10)
    pub effort_level: i64,
    /// Free text
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Workout {
    /// Create a workout with the required fields; everything else is unset.
    pub fn new(
        user_id: Uuid,
        workout_type: &str,
        workout_date: NaiveDate,
        duration_seconds: i64,
        effort_level: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            workout_type: normalize_type_name(workout_type),
            location_id: None,
            gear_id: None,
            workout_date,
            start_time: None,
            duration_seconds,
            distance_m: None,
            elevation_gain_m: None,
            calories_kcal: None,
            avg_heart_rate_bpm: None,
            avg_cadence: None,
            avg_power_w: None,
            effort_level,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Set the distance in meters.
    pub fn with_distance_m(mut self, distance_m: f64) -> Self {
        self.distance_m = Some(distance_m);
        self
    }

    /// Set the distance from kilometers.
    pub fn with_distance_km(self, distance_km: f64) -> Self {
        self.with_distance_m(distance_km * 1000.0)
    }

    /// The sport with a derived view, if this workout's type has one.
    pub fn sport(&self) -> Option<Sport> {
        Sport::from_name(&self.workout_type)
    }

    /// Distance in kilometers.
    pub fn distance_km(&self) -> Option<f64> {
        self.distance_m.map(crate::views::conversions::meters_to_km)
    }
}

/// Association between a workout and one gear item used in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkoutGear {
    pub workout_id: Uuid,
    pub gear_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gear_type_parse() {
        assert_eq!("shoe".parse::<GearType>().unwrap(), GearType::Shoe);
        assert_eq!(" Goggles ".parse::<GearType>().unwrap(), GearType::Goggles);
        let err = "skateboard".parse::<GearType>().unwrap_err();
        assert!(matches!(err, ConstraintError::Category { .. }));
    }

    #[test]
    fn test_location_type_parse() {
        assert_eq!(
            "salt_water".parse::<LocationType>().unwrap(),
            LocationType::SaltWater
        );
        assert!("moon".parse::<LocationType>().is_err());
    }

    #[test]
    fn test_workout_type_is_normalized() {
        let workout = Workout::new(
            Uuid::new_v4(),
            " Run ",
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            1800,
            5,
        );
        assert_eq!(workout.workout_type, "run");
        assert_eq!(workout.sport(), Some(Sport::Run));
    }

    #[test]
    fn test_gear_label() {
        let user_id = Uuid::new_v4();
        let gear = Gear::new(user_id, GearType::Shoe).with_brand_model("Nike", "Pegasus 41");
        assert_eq!(gear.label(), "Nike Pegasus 41");
        assert_eq!(Gear::new(user_id, GearType::Wetsuit).label(), "wetsuit");
    }
}
