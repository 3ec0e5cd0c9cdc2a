//! Write-time validation of records.
//!
//! Every insert and update runs these checks inside its transaction before
//! any row is written. The schema carries the same rules as CHECK, UNIQUE and
//! FOREIGN KEY constraints; failures from either side surface as a
//! [`ConstraintError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::types::{Gear, Location, User, Workout};

/// Lowest accepted average heart rate in bpm.
pub const MIN_HEART_RATE_BPM: i64 = 30;
/// Highest accepted average heart rate in bpm.
pub const MAX_HEART_RATE_BPM: i64 = 250;
/// Lowest effort level.
pub const MIN_EFFORT_LEVEL: i64 = 1;
/// Highest effort level.
pub const MAX_EFFORT_LEVEL: i64 = 10;

/// Whether gear brand and model must be filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GearPolicy {
    /// Brand and model may be left empty
    #[default]
    Optional,
    /// Brand and model are mandatory
    Required,
}

impl std::fmt::Display for GearPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GearPolicy::Optional => write!(f, "optional"),
            GearPolicy::Required => write!(f, "required"),
        }
    }
}

/// A rejected write, classified by the rule it broke.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintError {
    #[error("duplicate {field}{}", quoted(.value))]
    Uniqueness {
        field: String,
        value: Option<String>,
    },

    #[error("{field}{} is out of range ({bound})", quoted(.value))]
    Range {
        field: String,
        value: Option<String>,
        bound: String,
    },

    #[error("{field}{} is not an accepted value", quoted(.value))]
    Category {
        field: String,
        value: Option<String>,
    },

    #[error("{entity}{} does not exist", quoted(.key))]
    Referential { entity: String, key: Option<String> },

    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} cannot be changed")]
    Immutable { field: String },
}

fn quoted(value: &Option<String>) -> String {
    value
        .as_ref()
        .map(|v| format!(" '{}'", v))
        .unwrap_or_default()
}

impl ConstraintError {
    pub fn uniqueness(field: &str, value: impl ToString) -> Self {
        ConstraintError::Uniqueness {
            field: field.to_string(),
            value: Some(value.to_string()),
        }
    }

    pub fn range(field: &str, value: impl ToString, bound: &str) -> Self {
        ConstraintError::Range {
            field: field.to_string(),
            value: Some(value.to_string()),
            bound: bound.to_string(),
        }
    }

    pub fn category(field: &str, value: impl ToString) -> Self {
        ConstraintError::Category {
            field: field.to_string(),
            value: Some(value.to_string()),
        }
    }

    pub fn referential(entity: &str, key: impl ToString) -> Self {
        ConstraintError::Referential {
            entity: entity.to_string(),
            key: Some(key.to_string()),
        }
    }

    pub fn required(field: &str) -> Self {
        ConstraintError::Required {
            field: field.to_string(),
        }
    }

    pub fn immutable(field: &str) -> Self {
        ConstraintError::Immutable {
            field: field.to_string(),
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<(), ConstraintError> {
    if value.trim().is_empty() {
        return Err(ConstraintError::required(field));
    }
    Ok(())
}

fn non_negative(field: &str, value: Option<f64>) -> Result<(), ConstraintError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ConstraintError::range(field, v, ">= 0")),
        _ => Ok(()),
    }
}

/// Validate a user before insert.
pub fn validate_user(user: &User) -> Result<(), ConstraintError> {
    require_text("username", &user.username)?;
    require_text("email", &user.email)?;
    require_text("password_hash", &user.password_hash)?;
    Ok(())
}

/// Validate a location before insert.
pub fn validate_location(location: &Location) -> Result<(), ConstraintError> {
    require_text("name", &location.name)
}

/// Validate a gear item under the given brand/model policy.
pub fn validate_gear(gear: &Gear, policy: GearPolicy) -> Result<(), ConstraintError> {
    if policy == GearPolicy::Required {
        require_text("brand", gear.brand.as_deref().unwrap_or(""))?;
        require_text("model", gear.model.as_deref().unwrap_or(""))?;
    }
    Ok(())
}

/// Validate a workout type name.
pub fn validate_workout_type_name(name: &str) -> Result<(), ConstraintError> {
    require_text("workout_type", name)
}

/// Validate the numeric fields of a workout.
pub fn validate_workout(workout: &Workout) -> Result<(), ConstraintError> {
    validate_workout_type_name(&workout.workout_type)?;

    if workout.duration_seconds <= 0 {
        return Err(ConstraintError::range(
            "duration_seconds",
            workout.duration_seconds,
            "> 0",
        ));
    }

    non_negative("distance_m", workout.distance_m)?;
    non_negative("elevation_gain_m", workout.elevation_gain_m)?;
    non_negative("avg_cadence", workout.avg_cadence)?;
    non_negative("avg_power_w", workout.avg_power_w)?;

    if let Some(calories) = workout.calories_kcal {
        if calories < 0 {
            return Err(ConstraintError::range("calories_kcal", calories, ">= 0"));
        }
    }

    if let Some(hr) = workout.avg_heart_rate_bpm {
        if !(MIN_HEART_RATE_BPM..=MAX_HEART_RATE_BPM).contains(&hr) {
            return Err(ConstraintError::range(
                "avg_heart_rate_bpm",
                hr,
                "between 30 and 250",
            ));
        }
    }

    if !(MIN_EFFORT_LEVEL..=MAX_EFFORT_LEVEL).contains(&workout.effort_level) {
        return Err(ConstraintError::range(
            "effort_level",
            workout.effort_level,
            "between 1 and 10",
        ));
    }

    Ok(())
}
