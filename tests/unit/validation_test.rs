//! Unit tests for write-time validation.

use chrono::NaiveDate;
use irontrack::records::validation::{validate_gear, validate_user, validate_workout};
use irontrack::records::{ConstraintError, Gear, GearPolicy, GearType, LocationType, User, Workout};
use uuid::Uuid;

fn workout() -> Workout {
    Workout::new(
        Uuid::new_v4(),
        "run",
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        1800,
        5,
    )
}

#[test]
fn test_effort_level_bounds() {
    for (effort, ok) in [(0, false), (1, true), (10, true), (11, false)] {
        let mut w = workout();
        w.effort_level = effort;
        assert_eq!(validate_workout(&w).is_ok(), ok, "effort {}", effort);
    }
}

#[test]
fn test_heart_rate_bounds() {
    for (hr, ok) in [(29, false), (30, true), (250, true), (251, false)] {
        let mut w = workout();
        w.avg_heart_rate_bpm = Some(hr);
        assert_eq!(validate_workout(&w).is_ok(), ok, "hr {}", hr);
    }
}

#[test]
fn test_negative_measurements_rejected() {
    let mut w = workout();
    w.elevation_gain_m = Some(-1.0);
    assert!(matches!(
        validate_workout(&w),
        Err(ConstraintError::Range { field, .. }) if field == "elevation_gain_m"
    ));

    let mut w = workout();
    w.calories_kcal = Some(-5);
    assert!(matches!(
        validate_workout(&w),
        Err(ConstraintError::Range { field, .. }) if field == "calories_kcal"
    ));

    let mut w = workout();
    w.distance_m = Some(f64::NAN);
    assert!(validate_workout(&w).is_err());
}

#[test]
fn test_blank_user_fields_required() {
    let user = User::new("  ", "a@example.com", "hash");
    assert_eq!(
        validate_user(&user),
        Err(ConstraintError::required("username"))
    );
}

#[test]
fn test_gear_policy() {
    let gear = Gear::new(Uuid::new_v4(), GearType::Bike);
    assert!(validate_gear(&gear, GearPolicy::Optional).is_ok());
    assert_eq!(
        validate_gear(&gear, GearPolicy::Required),
        Err(ConstraintError::required("brand"))
    );

    let named = gear.with_brand_model("Trek", "Emonda SL6");
    assert!(validate_gear(&named, GearPolicy::Required).is_ok());
}

#[test]
fn test_unknown_categories_rejected() {
    assert!(matches!(
        "lake".parse::<LocationType>(),
        Err(ConstraintError::Category { .. })
    ));
    assert!(matches!(
        "skis".parse::<GearType>(),
        Err(ConstraintError::Category { .. })
    ));
    assert_eq!("fresh_water".parse::<LocationType>(), Ok(LocationType::FreshWater));
}
