//! Deterministic demo data.
//!
//! Builds a training block from 2025-10-01 to 2025-12-31 whose volume, effort
//! and training frequency grow week over week. The same seed always produces
//! the same workouts.

use chrono::{Duration, NaiveDate, NaiveTime};
use rand::distributions::{WeightedError, WeightedIndex};
use rand::prelude::*;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::records::{Gear, GearPolicy, GearType, Location, LocationType, Sport, User, Workout};
use crate::storage::database::{self, ClearedData, Database, DatabaseError};

/// Random seed used for demo data.
pub const DEMO_SEED: u64 = 341;

const DEMO_LOCATION: &str = "Case Track";

/// What [`seed_demo`] created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub user_id: Uuid,
    /// Whether the user existed before seeding
    pub reused_user: bool,
    /// Rows removed before seeding
    pub cleared: ClearedData,
    pub gear: usize,
    pub workouts: usize,
    pub gear_links: usize,
}

/// Demo seeding errors.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Invalid sport weights: {0}")]
    Weights(#[from] WeightedError),
}

/// Demo gear, grouped by the sport it is used for.
struct GearCloset {
    run: Vec<Uuid>,
    bike: Vec<Uuid>,
    /// Goggles first, then wetsuit
    swim: Vec<Uuid>,
}

impl GearCloset {
    fn for_sport(&self, sport: Sport) -> &[Uuid] {
        match sport {
            Sport::Run => &self.run,
            Sport::Bike => &self.bike,
            Sport::Swim => &self.swim,
        }
    }

    fn len(&self) -> usize {
        self.run.len() + self.bike.len() + self.swim.len()
    }
}

/// Replace a user's workouts and gear with a generated training block.
///
/// Creates the user if it does not exist, and the demo location if no
/// location of that name exists yet. The whole block is written in one
/// transaction; on error the database is left as it was.
pub fn seed_demo(db: &Database, username: &str) -> Result<SeedSummary, SeedError> {
    let tx = db.begin()?;

    let existing = database::query_user(&tx, "WHERE username = ?1", username)?;
    let (user_id, reused_user) = match existing {
        Some(user) => (user.id, true),
        None => {
            let user = User::new(username, format!("{}@example.com", username), "fake_hash");
            database::write_user(&tx, &user)?;
            (user.id, false)
        }
    };

    let cleared = database::delete_user_data(&tx, &user_id)?;
    let location_id = demo_location(&tx)?;
    let closet = create_demo_gear(&tx, user_id, db.gear_policy())?;

    let mut rng = StdRng::seed_from_u64(DEMO_SEED);
    let start = date(2025, 10, 1);
    let end = date(2025, 12, 31);

    let mut workouts = 0;
    let mut gear_links = 0;
    let mut current = start;

    while current <= end {
        let day = current;
        let week_index = (day - start).num_days() / 7;
        current += Duration::days(1);

        // Training days get more frequent as the block goes on
        let train_prob = 0.4 + (0.02 * week_index as f64).min(0.3);
        if !rng.gen_bool(train_prob) {
            continue;
        }

        let roll: f64 = rng.gen();
        let sessions = if roll < 0.7 {
            1
        } else if roll < 0.95 {
            2
        } else {
            3
        };

        let swim_w = (0.25 - 0.005 * week_index as f64).max(0.15);
        let bike_w = (0.35 + 0.007 * week_index as f64).min(0.50);
        let run_w = 1.0 - swim_w - bike_w;
        let sports = [Sport::Swim, Sport::Bike, Sport::Run];
        let weights = WeightedIndex::new([swim_w, bike_w, run_w])?;

        for _ in 0..sessions {
            let sport = sports[weights.sample(&mut rng)];
            let gear_ids = choose_gear(&mut rng, sport, &closet);

            let mut workout = trending_workout(&mut rng, user_id, sport, day, week_index);
            workout.gear_id = gear_ids.first().copied();
            if sport == Sport::Run && rng.gen_bool(0.3) {
                workout.location_id = Some(location_id);
            }

            gear_links += database::write_workout(&tx, &workout, &gear_ids)?;
            workouts += 1;
        }
    }

    tx.commit()
        .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

    tracing::info!(
        "Seeded {} workouts and {} gear items for {}",
        workouts,
        closet.len(),
        username
    );

    Ok(SeedSummary {
        user_id,
        reused_user,
        cleared,
        gear: closet.len(),
        workouts,
        gear_links,
    })
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

fn demo_location(conn: &Connection) -> Result<Uuid, DatabaseError> {
    if let Some(existing) = database::query_location_by_name(conn, DEMO_LOCATION)? {
        return Ok(existing.id);
    }

    let mut location = Location::new(DEMO_LOCATION, LocationType::Track);
    location.city = Some("Cleveland".to_string());
    location.state = Some("OH".to_string());
    database::write_location(conn, &location)?;

    Ok(location.id)
}

fn create_demo_gear(
    conn: &Connection,
    user_id: Uuid,
    policy: GearPolicy,
) -> Result<GearCloset, DatabaseError> {
    let add = |gear_type, brand: &str, model: &str, purchased: NaiveDate| {
        let mut gear = Gear::new(user_id, gear_type).with_brand_model(brand, model);
        gear.purchase_date = Some(purchased);
        database::write_gear(conn, &gear, policy).map(|_| gear.id)
    };

    Ok(GearCloset {
        run: vec![
            add(GearType::Shoe, "Nike", "Pegasus 41", date(2025, 7, 1))?,
            add(GearType::Shoe, "Nike", "Alphafly 3", date(2025, 8, 15))?,
        ],
        bike: vec![
            add(GearType::Bike, "Trek", "Emonda SL6", date(2025, 4, 10))?,
            add(GearType::Bike, "Canyon", "Speedmax CF", date(2025, 6, 5))?,
        ],
        swim: vec![
            add(GearType::Goggles, "Speedo", "Vanquisher 2.0", date(2025, 3, 1))?,
            add(GearType::Wetsuit, "Orca", "Athlex", date(2025, 5, 20))?,
        ],
    })
}

/// One pair of shoes or one bike; goggles for every swim, sometimes a wetsuit.
fn choose_gear(rng: &mut StdRng, sport: Sport, closet: &GearCloset) -> Vec<Uuid> {
    let options = closet.for_sport(sport);

    match sport {
        Sport::Run | Sport::Bike => options.choose(rng).copied().into_iter().collect(),
        Sport::Swim => {
            let mut ids: Vec<Uuid> = options.first().copied().into_iter().collect();
            if options.len() > 1 && rng.gen_bool(0.3) {
                ids.push(options[1]);
            }
            ids
        }
    }
}

fn random_start_time(rng: &mut StdRng) -> Option<NaiveTime> {
    let hour = if rng.gen_bool(0.5) {
        rng.gen_range(6..=9)
    } else {
        rng.gen_range(16..=19)
    };
    let minute = *[0, 15, 30, 45].choose(rng).unwrap_or(&0);
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// A workout whose distance and duration grow about 10% per week.
fn trending_workout(
    rng: &mut StdRng,
    user_id: Uuid,
    sport: Sport,
    day: NaiveDate,
    week_index: i64,
) -> Workout {
    let growth = 1.0 + week_index as f64 * 0.10;

    let (distance_km, minutes, elevation, cadence, power) = match sport {
        Sport::Swim => (
            (rng.gen_range(1.0..3.0) * growth).min(5.0),
            (rng.gen_range(20..=60) as f64 * growth).min(120.0),
            0.0,
            rng.gen_range(25.0..40.0),
            None,
        ),
        Sport::Bike => (
            (rng.gen_range(20.0..70.0) * growth).min(150.0),
            (rng.gen_range(60..=180) as f64 * growth).min(360.0),
            rng.gen_range(100.0..2000.0),
            rng.gen_range(75.0..95.0),
            Some((rng.gen_range(140.0..220.0) * (1.0 + 0.03 * week_index as f64)).min(350.0)),
        ),
        Sport::Run => (
            (rng.gen_range(5.0..18.0) * growth).min(30.0),
            (rng.gen_range(30..=100) as f64 * growth).min(180.0),
            rng.gen_range(50.0..800.0),
            rng.gen_range(155.0..180.0),
            None,
        ),
    };

    let effort = (rng.gen_range(5..=8) + week_index / 4).clamp(3, 10);

    let (kcal_per_min, hr_base, notes) = match sport {
        Sport::Swim => (
            9.0,
            120,
            [
                "Pool intervals",
                "Easy endurance swim",
                "Drills + technique",
                "Tempo swim set",
                "Open water simulation in pool",
            ],
        ),
        Sport::Bike => (
            8.0,
            125,
            [
                "Endurance ride",
                "Intervals on trainer",
                "Long ride outside",
                "Hill repeats",
                "Sweet spot workout",
            ],
        ),
        Sport::Run => (
            11.0,
            130,
            [
                "Easy run",
                "Tempo run",
                "Long run",
                "Track workout",
                "Brick run off the bike",
            ],
        ),
    };

    let calories = (minutes * kcal_per_min * (0.9 + 0.02 * effort as f64)) as i64;
    let heart_rate =
        ((hr_base + 5 * (effort - 5)) as f64 + rng.gen_range(-5.0..5.0)).clamp(100.0, 190.0) as i64;

    let mut workout = Workout::new(user_id, sport.as_str(), day, (minutes * 60.0) as i64, effort)
        .with_distance_km(round1(distance_km));
    workout.start_time = random_start_time(rng);
    workout.elevation_gain_m = Some(round1(elevation));
    workout.calories_kcal = Some(calories);
    workout.avg_heart_rate_bpm = Some(heart_rate);
    workout.avg_cadence = Some(round1(cadence));
    workout.avg_power_w = power;
    workout.notes = notes.choose(rng).map(|n| n.to_string());
    workout
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
