//! Command-line interface for IronTrack.
//!
//! Subcommands:
//! - `users`, `user-add` - Manage users
//! - `types` - List workout types
//! - `location-add` - Register a location
//! - `workout-add`, `recent`, `workouts` - Log and list workouts
//! - `run`, `bike`, `swim` - Per-sport views with pace or speed
//! - `volume` - Weekly volume per sport
//! - `gear-add`, `gear-attach`, `gear` - Gear closet and mileage
//! - `seed-demo` - Generate a demo training block

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use irontrack::records::{Gear, GearType, Location, LocationType, User, Workout};
use irontrack::storage::config::AppConfig;
use irontrack::storage::{seed_demo, Database, ReportStore, WorkoutFilter};
use irontrack::views::{format_pace, meters_to_km};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "irontrack")]
#[command(author, version, about = "Self-hosted triathlon training log", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "IRONTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides the configured path)
    #[arg(short, long, env = "IRONTRACK_DATABASE")]
    pub database: Option<PathBuf>,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List users
    Users,

    /// Create a user
    UserAdd {
        username: String,
        email: String,
        /// Pre-hashed password
        #[arg(long, default_value = "fake_hash")]
        password_hash: String,
    },

    /// List workout types
    Types,

    /// Register a location
    LocationAdd {
        name: String,
        /// pool, fresh_water, salt_water, road, trail, track, indoor or other
        location_type: LocationType,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
    },

    /// Log a workout
    WorkoutAdd(WorkoutAddArgs),

    /// Most recent workouts
    Recent {
        username: String,
        /// Number of rows (default from config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Workouts with optional filters
    Workouts {
        username: String,
        /// Only this workout type
        #[arg(long)]
        sport: Option<String>,
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Runs with distance in miles and pace per mile
    Run(ViewArgs),

    /// Rides with distance in miles and speed in mph
    Bike(ViewArgs),

    /// Swims with distance in yards and pace per 100 yards
    Swim(ViewArgs),

    /// Weekly distance and duration per sport
    Volume {
        username: String,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Add a gear item
    GearAdd {
        username: String,
        /// shoe, bike, wetsuit, goggles or other
        gear_type: GearType,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        model: Option<String>,
        /// Purchase date (YYYY-MM-DD)
        #[arg(long)]
        purchased: Option<NaiveDate>,
    },

    /// Link gear items to a workout
    GearAttach {
        workout: Uuid,
        #[arg(required = true)]
        gear: Vec<Uuid>,
    },

    /// Total distance per gear item
    Gear { username: String },

    /// Replace a user's data with a generated training block
    SeedDemo {
        #[arg(default_value = "cam")]
        username: String,
    },
}

#[derive(Args, Debug)]
pub struct WorkoutAddArgs {
    pub username: String,
    /// swim, bike, run or any added type
    pub sport: String,
    /// Workout date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
    /// Start time (HH:MM)
    #[arg(long, value_parser = parse_start_time)]
    pub start: Option<NaiveTime>,
    /// Duration in seconds
    #[arg(long)]
    pub duration: i64,
    /// Perceived effort, 1-10
    #[arg(long)]
    pub effort: i64,
    #[arg(long)]
    pub distance_km: Option<f64>,
    #[arg(long)]
    pub elevation_m: Option<f64>,
    #[arg(long)]
    pub calories: Option<i64>,
    /// Average heart rate in bpm
    #[arg(long)]
    pub hr: Option<i64>,
    #[arg(long)]
    pub cadence: Option<f64>,
    /// Average power in watts
    #[arg(long)]
    pub power: Option<f64>,
    #[arg(long)]
    pub location: Option<Uuid>,
    /// Gear used; the first one is the primary gear
    #[arg(long = "gear")]
    pub gear: Vec<Uuid>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct RangeArgs {
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl RangeArgs {
    fn filter(&self) -> WorkoutFilter {
        WorkoutFilter {
            workout_type: None,
            from: self.from,
            to: self.to,
            limit: self.limit,
        }
    }
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    pub username: String,
    #[command(flatten)]
    pub range: RangeArgs,
}

fn parse_start_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| format!("expected HH:MM: {}", e))
}

/// Run one subcommand against an open database.
pub fn execute(cli: &Cli, config: &AppConfig, db: &Database) -> Result<()> {
    let json = cli.json;

    match &cli.command {
        Commands::Users => {
            let users = db.list_users()?;
            emit(json, &users, |users| {
                for user in users {
                    println!("{:<36}  {:<16}  {}", user.id, user.username, user.email);
                }
            })
        }

        Commands::UserAdd {
            username,
            email,
            password_hash,
        } => {
            let user = User::new(username.as_str(), email.as_str(), password_hash.as_str());
            db.insert_user(&user)
                .with_context(|| format!("Failed to add user {}", username))?;
            emit(json, &user, |user| println!("Added user {} ({})", user.username, user.id))
        }

        Commands::Types => {
            let types = db.list_workout_types()?;
            emit(json, &types, |types| {
                for t in types {
                    println!("{:>3}  {}", t.id, t.name);
                }
            })
        }

        Commands::LocationAdd {
            name,
            location_type,
            city,
            state,
        } => {
            let mut location = Location::new(name.as_str(), *location_type);
            location.city = city.clone();
            location.state = state.clone();
            db.insert_location(&location)
                .with_context(|| format!("Failed to add location {}", name))?;
            emit(json, &location, |l| println!("Added location {} ({})", l.name, l.id))
        }

        Commands::WorkoutAdd(args) => {
            let user = find_user(db, &args.username)?;
            let mut workout =
                Workout::new(user.id, &args.sport, args.date, args.duration, args.effort);
            workout.start_time = args.start;
            workout.distance_m = args.distance_km.map(|km| km * 1000.0);
            workout.elevation_gain_m = args.elevation_m;
            workout.calories_kcal = args.calories;
            workout.avg_heart_rate_bpm = args.hr;
            workout.avg_cadence = args.cadence;
            workout.avg_power_w = args.power;
            workout.location_id = args.location;
            workout.gear_id = args.gear.first().copied();
            workout.notes = args.notes.clone();

            db.insert_workout_with_gear(&workout, &args.gear)
                .context("Failed to log workout")?;

            emit(json, &workout, |w| {
                println!("Logged {} on {} ({})", w.workout_type, w.workout_date, w.id)
            })
        }

        Commands::Recent { username, limit } => {
            let user = find_user(db, username)?;
            let limit = limit.unwrap_or(config.display.recent_limit);
            let workouts = db.recent_workouts(&user.id, limit)?;
            emit(json, &workouts, |w| print_workouts(w))
        }

        Commands::Workouts {
            username,
            sport,
            range,
        } => {
            let user = find_user(db, username)?;
            let filter = WorkoutFilter {
                workout_type: sport.clone(),
                ..range.filter()
            };
            let workouts = db.list_workouts(&user.id, &filter)?;
            emit(json, &workouts, |w| print_workouts(w))
        }

        Commands::Run(args) => {
            let user = find_user(db, &args.username)?;
            let runs = ReportStore::new(db.connection()).run_workouts(&user.id, &args.range.filter())?;
            emit(json, &runs, |runs| {
                println!("{:<10}  {:>8}  {:>9}  {:>7}", "date", "miles", "duration", "/mile");
                for r in runs {
                    println!(
                        "{:<10}  {:>8}  {:>9}  {:>7}",
                        r.workout_date,
                        fixed(r.distance_miles, 2),
                        format_duration(r.duration_seconds),
                        format_pace(r.pace_seconds_per_mile),
                    );
                }
            })
        }

        Commands::Bike(args) => {
            let user = find_user(db, &args.username)?;
            let rides =
                ReportStore::new(db.connection()).bike_workouts(&user.id, &args.range.filter())?;
            emit(json, &rides, |rides| {
                println!("{:<10}  {:>8}  {:>9}  {:>6}  {:>6}", "date", "miles", "duration", "mph", "watts");
                for r in rides {
                    println!(
                        "{:<10}  {:>8}  {:>9}  {:>6}  {:>6}",
                        r.workout_date,
                        fixed(r.distance_miles, 2),
                        format_duration(r.duration_seconds),
                        fixed(r.speed_mph, 1),
                        fixed(r.avg_power_w, 0),
                    );
                }
            })
        }

        Commands::Swim(args) => {
            let user = find_user(db, &args.username)?;
            let swims =
                ReportStore::new(db.connection()).swim_workouts(&user.id, &args.range.filter())?;
            emit(json, &swims, |swims| {
                println!("{:<10}  {:>8}  {:>9}  {:>7}", "date", "yards", "duration", "/100yd");
                for s in swims {
                    println!(
                        "{:<10}  {:>8}  {:>9}  {:>7}",
                        s.workout_date,
                        fixed(s.distance_yards, 0),
                        format_duration(s.duration_seconds),
                        format_pace(s.pace_seconds_per_100yd),
                    );
                }
            })
        }

        Commands::Volume { username, from, to } => {
            let user = find_user(db, username)?;
            let volume = ReportStore::new(db.connection()).weekly_volume(&user.id, *from, *to)?;
            emit(json, &volume, |volume| {
                println!("{:<10}  {:<6}  {:>8}  {:>9}  {:>5}", "week", "sport", "km", "duration", "count");
                for v in volume {
                    println!(
                        "{:<10}  {:<6}  {:>8.1}  {:>9}  {:>5}",
                        v.week_start,
                        v.workout_type,
                        v.total_distance_km,
                        format_duration(v.total_duration_seconds),
                        v.workout_count,
                    );
                }
            })
        }

        Commands::GearAdd {
            username,
            gear_type,
            brand,
            model,
            purchased,
        } => {
            let user = find_user(db, username)?;
            let mut gear = Gear::new(user.id, *gear_type);
            gear.brand = brand.clone();
            gear.model = model.clone();
            gear.purchase_date = *purchased;
            db.insert_gear(&gear).context("Failed to add gear")?;
            emit(json, &gear, |g| println!("Added {} ({})", g.label(), g.id))
        }

        Commands::GearAttach { workout, gear } => {
            let added = db
                .attach_gear(workout, gear)
                .with_context(|| format!("Failed to link gear to workout {}", workout))?;
            emit(json, &serde_json::json!({ "added": added }), |_| {
                println!("Linked {} new gear item(s)", added)
            })
        }

        Commands::Gear { username } => {
            let user = find_user(db, username)?;
            let totals = ReportStore::new(db.connection()).gear_totals(&user.id)?;
            emit(json, &totals, |totals| {
                for t in totals {
                    let status = if t.retired { "retired" } else { "" };
                    println!(
                        "{:<8}  {:<24}  {:>9.1} km  {}",
                        t.gear_type, t.label, t.total_distance_km, status
                    );
                }
            })
        }

        Commands::SeedDemo { username } => {
            let summary = seed_demo(db, username)
                .with_context(|| format!("Failed to seed demo data for {}", username))?;
            let report = serde_json::json!({
                "user_id": summary.user_id,
                "reused_user": summary.reused_user,
                "cleared_workouts": summary.cleared.workouts,
                "cleared_gear": summary.cleared.gear,
                "gear": summary.gear,
                "workouts": summary.workouts,
                "gear_links": summary.gear_links,
            });
            emit(json, &report, |_| {
                println!(
                    "Seeded {} workouts, {} gear items and {} gear links for {}",
                    summary.workouts, summary.gear, summary.gear_links, username
                )
            })
        }
    }
}

fn find_user(db: &Database, username: &str) -> Result<User> {
    db.get_user_by_username(username)?
        .ok_or_else(|| anyhow!("User '{}' not found", username))
}

/// Print as pretty JSON or with the given table renderer.
fn emit<T: Serialize + ?Sized>(json: bool, value: &T, render: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        render(value);
    }
    Ok(())
}

fn print_workouts(workouts: &[Workout]) {
    println!(
        "{:<10}  {:<5}  {:<5}  {:>8}  {:>9}  {:>6}  notes",
        "date", "start", "sport", "km", "duration", "effort"
    );
    for w in workouts {
        println!(
            "{:<10}  {:<5}  {:<5}  {:>8}  {:>9}  {:>6}  {}",
            w.workout_date,
            w.start_time.map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
            w.workout_type,
            fixed(w.distance_m.map(meters_to_km), 2),
            format_duration(w.duration_seconds),
            w.effort_level,
            w.notes.as_deref().unwrap_or(""),
        );
    }
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_default()
}

fn format_duration(seconds: i64) -> String {
    format!("{}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}
