//! Database schema definitions for IronTrack.
//!
//! CHECK constraints are named `<column>_range` or `<column>_category` so a
//! failure can be classified from the SQLite error message.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Workout types table
CREATE TABLE IF NOT EXISTS workout_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- Locations table
CREATE TABLE IF NOT EXISTS locations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    location_type TEXT NOT NULL
        CONSTRAINT location_type_category CHECK (location_type IN
            ('pool', 'fresh_water', 'salt_water', 'road', 'trail', 'track', 'indoor', 'other')),
    city TEXT,
    state TEXT
);

-- Gear table
CREATE TABLE IF NOT EXISTS gear (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    gear_type TEXT NOT NULL
        CONSTRAINT gear_type_category CHECK (gear_type IN
            ('shoe', 'bike', 'wetsuit', 'goggles', 'other')),
    brand TEXT,
    model TEXT,
    purchase_date TEXT,
    retired INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_gear_user_id ON gear(user_id);

-- Workouts table
CREATE TABLE IF NOT EXISTS workouts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    workout_type_id INTEGER NOT NULL REFERENCES workout_types(id),
    location_id TEXT REFERENCES locations(id) ON DELETE SET NULL,
    gear_id TEXT REFERENCES gear(id) ON DELETE SET NULL,
    workout_date TEXT NOT NULL,
    start_time TEXT,
    duration_seconds INTEGER NOT NULL
        CONSTRAINT duration_seconds_range CHECK (duration_seconds > 0),
    distance_m REAL
        CONSTRAINT distance_m_range CHECK (distance_m IS NULL OR distance_m >= 0),
    elevation_gain_m REAL
        CONSTRAINT elevation_gain_m_range CHECK (elevation_gain_m IS NULL OR elevation_gain_m >= 0),
    calories_kcal INTEGER
        CONSTRAINT calories_kcal_range CHECK (calories_kcal IS NULL OR calories_kcal >= 0),
    avg_heart_rate_bpm INTEGER
        CONSTRAINT avg_heart_rate_bpm_range CHECK (avg_heart_rate_bpm IS NULL OR avg_heart_rate_bpm BETWEEN 30 AND 250),
    avg_cadence REAL
        CONSTRAINT avg_cadence_range CHECK (avg_cadence IS NULL OR avg_cadence >= 0),
    avg_power_w REAL
        CONSTRAINT avg_power_w_range CHECK (avg_power_w IS NULL OR avg_power_w >= 0),
    effort_level INTEGER NOT NULL
        CONSTRAINT effort_level_range CHECK (effort_level BETWEEN 1 AND 10),
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_workouts_user_date ON workouts(user_id, workout_date);
CREATE INDEX IF NOT EXISTS idx_workouts_type ON workouts(workout_type_id);

-- Gear used in a workout
CREATE TABLE IF NOT EXISTS workout_gear (
    workout_id TEXT NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
    gear_id TEXT NOT NULL REFERENCES gear(id) ON DELETE CASCADE,
    PRIMARY KEY (workout_id, gear_id)
);

CREATE INDEX IF NOT EXISTS idx_workout_gear_gear_id ON workout_gear(gear_id);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for migration from v1 to v2 (derived views).
///
/// These mirror the accessors in `crate::views` for readers that only speak
/// SQL. A zero or NULL denominator yields NULL.
pub const MIGRATION_V1_TO_V2: &str = r#"
CREATE VIEW IF NOT EXISTS run_workouts AS
SELECT
    w.id AS workout_id,
    w.user_id,
    w.workout_date,
    w.start_time,
    w.distance_m / 1609.34 AS distance_miles,
    w.duration_seconds,
    CASE WHEN w.distance_m > 0
        THEN w.duration_seconds / (w.distance_m / 1609.34)
    END AS pace_seconds_per_mile,
    w.elevation_gain_m,
    w.calories_kcal,
    w.avg_heart_rate_bpm,
    w.avg_cadence AS avg_cadence_spm,
    w.effort_level,
    w.notes
FROM workouts w
JOIN workout_types wt ON wt.id = w.workout_type_id
WHERE wt.name = 'run';

CREATE VIEW IF NOT EXISTS bike_workouts AS
SELECT
    w.id AS workout_id,
    w.user_id,
    w.workout_date,
    w.start_time,
    w.distance_m / 1609.34 AS distance_miles,
    w.duration_seconds,
    CASE WHEN w.duration_seconds > 0 AND w.distance_m > 0
        THEN (w.distance_m / 1609.34) / (w.duration_seconds / 3600.0)
    END AS speed_mph,
    w.elevation_gain_m,
    w.calories_kcal,
    w.avg_heart_rate_bpm,
    w.avg_cadence AS avg_cadence_rpm,
    w.avg_power_w,
    w.effort_level,
    w.notes
FROM workouts w
JOIN workout_types wt ON wt.id = w.workout_type_id
WHERE wt.name = 'bike';

CREATE VIEW IF NOT EXISTS swim_workouts AS
SELECT
    w.id AS workout_id,
    w.user_id,
    w.workout_date,
    w.start_time,
    w.distance_m / 0.9144 AS distance_yards,
    w.duration_seconds,
    CASE WHEN w.distance_m > 0
        THEN w.duration_seconds / ((w.distance_m / 0.9144) / 100.0)
    END AS pace_seconds_per_100yd,
    w.calories_kcal,
    w.avg_heart_rate_bpm,
    w.effort_level,
    w.notes
FROM workouts w
JOIN workout_types wt ON wt.id = w.workout_type_id
WHERE wt.name = 'swim';

CREATE VIEW IF NOT EXISTS gear_distance AS
SELECT
    g.id AS gear_id,
    g.user_id,
    g.gear_type,
    g.brand,
    g.model,
    g.retired,
    COALESCE(SUM(w.distance_m), 0.0) AS total_distance_m
FROM gear g
LEFT JOIN workout_gear wg ON wg.gear_id = g.id
LEFT JOIN workouts w ON w.id = wg.workout_id
GROUP BY g.id, g.user_id, g.gear_type, g.brand, g.model, g.retired;
"#;

/// Seed insert for one workout type. Re-seeding an existing name is a no-op.
pub const SEED_WORKOUT_TYPE: &str = "INSERT OR IGNORE INTO workout_types (name) VALUES (?1)";
