//! Database operations using rusqlite.
//!
//! Every write validates its record and checks uniqueness and references
//! inside one transaction, so a rejected write leaves nothing behind.
//! Foreign keys are enforced per connection; deletes cascade as declared in
//! the schema.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, OptionalExtension, Transaction};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::records::validation::{self, ConstraintError, GearPolicy};
use crate::records::{
    normalize_type_name, Gear, GearType, Location, LocationType, User, Workout, WorkoutType,
    SEEDED_WORKOUT_TYPES,
};
use crate::storage::schema::{
    CURRENT_VERSION, MIGRATION_V1_TO_V2, SCHEMA, SCHEMA_VERSION_TABLE, SEED_WORKOUT_TYPE,
};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";

const WORKOUT_SELECT: &str = "SELECT w.id, w.user_id, wt.name, w.location_id, w.gear_id,
     w.workout_date, w.start_time, w.duration_seconds, w.distance_m, w.elevation_gain_m,
     w.calories_kcal, w.avg_heart_rate_bpm, w.avg_cadence, w.avg_power_w, w.effort_level,
     w.notes, w.created_at
     FROM workouts w JOIN workout_types wt ON wt.id = w.workout_type_id";

const NEWEST_FIRST: &str =
    " ORDER BY w.workout_date DESC, w.start_time IS NULL, w.start_time DESC, w.created_at DESC";

const GEAR_SELECT: &str = "SELECT id, user_id, gear_type, brand, model, purchase_date, retired,
     created_at FROM gear";

/// Optional filters for workout listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutFilter {
    /// Only workouts of this type
    pub workout_type: Option<String>,
    /// Earliest date, inclusive
    pub from: Option<NaiveDate>,
    /// Latest date, inclusive
    pub to: Option<NaiveDate>,
    /// Maximum number of rows
    pub limit: Option<usize>,
}

impl WorkoutFilter {
    /// Filter on a single workout type.
    pub fn of_type(workout_type: &str) -> Self {
        Self {
            workout_type: Some(workout_type.to_string()),
            ..Default::default()
        }
    }

    /// Restrict to an inclusive date range.
    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Cap the number of rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Row counts removed by [`Database::clear_user_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearedData {
    pub workouts: usize,
    pub gear: usize,
}

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
    gear_policy: GearPolicy,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::IoError(e.to_string()))?;
            }
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        tracing::debug!("Opened database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        let db = Self {
            conn,
            gear_policy: GearPolicy::default(),
        };
        db.initialize()?;

        Ok(db)
    }

    /// Use the given brand/model policy for gear writes.
    pub fn with_gear_policy(mut self, policy: GearPolicy) -> Self {
        self.gear_policy = policy;
        self
    }

    /// The active brand/model policy for gear writes.
    pub fn gear_policy(&self) -> GearPolicy {
        self.gear_policy
    }

    /// Initialize the database schema and seed data.
    fn initialize(&self) -> Result<(), DatabaseError> {
        // Cascades and reference checks need this on every connection
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = self.get_schema_version()?;

        if current_version < CURRENT_VERSION {
            self.migrate(current_version)?;
        }

        self.seed_workout_types()?;

        Ok(())
    }

    /// Get the current schema version.
    fn get_schema_version(&self) -> Result<i32, DatabaseError> {
        self.conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    /// Run database migrations.
    fn migrate(&self, from_version: i32) -> Result<(), DatabaseError> {
        let steps: [(i32, &str); 2] = [(1, SCHEMA), (2, MIGRATION_V1_TO_V2)];

        for (version, sql) in steps {
            if from_version >= version {
                continue;
            }

            let tx = self.begin()?;
            tx.execute_batch(sql)
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
            tx.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                params![version, Utc::now().to_rfc3339()],
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
            commit(tx)?;

            tracing::info!("Database migrated to version {}", version);
        }

        Ok(())
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Execute raw SQL and return the number of rows affected.
    ///
    /// Constraint failures are classified the same way as for the typed
    /// operations.
    pub fn execute(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<usize, DatabaseError> {
        self.conn.execute(sql, params).map_err(classify_sqlite_error)
    }

    /// Begin a transaction on the shared connection.
    ///
    /// Dropping the transaction without committing rolls it back.
    pub(crate) fn begin(&self) -> Result<Transaction<'_>, DatabaseError> {
        self.conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }

    // ========== User Operations ==========

    /// Insert a new user. Username and email must both be unused.
    pub fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        let tx = self.begin()?;
        write_user(&tx, user)?;
        commit(tx)
    }

    /// Get a user by ID.
    pub fn get_user(&self, id: &Uuid) -> Result<Option<User>, DatabaseError> {
        query_user(&self.conn, "WHERE id = ?1", &id.to_string())
    }

    /// Get a user by username.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        query_user(&self.conn, "WHERE username = ?1", username)
    }

    /// Get all users, ordered by username.
    pub fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, username, email, password_hash, created_at
                 FROM users ORDER BY username",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], map_user_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut users = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            users.push(row.into_user()?);
        }

        Ok(users)
    }

    /// Delete a user and, by cascade, their gear and workouts.
    pub fn delete_user(&self, id: &Uuid) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])
            .map_err(classify_sqlite_error)?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("User {}", id)));
        }

        tracing::info!("Deleted user {} with all gear and workouts", id);
        Ok(())
    }

    /// Count users in the database.
    pub fn count_users(&self) -> Result<usize, DatabaseError> {
        self.count("SELECT COUNT(*) FROM users", params![])
    }

    /// Delete every workout and gear item of a user, keeping the user.
    pub fn clear_user_data(&self, user_id: &Uuid) -> Result<ClearedData, DatabaseError> {
        let tx = self.begin()?;
        let cleared = delete_user_data(&tx, user_id)?;
        commit(tx)?;

        Ok(cleared)
    }

    // ========== Workout Type Operations ==========

    /// Insert the built-in workout types, skipping names that already exist.
    ///
    /// Returns the number of types added.
    pub fn seed_workout_types(&self) -> Result<usize, DatabaseError> {
        let mut added = 0;
        for name in SEEDED_WORKOUT_TYPES {
            added += self
                .conn
                .execute(SEED_WORKOUT_TYPE, [name])
                .map_err(classify_sqlite_error)?;
        }

        if added > 0 {
            tracing::info!("Seeded {} workout types", added);
        }

        Ok(added)
    }

    /// Insert a new workout type. Fails if the name is already taken.
    pub fn insert_workout_type(&self, name: &str) -> Result<WorkoutType, DatabaseError> {
        let name = normalize_type_name(name);
        validation::validate_workout_type_name(&name).map_err(rejected)?;

        let tx = self.begin()?;

        if row_exists(&tx, "SELECT 1 FROM workout_types WHERE name = ?1", [&name])? {
            return Err(rejected(ConstraintError::uniqueness("workout_type", &name)));
        }

        tx.execute("INSERT INTO workout_types (name) VALUES (?1)", [&name])
            .map_err(classify_sqlite_error)?;
        let id = tx.last_insert_rowid();

        commit(tx)?;
        tracing::debug!("Inserted workout type {} ({})", name, id);

        Ok(WorkoutType { id, name })
    }

    /// Look up a workout type by name.
    pub fn get_workout_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<WorkoutType>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT id, name FROM workout_types WHERE name = ?1",
                [normalize_type_name(name)],
                |row| {
                    Ok(WorkoutType {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    /// Get all workout types, ordered by ID.
    pub fn list_workout_types(&self) -> Result<Vec<WorkoutType>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM workout_types ORDER BY id")
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(WorkoutType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    // ========== Location Operations ==========

    /// Insert a new location.
    pub fn insert_location(&self, location: &Location) -> Result<(), DatabaseError> {
        write_location(&self.conn, location)
    }

    /// Get a location by ID.
    pub fn get_location(&self, id: &Uuid) -> Result<Option<Location>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, location_type, city, state FROM locations WHERE id = ?1",
                [id.to_string()],
                map_location_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        row.map(LocationRow::into_location).transpose()
    }

    /// Get the first location with this exact name.
    pub fn get_location_by_name(&self, name: &str) -> Result<Option<Location>, DatabaseError> {
        query_location_by_name(&self.conn, name)
    }

    /// Get all locations, ordered by name.
    pub fn list_locations(&self) -> Result<Vec<Location>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, location_type, city, state FROM locations ORDER BY name")
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], map_location_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut locations = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            locations.push(row.into_location()?);
        }

        Ok(locations)
    }

    /// Delete a location. Workouts that referenced it keep no location.
    pub fn delete_location(&self, id: &Uuid) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM locations WHERE id = ?1", [id.to_string()])
            .map_err(classify_sqlite_error)?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Location {}", id)));
        }

        Ok(())
    }

    // ========== Gear Operations ==========

    /// Insert a new gear item for an existing user.
    pub fn insert_gear(&self, gear: &Gear) -> Result<(), DatabaseError> {
        let tx = self.begin()?;
        write_gear(&tx, gear, self.gear_policy)?;
        commit(tx)
    }

    /// Get a gear item by ID.
    pub fn get_gear(&self, id: &Uuid) -> Result<Option<Gear>, DatabaseError> {
        let sql = format!("{} WHERE id = ?1", GEAR_SELECT);
        let row = self
            .conn
            .query_row(&sql, [id.to_string()], map_gear_row)
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        row.map(GearRow::into_gear).transpose()
    }

    /// Get all gear owned by a user, oldest first.
    pub fn list_gear(&self, user_id: &Uuid) -> Result<Vec<Gear>, DatabaseError> {
        let sql = format!("{} WHERE user_id = ?1 ORDER BY created_at, id", GEAR_SELECT);
        self.query_gear(&sql, &user_id.to_string())
    }

    /// Get the gear linked to a workout.
    pub fn gear_for_workout(&self, workout_id: &Uuid) -> Result<Vec<Gear>, DatabaseError> {
        let sql = format!(
            "{} WHERE id IN (SELECT gear_id FROM workout_gear WHERE workout_id = ?1)
             ORDER BY created_at, id",
            GEAR_SELECT
        );
        self.query_gear(&sql, &workout_id.to_string())
    }

    fn query_gear(&self, sql: &str, key: &str) -> Result<Vec<Gear>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([key], map_gear_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut gear = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            gear.push(row.into_gear()?);
        }

        Ok(gear)
    }

    /// Update the descriptive fields of a gear item. The owner is fixed.
    pub fn update_gear(&self, gear: &Gear) -> Result<(), DatabaseError> {
        validation::validate_gear(gear, self.gear_policy).map_err(rejected)?;

        let tx = self.begin()?;

        let owner: Option<String> = tx
            .query_row(
                "SELECT user_id FROM gear WHERE id = ?1",
                [gear.id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        match owner {
            None => return Err(DatabaseError::NotFound(format!("Gear {}", gear.id))),
            Some(owner) if owner != gear.user_id.to_string() => {
                return Err(rejected(ConstraintError::immutable("user_id")));
            }
            Some(_) => {}
        }

        tx.execute(
            "UPDATE gear SET gear_type = ?2, brand = ?3, model = ?4, purchase_date = ?5,
             retired = ?6 WHERE id = ?1",
            params![
                gear.id.to_string(),
                gear.gear_type.as_str(),
                gear.brand,
                gear.model,
                gear.purchase_date.map(|d| d.format(DATE_FORMAT).to_string()),
                gear.retired as i32,
            ],
        )
        .map_err(classify_sqlite_error)?;

        commit(tx)
    }

    /// Mark a gear item as retired or active again.
    pub fn set_gear_retired(&self, id: &Uuid, retired: bool) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE gear SET retired = ?2 WHERE id = ?1",
                params![id.to_string(), retired as i32],
            )
            .map_err(classify_sqlite_error)?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Gear {}", id)));
        }

        Ok(())
    }

    /// Delete a gear item. Its workout links go with it; workouts that used it
    /// as primary gear keep no primary gear.
    pub fn delete_gear(&self, id: &Uuid) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM gear WHERE id = ?1", [id.to_string()])
            .map_err(classify_sqlite_error)?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Gear {}", id)));
        }

        Ok(())
    }

    // ========== Workout Operations ==========

    /// Insert a new workout.
    pub fn insert_workout(&self, workout: &Workout) -> Result<(), DatabaseError> {
        self.insert_workout_with_gear(workout, &[]).map(|_| ())
    }

    /// Insert a new workout together with its gear links.
    ///
    /// Every gear id must exist. If the workout or any link is rejected,
    /// nothing is stored. Returns the number of links created.
    pub fn insert_workout_with_gear(
        &self,
        workout: &Workout,
        gear_ids: &[Uuid],
    ) -> Result<usize, DatabaseError> {
        let tx = self.begin()?;
        let links = write_workout(&tx, workout, gear_ids)?;
        commit(tx)?;

        Ok(links)
    }

    /// Get a workout by ID.
    pub fn get_workout(&self, id: &Uuid) -> Result<Option<Workout>, DatabaseError> {
        let sql = format!("{} WHERE w.id = ?1", WORKOUT_SELECT);
        let row = self
            .conn
            .query_row(&sql, [id.to_string()], map_workout_row)
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        row.map(WorkoutRow::into_workout).transpose()
    }

    /// Update an existing workout. The owner and workout type cannot change.
    pub fn update_workout(&self, workout: &Workout) -> Result<(), DatabaseError> {
        validation::validate_workout(workout).map_err(rejected)?;

        let tx = self.begin()?;

        let stored: Option<(String, String)> = tx
            .query_row(
                "SELECT w.user_id, wt.name FROM workouts w
                 JOIN workout_types wt ON wt.id = w.workout_type_id WHERE w.id = ?1",
                [workout.id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        match stored {
            None => return Err(DatabaseError::NotFound(format!("Workout {}", workout.id))),
            Some((owner, _)) if owner != workout.user_id.to_string() => {
                return Err(rejected(ConstraintError::immutable("user_id")));
            }
            Some((_, name)) if name != normalize_type_name(&workout.workout_type) => {
                return Err(rejected(ConstraintError::immutable("workout_type")));
            }
            Some(_) => {}
        }

        ensure_references(&tx, workout)?;

        tx.execute(
            "UPDATE workouts SET location_id = ?2, gear_id = ?3, workout_date = ?4,
             start_time = ?5, duration_seconds = ?6, distance_m = ?7, elevation_gain_m = ?8,
             calories_kcal = ?9, avg_heart_rate_bpm = ?10, avg_cadence = ?11,
             avg_power_w = ?12, effort_level = ?13, notes = ?14 WHERE id = ?1",
            params![
                workout.id.to_string(),
                workout.location_id.map(|id| id.to_string()),
                workout.gear_id.map(|id| id.to_string()),
                workout.workout_date.format(DATE_FORMAT).to_string(),
                workout.start_time.map(|t| t.format(TIME_FORMAT).to_string()),
                workout.duration_seconds,
                workout.distance_m,
                workout.elevation_gain_m,
                workout.calories_kcal,
                workout.avg_heart_rate_bpm,
                workout.avg_cadence,
                workout.avg_power_w,
                workout.effort_level,
                workout.notes,
            ],
        )
        .map_err(classify_sqlite_error)?;

        commit(tx)?;
        Ok(())
    }

    /// Delete a workout by ID. Its gear links go with it.
    pub fn delete_workout(&self, id: &Uuid) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?1", [id.to_string()])
            .map_err(classify_sqlite_error)?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Workout {}", id)));
        }

        Ok(())
    }

    /// Get a user's workouts, newest first.
    pub fn list_workouts(
        &self,
        user_id: &Uuid,
        filter: &WorkoutFilter,
    ) -> Result<Vec<Workout>, DatabaseError> {
        query_workouts(&self.conn, user_id, filter)
    }

    /// Get a user's most recent workouts.
    pub fn recent_workouts(
        &self,
        user_id: &Uuid,
        limit: usize,
    ) -> Result<Vec<Workout>, DatabaseError> {
        query_workouts(&self.conn, user_id, &WorkoutFilter::default().limit(limit))
    }

    /// Count a user's workouts.
    pub fn count_workouts(&self, user_id: &Uuid) -> Result<usize, DatabaseError> {
        self.count(
            "SELECT COUNT(*) FROM workouts WHERE user_id = ?1",
            [user_id.to_string()],
        )
    }

    // ========== Workout Gear Operations ==========

    /// Link gear items to a workout.
    ///
    /// Repeated ids and existing links are ignored. Returns the number of new
    /// links.
    pub fn attach_gear(&self, workout_id: &Uuid, gear_ids: &[Uuid]) -> Result<usize, DatabaseError> {
        if gear_ids.is_empty() {
            return Ok(0);
        }

        let tx = self.begin()?;
        ensure_exists(&tx, "workouts", "workout", workout_id)?;
        let added = link_gear(&tx, workout_id, gear_ids)?;
        commit(tx)?;

        Ok(added)
    }

    /// Remove one gear link. Returns whether a link existed.
    pub fn detach_gear(&self, workout_id: &Uuid, gear_id: &Uuid) -> Result<bool, DatabaseError> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM workout_gear WHERE workout_id = ?1 AND gear_id = ?2",
                params![workout_id.to_string(), gear_id.to_string()],
            )
            .map_err(classify_sqlite_error)?;

        Ok(rows_affected > 0)
    }

    fn count<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<usize, DatabaseError> {
        let count: i64 = self
            .conn
            .query_row(sql, params, |row| row.get(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(count as usize)
    }
}

// Write steps over a bare connection. The `Database` methods run each one in
// its own transaction; the demo seeder runs many of them in a single one.

pub(crate) fn write_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    validation::validate_user(user).map_err(rejected)?;

    if row_exists(
        conn,
        "SELECT 1 FROM users WHERE username = ?1",
        [&user.username],
    )? {
        return Err(rejected(ConstraintError::uniqueness(
            "username",
            &user.username,
        )));
    }

    if row_exists(conn, "SELECT 1 FROM users WHERE email = ?1", [&user.email])? {
        return Err(rejected(ConstraintError::uniqueness("email", &user.email)));
    }

    conn.execute(
        "INSERT INTO users (id, username, email, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.username,
            user.email,
            user.password_hash,
            user.created_at.to_rfc3339(),
        ],
    )
    .map_err(classify_sqlite_error)?;

    tracing::debug!("Inserted user {}", user.username);
    Ok(())
}

pub(crate) fn query_user(
    conn: &Connection,
    clause: &str,
    key: &str,
) -> Result<Option<User>, DatabaseError> {
    let sql = format!(
        "SELECT id, username, email, password_hash, created_at FROM users {}",
        clause
    );

    let row = conn
        .query_row(&sql, [key], map_user_row)
        .optional()
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    row.map(UserRow::into_user).transpose()
}

pub(crate) fn delete_user_data(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<ClearedData, DatabaseError> {
    if !row_exists(
        conn,
        "SELECT 1 FROM users WHERE id = ?1",
        [user_id.to_string()],
    )? {
        return Err(DatabaseError::NotFound(format!("User {}", user_id)));
    }

    let workouts = conn
        .execute(
            "DELETE FROM workouts WHERE user_id = ?1",
            params![user_id.to_string()],
        )
        .map_err(classify_sqlite_error)?;

    let gear = conn
        .execute(
            "DELETE FROM gear WHERE user_id = ?1",
            params![user_id.to_string()],
        )
        .map_err(classify_sqlite_error)?;

    tracing::info!(
        "Cleared {} workouts and {} gear items for user {}",
        workouts,
        gear,
        user_id
    );

    Ok(ClearedData { workouts, gear })
}

pub(crate) fn write_location(conn: &Connection, location: &Location) -> Result<(), DatabaseError> {
    validation::validate_location(location).map_err(rejected)?;

    conn.execute(
        "INSERT INTO locations (id, name, location_type, city, state)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            location.id.to_string(),
            location.name,
            location.location_type.as_str(),
            location.city,
            location.state,
        ],
    )
    .map_err(classify_sqlite_error)?;

    tracing::debug!("Inserted location {}", location.name);
    Ok(())
}

pub(crate) fn query_location_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<Location>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, location_type, city, state FROM locations
             WHERE name = ?1 ORDER BY id LIMIT 1",
            [name],
            map_location_row,
        )
        .optional()
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    row.map(LocationRow::into_location).transpose()
}

pub(crate) fn write_gear(
    conn: &Connection,
    gear: &Gear,
    policy: GearPolicy,
) -> Result<(), DatabaseError> {
    validation::validate_gear(gear, policy).map_err(rejected)?;
    ensure_exists(conn, "users", "user", &gear.user_id)?;

    conn.execute(
        "INSERT INTO gear (id, user_id, gear_type, brand, model, purchase_date, retired,
         created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            gear.id.to_string(),
            gear.user_id.to_string(),
            gear.gear_type.as_str(),
            gear.brand,
            gear.model,
            gear.purchase_date.map(|d| d.format(DATE_FORMAT).to_string()),
            gear.retired as i32,
            gear.created_at.to_rfc3339(),
        ],
    )
    .map_err(classify_sqlite_error)?;

    tracing::debug!("Inserted gear {} ({})", gear.label(), gear.id);
    Ok(())
}

/// Insert a workout and link its gear. Returns the number of new links.
pub(crate) fn write_workout(
    conn: &Connection,
    workout: &Workout,
    gear_ids: &[Uuid],
) -> Result<usize, DatabaseError> {
    validation::validate_workout(workout).map_err(rejected)?;

    ensure_exists(conn, "users", "user", &workout.user_id)?;
    let workout_type_id = resolve_workout_type(conn, &workout.workout_type)?;
    ensure_references(conn, workout)?;

    conn.execute(
        "INSERT INTO workouts (id, user_id, workout_type_id, location_id, gear_id,
         workout_date, start_time, duration_seconds, distance_m, elevation_gain_m,
         calories_kcal, avg_heart_rate_bpm, avg_cadence, avg_power_w, effort_level,
         notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            workout.id.to_string(),
            workout.user_id.to_string(),
            workout_type_id,
            workout.location_id.map(|id| id.to_string()),
            workout.gear_id.map(|id| id.to_string()),
            workout.workout_date.format(DATE_FORMAT).to_string(),
            workout.start_time.map(|t| t.format(TIME_FORMAT).to_string()),
            workout.duration_seconds,
            workout.distance_m,
            workout.elevation_gain_m,
            workout.calories_kcal,
            workout.avg_heart_rate_bpm,
            workout.avg_cadence,
            workout.avg_power_w,
            workout.effort_level,
            workout.notes,
            workout.created_at.to_rfc3339(),
        ],
    )
    .map_err(classify_sqlite_error)?;

    tracing::debug!(
        "Inserted {} workout {} on {}",
        workout.workout_type,
        workout.id,
        workout.workout_date
    );

    link_gear(conn, &workout.id, gear_ids)
}

/// Link existing gear to an existing workout, skipping repeats.
pub(crate) fn link_gear(
    conn: &Connection,
    workout_id: &Uuid,
    gear_ids: &[Uuid],
) -> Result<usize, DatabaseError> {
    let mut added = 0;
    for gear_id in gear_ids.iter().collect::<BTreeSet<_>>() {
        ensure_exists(conn, "gear", "gear", gear_id)?;
        added += conn
            .execute(
                "INSERT INTO workout_gear (workout_id, gear_id) VALUES (?1, ?2)
                 ON CONFLICT (workout_id, gear_id) DO NOTHING",
                params![workout_id.to_string(), gear_id.to_string()],
            )
            .map_err(classify_sqlite_error)?;
    }

    if added > 0 {
        tracing::debug!("Attached {} gear items to workout {}", added, workout_id);
    }

    Ok(added)
}

fn commit(tx: Transaction<'_>) -> Result<(), DatabaseError> {
    tx.commit()
        .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
}

fn rejected(err: ConstraintError) -> DatabaseError {
    tracing::warn!("Rejected write: {}", err);
    DatabaseError::Constraint(err)
}

fn row_exists<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<bool, DatabaseError> {
    conn.query_row(sql, params, |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
}

/// Fail with a referential violation unless `table` has a row with this id.
fn ensure_exists(
    conn: &Connection,
    table: &str,
    entity: &str,
    id: &Uuid,
) -> Result<(), DatabaseError> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table);
    if row_exists(conn, &sql, [id.to_string()])? {
        Ok(())
    } else {
        Err(rejected(ConstraintError::referential(entity, id)))
    }
}

fn ensure_references(conn: &Connection, workout: &Workout) -> Result<(), DatabaseError> {
    if let Some(location_id) = &workout.location_id {
        ensure_exists(conn, "locations", "location", location_id)?;
    }
    if let Some(gear_id) = &workout.gear_id {
        ensure_exists(conn, "gear", "gear", gear_id)?;
    }
    Ok(())
}

fn resolve_workout_type(conn: &Connection, name: &str) -> Result<i64, DatabaseError> {
    let name = normalize_type_name(name);
    conn.query_row(
        "SELECT id FROM workout_types WHERE name = ?1",
        [&name],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
    .ok_or_else(|| rejected(ConstraintError::referential("workout_type", name)))
}

/// Query a user's workouts with optional filters, newest first.
pub(crate) fn query_workouts(
    conn: &Connection,
    user_id: &Uuid,
    filter: &WorkoutFilter,
) -> Result<Vec<Workout>, DatabaseError> {
    let mut sql = format!("{} WHERE w.user_id = ?", WORKOUT_SELECT);
    let mut values = vec![Value::Text(user_id.to_string())];

    if let Some(workout_type) = &filter.workout_type {
        sql.push_str(" AND wt.name = ?");
        values.push(Value::Text(normalize_type_name(workout_type)));
    }
    if let Some(from) = filter.from {
        sql.push_str(" AND w.workout_date >= ?");
        values.push(Value::Text(from.format(DATE_FORMAT).to_string()));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND w.workout_date <= ?");
        values.push(Value::Text(to.format(DATE_FORMAT).to_string()));
    }

    sql.push_str(NEWEST_FIRST);

    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(limit as i64));
    }

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    let rows = stmt
        .query_map(params_from_iter(values.iter()), map_workout_row)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    let mut workouts = Vec::new();
    for row in rows {
        let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        workouts.push(row.into_workout()?);
    }

    Ok(workouts)
}

/// Map a SQLite error to a classified constraint error where possible.
pub(crate) fn classify_sqlite_error(err: rusqlite::Error) -> DatabaseError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            let message = message.as_deref().unwrap_or_default();
            if let Some(constraint) = constraint_from_sqlite(failure.extended_code, message) {
                return rejected(constraint);
            }
        }
    }

    DatabaseError::QueryFailed(err.to_string())
}

fn constraint_from_sqlite(extended_code: i32, message: &str) -> Option<ConstraintError> {
    // Messages look like "UNIQUE constraint failed: users.username"
    let detail = message
        .split_once(": ")
        .map(|(_, detail)| detail.trim())
        .unwrap_or(message)
        .to_string();

    match extended_code {
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            Some(ConstraintError::Uniqueness {
                field: detail,
                value: None,
            })
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(ConstraintError::Referential {
            entity: "referenced record".to_string(),
            key: None,
        }),
        ffi::SQLITE_CONSTRAINT_NOTNULL => Some(ConstraintError::Required { field: detail }),
        ffi::SQLITE_CONSTRAINT_CHECK => {
            if let Some(field) = detail.strip_suffix("_category") {
                Some(ConstraintError::Category {
                    field: field.to_string(),
                    value: None,
                })
            } else {
                let field = detail.strip_suffix("_range").unwrap_or(&detail);
                Some(ConstraintError::Range {
                    field: field.to_string(),
                    value: None,
                    bound: "declared range".to_string(),
                })
            }
        }
        _ => None,
    }
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value)
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid {} UUID: {}", what, e)))
}

fn parse_timestamp(value: &str, what: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid {} date: {}", what, e)))
}

fn parse_date(value: &str, what: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid {}: {}", what, e)))
}

fn parse_time(value: &str) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid start time: {}", e)))
}

/// Intermediate struct for reading user rows from database.
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    created_at: String,
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl UserRow {
    fn into_user(self) -> Result<User, DatabaseError> {
        Ok(User {
            id: parse_uuid(&self.id, "user")?,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            created_at: parse_timestamp(&self.created_at, "created")?,
        })
    }
}

/// Intermediate struct for reading location rows from database.
struct LocationRow {
    id: String,
    name: String,
    location_type: String,
    city: Option<String>,
    state: Option<String>,
}

fn map_location_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LocationRow> {
    Ok(LocationRow {
        id: row.get(0)?,
        name: row.get(1)?,
        location_type: row.get(2)?,
        city: row.get(3)?,
        state: row.get(4)?,
    })
}

impl LocationRow {
    fn into_location(self) -> Result<Location, DatabaseError> {
        let location_type: LocationType = self.location_type.parse().map_err(|e| {
            DatabaseError::DeserializationError(format!("Invalid location type: {}", e))
        })?;

        Ok(Location {
            id: parse_uuid(&self.id, "location")?,
            name: self.name,
            location_type,
            city: self.city,
            state: self.state,
        })
    }
}

/// Intermediate struct for reading gear rows from database.
struct GearRow {
    id: String,
    user_id: String,
    gear_type: String,
    brand: Option<String>,
    model: Option<String>,
    purchase_date: Option<String>,
    retired: i32,
    created_at: String,
}

fn map_gear_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GearRow> {
    Ok(GearRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        gear_type: row.get(2)?,
        brand: row.get(3)?,
        model: row.get(4)?,
        purchase_date: row.get(5)?,
        retired: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl GearRow {
    fn into_gear(self) -> Result<Gear, DatabaseError> {
        let gear_type: GearType = self.gear_type.parse().map_err(|e| {
            DatabaseError::DeserializationError(format!("Invalid gear type: {}", e))
        })?;

        let purchase_date = self
            .purchase_date
            .map(|d| parse_date(&d, "purchase date"))
            .transpose()?;

        Ok(Gear {
            id: parse_uuid(&self.id, "gear")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            gear_type,
            brand: self.brand,
            model: self.model,
            purchase_date,
            retired: self.retired != 0,
            created_at: parse_timestamp(&self.created_at, "created")?,
        })
    }
}

/// Intermediate struct for reading workout rows from database.
struct WorkoutRow {
    id: String,
    user_id: String,
    workout_type: String,
    location_id: Option<String>,
    gear_id: Option<String>,
    workout_date: String,
    start_time: Option<String>,
    duration_seconds: i64,
    distance_m: Option<f64>,
    elevation_gain_m: Option<f64>,
    calories_kcal: Option<i64>,
    avg_heart_rate_bpm: Option<i64>,
    avg_cadence: Option<f64>,
    avg_power_w: Option<f64>,
    effort_level: i64,
    notes: Option<String>,
    created_at: String,
}

fn map_workout_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkoutRow> {
    Ok(WorkoutRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        workout_type: row.get(2)?,
        location_id: row.get(3)?,
        gear_id: row.get(4)?,
        workout_date: row.get(5)?,
        start_time: row.get(6)?,
        duration_seconds: row.get(7)?,
        distance_m: row.get(8)?,
        elevation_gain_m: row.get(9)?,
        calories_kcal: row.get(10)?,
        avg_heart_rate_bpm: row.get(11)?,
        avg_cadence: row.get(12)?,
        avg_power_w: row.get(13)?,
        effort_level: row.get(14)?,
        notes: row.get(15)?,
        created_at: row.get(16)?,
    })
}

impl WorkoutRow {
    fn into_workout(self) -> Result<Workout, DatabaseError> {
        Ok(Workout {
            id: parse_uuid(&self.id, "workout")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            workout_type: self.workout_type,
            location_id: self
                .location_id
                .map(|id| parse_uuid(&id, "location"))
                .transpose()?,
            gear_id: self.gear_id.map(|id| parse_uuid(&id, "gear")).transpose()?,
            workout_date: parse_date(&self.workout_date, "workout date")?,
            start_time: self.start_time.as_deref().map(parse_time).transpose()?,
            duration_seconds: self.duration_seconds,
            distance_m: self.distance_m,
            elevation_gain_m: self.elevation_gain_m,
            calories_kcal: self.calories_kcal,
            avg_heart_rate_bpm: self.avg_heart_rate_bpm,
            avg_cadence: self.avg_cadence,
            avg_power_w: self.avg_power_w,
            effort_level: self.effort_level,
            notes: self.notes,
            created_at: parse_timestamp(&self.created_at, "created")?,
        })
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl DatabaseError {
    /// The classified constraint behind this error, if any.
    pub fn constraint(&self) -> Option<&ConstraintError> {
        match self {
            DatabaseError::Constraint(c) => Some(c),
            _ => None,
        }
    }
}
