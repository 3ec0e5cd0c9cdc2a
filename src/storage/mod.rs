//! Storage module for database, reports and configuration.

pub mod config;
pub mod database;
pub mod report_store;
pub mod schema;
pub mod seed;

pub use config::{AppConfig, ConfigError};
pub use database::{ClearedData, Database, DatabaseError, WorkoutFilter};
pub use report_store::ReportStore;
pub use seed::{seed_demo, SeedError, SeedSummary};
