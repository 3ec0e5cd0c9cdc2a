//! Integration test modules.

mod config_test;
mod reports_test;
mod store_test;
