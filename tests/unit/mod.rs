//! Unit test modules.

mod conversions_test;
mod sport_view_test;
mod validation_test;
mod volume_test;
