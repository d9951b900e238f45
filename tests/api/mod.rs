//! API integration tests

mod health_test;
mod stamp_test;
mod upgrade_test;
