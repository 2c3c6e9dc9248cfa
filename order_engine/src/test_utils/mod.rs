//! Helpers for tests that run against a real SQLite database. Enabled with the `test_utils` feature.
pub mod fake_gateway;
pub mod prepare_env;
pub mod seed;
