//! Integration tests for NovAi.
//!
//! Pipeline and binary tests run against the in-memory warehouse. Live
//! Snowflake tests need SNOWFLAKE_ACCOUNT and SNOWFLAKE_TOKEN and are skipped
//! otherwise.
//!
//! Run with: `cargo test --test integration_tests`

mod cli;
mod integration;
