//! Library-level integration tests.

pub mod pipeline_test;
pub mod snowflake_test;
