//! Query sanitization and execution for NovAi.
//!
//! Isolates the post-processing of generated SQL and its execution from the
//! chat pipeline.

pub mod executor;
pub mod sanitize;

pub use executor::{ExecutionResult, QueryExecutor};
pub use sanitize::sanitize_sql;
