//! Query execution for generated SQL.
//!
//! Execution failures never propagate: the caller gets an empty result set
//! and a message to show instead.

use std::time::Instant;

use crate::db::{QueryResult, WarehouseClient};
use crate::error::NovaiError;

/// Runs sanitized SQL against the warehouse.
pub struct QueryExecutor<'a> {
    db: &'a dyn WarehouseClient,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(db: &'a dyn WarehouseClient) -> Self {
        Self { db }
    }

    /// Executes `sql`, capturing any failure in the returned value.
    pub async fn execute(&self, sql: &str) -> ExecutionResult {
        let start = Instant::now();
        let result = self.db.execute_query(sql).await;
        let execution_time = start.elapsed();

        match result {
            Ok(result) => {
                tracing::info!(
                    row_count = result.row_count,
                    duration_ms = execution_time.as_millis(),
                    "Query executed"
                );
                ExecutionResult::Success(result)
            }
            Err(e) => {
                tracing::warn!(
                    duration_ms = execution_time.as_millis(),
                    error = %e,
                    "Query failed"
                );
                ExecutionResult::Error(e)
            }
        }
    }
}

/// Result of executing a query.
#[derive(Debug)]
pub enum ExecutionResult {
    /// Query executed successfully.
    Success(QueryResult),
    /// Query execution failed.
    Error(NovaiError),
}

impl ExecutionResult {
    /// Returns the user-facing failure message, if execution failed.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::Error(e) => Some(format!("Failed to execute query: {e}")),
        }
    }

    /// Returns the result set, or an empty one if execution failed.
    pub fn into_result(self) -> QueryResult {
        match self {
            Self::Success(result) => result,
            Self::Error(_) => QueryResult::new(),
        }
    }
}
