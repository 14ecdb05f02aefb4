//! Mock warehouse clients for testing.
//!
//! Provides an in-memory sales table for `--mock` runs and tests, plus a
//! client that fails every statement.

use super::{ColumnDescriptor, ColumnInfo, QueryResult, Statement, Value, WarehouseClient};
use crate::error::{NovaiError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Canned reply for statements containing a pattern.
#[derive(Debug, Clone)]
enum Reply {
    Rows(QueryResult),
    Error(String),
}

/// A mock warehouse client backed by a small product revenue table.
///
/// Metadata statements return the table's columns, `SELECT`/`WITH` statements
/// return its rows (honoring a trailing `LIMIT n`), and anything else returns
/// an empty result. Custom replies registered with [`with_result`] or
/// [`with_error`] take precedence.
///
/// [`with_result`]: MockWarehouseClient::with_result
/// [`with_error`]: MockWarehouseClient::with_error
#[derive(Debug)]
pub struct MockWarehouseClient {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<Value>>,
    replies: Vec<(String, Reply)>,
    executed: Mutex<Vec<Statement>>,
    closed: AtomicBool,
}

impl MockWarehouseClient {
    /// Creates a mock client with the sample product revenue table.
    pub fn new() -> Self {
        let rows = [
            ("Côte de Blaye", 141_396.74),
            ("Thüringer Rostbratwurst", 80_368.67),
            ("Raclette Courdavault", 71_155.70),
            ("Tarte au sucre", 47_234.97),
            ("Camembert Pierrot", 46_825.48),
            ("Gnocchi di nonna Alice", 42_593.06),
            ("Manjimup Dried Apples", 41_819.65),
            ("Alice Mutton", 32_698.38),
        ]
        .into_iter()
        .map(|(product, revenue)| vec![Value::from(product), Value::Float(revenue)])
        .collect();

        Self {
            columns: vec![
                ColumnDescriptor::new("PRODUCT", "TEXT"),
                ColumnDescriptor::new("REVENUE", "NUMBER"),
            ],
            rows,
            replies: Vec::new(),
            executed: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns `result` for statements whose SQL contains `pattern` (case-insensitive).
    pub fn with_result(mut self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.replies.push((pattern.into(), Reply::Rows(result)));
        self
    }

    /// Fails statements whose SQL contains `pattern` (case-insensitive).
    pub fn with_error(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.replies.push((pattern.into(), Reply::Error(message.into())));
        self
    }

    /// Returns every statement executed so far, in order.
    pub fn executed(&self) -> Vec<Statement> {
        self.executed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn table_result(&self, sql_upper: &str) -> QueryResult {
        let columns = self
            .columns
            .iter()
            .map(|c| ColumnInfo::new(&c.name, &c.data_type))
            .collect();
        let limit = parse_limit(sql_upper).unwrap_or(self.rows.len());
        let rows = self.rows.iter().take(limit).cloned().collect();
        QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1))
    }

    fn metadata_result(&self) -> QueryResult {
        QueryResult::with_data(
            vec![
                ColumnInfo::new("COLUMN_NAME", "TEXT"),
                ColumnInfo::new("DATA_TYPE", "TEXT"),
            ],
            self.columns
                .iter()
                .map(|c| vec![Value::from(c.name.as_str()), Value::from(c.data_type.as_str())])
                .collect(),
        )
    }
}

impl Default for MockWarehouseClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts `n` from a trailing `LIMIT n` clause.
fn parse_limit(sql_upper: &str) -> Option<usize> {
    let (_, tail) = sql_upper.rsplit_once("LIMIT")?;
    tail.split_whitespace().next()?.parse().ok()
}

#[async_trait]
impl WarehouseClient for MockWarehouseClient {
    async fn execute(&self, statement: &Statement) -> Result<QueryResult> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(NovaiError::connection("Warehouse client is closed"));
        }

        self.executed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(statement.clone());

        let sql_upper = statement.sql.to_uppercase();

        for (pattern, reply) in &self.replies {
            if sql_upper.contains(&pattern.to_uppercase()) {
                return match reply {
                    Reply::Rows(result) => Ok(result.clone()),
                    Reply::Error(message) => Err(NovaiError::query(message.clone())),
                };
            }
        }

        if sql_upper.contains("INFORMATION_SCHEMA.COLUMNS") {
            return Ok(self.metadata_result());
        }

        let trimmed = sql_upper.trim_start();
        if trimmed.starts_with("SELECT") || trimmed.starts_with("WITH") {
            Ok(self.table_result(&sql_upper))
        } else {
            Ok(QueryResult::new())
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A warehouse client whose every statement fails.
#[derive(Debug, Clone)]
pub struct FailingWarehouseClient {
    message: String,
}

impl FailingWarehouseClient {
    /// Creates a client that fails with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl WarehouseClient for FailingWarehouseClient {
    async fn execute(&self, _statement: &Statement) -> Result<QueryResult> {
        Err(NovaiError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
