//! Warehouse abstraction layer for NovAi.
//!
//! Provides a trait-based interface for running statements, so the Snowflake
//! SQL API client and in-memory test doubles can be used interchangeably.

mod mock;
mod schema;
mod snowflake;
mod types;

pub use mock::{FailingWarehouseClient, MockWarehouseClient};
pub use schema::{format_columns, ColumnDescriptor, TargetTable};
pub use snowflake::SnowflakeClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::WarehouseConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A parameter bound to a `?` placeholder of a statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "UPPERCASE")]
pub enum Binding {
    /// Text parameter.
    Text(String),
}

/// A SQL statement together with its positional bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text, with `?` placeholders for bindings.
    pub sql: String,
    /// Bindings in placeholder order.
    pub bindings: Vec<Binding>,
}

impl Statement {
    /// Creates a statement without bindings.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }

    /// Binds a text value to the next placeholder.
    pub fn bind_text(mut self, value: impl Into<String>) -> Self {
        self.bindings.push(Binding::Text(value.into()));
        self
    }
}

/// Creates the Snowflake warehouse client for the given configuration.
///
/// The client is created once per process and shared by every component
/// that needs the warehouse.
pub fn connect(config: &WarehouseConfig, target: &TargetTable) -> Result<Arc<dyn WarehouseClient>> {
    let client = SnowflakeClient::new(config, target)?;
    Ok(Arc::new(client))
}

/// Trait defining the interface for warehouse clients.
///
/// All operations are async and return Results with NovaiError.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Executes a statement and returns its result set.
    async fn execute(&self, statement: &Statement) -> Result<QueryResult>;

    /// Releases the client. Later calls fail with a connection error.
    async fn close(&self) -> Result<()>;

    /// Executes SQL text without bindings.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.execute(&Statement::new(sql)).await
    }

    /// Discovers the column names and types of the target table.
    async fn introspect_columns(&self, target: &TargetTable) -> Result<Vec<ColumnDescriptor>> {
        let statement = target.columns_statement();
        debug!(table = %target.qualified_name(), "Introspecting target table");
        let result = self.execute(&statement).await?;
        Ok(schema::descriptors_from_result(&result))
    }
}
