//! Snowflake Cortex completion client.
//!
//! Implements the CompletionClient trait by running
//! `SELECT SNOWFLAKE.CORTEX.COMPLETE(?, ?)` on the warehouse, with the model
//! and prompt passed as bound parameters.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::db::{Statement, Value, WarehouseClient};
use crate::error::{NovaiError, Result};
use crate::llm::CompletionClient;

/// SQL used for every completion request.
const COMPLETE_SQL: &str = "SELECT SNOWFLAKE.CORTEX.COMPLETE(?, ?)";

/// Completion client backed by the Cortex `COMPLETE` function.
#[derive(Clone)]
pub struct CortexClient {
    warehouse: Arc<dyn WarehouseClient>,
    model: String,
}

impl CortexClient {
    /// Creates a client running completions on `warehouse` with `model`.
    pub fn new(warehouse: Arc<dyn WarehouseClient>, model: impl Into<String>) -> Self {
        Self {
            warehouse,
            model: model.into(),
        }
    }

    fn statement(&self, prompt: &str) -> Statement {
        Statement::new(COMPLETE_SQL)
            .bind_text(&self.model)
            .bind_text(prompt)
    }
}

impl std::fmt::Debug for CortexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CortexClient")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionClient for CortexClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        debug!(model = %self.model, prompt_len = prompt.len(), "Requesting completion");

        let result = self
            .warehouse
            .execute(&self.statement(prompt))
            .await
            .map_err(|e| NovaiError::completion(e.to_string()))?;

        let text = match result.first_value() {
            Some(Value::Null) => String::new(),
            Some(value) => value.to_display_string(),
            None => return Err(NovaiError::completion("Completion returned no rows")),
        };

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis(),
            response_len = text.len(),
            "Received completion"
        );
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
