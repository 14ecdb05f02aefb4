//! The per-message chat pipeline.
//!
//! One user message runs introspection, prompt building, SQL generation,
//! sanitization, execution and summarization in order. Every external call
//! returns a `Result`; failures become [`Notice`]s on the [`TurnOutcome`]
//! instead of aborting the chat.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::db::{format_columns, QueryResult, TargetTable, WarehouseClient};
use crate::llm::{build_query_prompt, CompletionClient, QueryRequest, Summarizer};
use crate::query::{sanitize_sql, QueryExecutor};

/// Warning shown when the model produced no SQL.
pub const NO_SQL_WARNING: &str = "No data found for your query.";

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message to show the user alongside the turn's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Everything one chat turn produced.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// The user's message.
    pub user_text: String,
    /// Target table columns as given to the model.
    pub columns: Option<String>,
    /// The generation prompt.
    pub prompt: Option<String>,
    /// Sanitized SQL, if the model produced any.
    pub sql: Option<String>,
    /// Query result; empty when execution failed or was skipped.
    pub result: QueryResult,
    /// Prose summary of the result.
    pub summary: Option<String>,
    /// Notices in the order they were raised.
    pub notices: Vec<Notice>,
}

impl TurnOutcome {
    fn new(user_text: &str) -> Self {
        Self {
            user_text: user_text.to_string(),
            columns: None,
            prompt: None,
            sql: None,
            result: QueryResult::new(),
            summary: None,
            notices: Vec::new(),
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Error => tracing::warn!(%message, "Chat turn error"),
            _ => tracing::debug!(%message, "Chat turn notice"),
        }
        self.notices.push(Notice { level, message });
    }

    /// Returns true if any error notice was raised.
    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Error)
    }
}

/// Runs chat turns against one target table.
///
/// The warehouse and completion clients are injected and shared; the pipeline
/// keeps no state between turns.
pub struct ChatPipeline {
    warehouse: Arc<dyn WarehouseClient>,
    completion: Arc<dyn CompletionClient>,
    target: TargetTable,
    summarize: bool,
    additional_context: Option<String>,
}

impl ChatPipeline {
    /// Creates a pipeline with summaries enabled.
    pub fn new(
        warehouse: Arc<dyn WarehouseClient>,
        completion: Arc<dyn CompletionClient>,
        target: TargetTable,
    ) -> Self {
        Self {
            warehouse,
            completion,
            target,
            summarize: true,
            additional_context: None,
        }
    }

    /// Enables or disables result summaries.
    pub fn with_summaries(mut self, enabled: bool) -> Self {
        self.summarize = enabled;
        self
    }

    /// Sets extra context included in every generation prompt.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.additional_context = Some(context.into());
        self
    }

    /// Returns the target table.
    pub fn target(&self) -> &TargetTable {
        &self.target
    }

    /// Processes one user message.
    pub async fn run_turn(&self, user_text: &str) -> TurnOutcome {
        let start = Instant::now();
        tracing::info!(input_len = user_text.len(), "Starting chat turn");

        let mut outcome = TurnOutcome::new(user_text);

        let columns = match self.warehouse.introspect_columns(&self.target).await {
            Ok(columns) => columns,
            Err(e) => {
                outcome.notify(NoticeLevel::Error, format!("Failed to introspect table: {e}"));
                return outcome;
            }
        };
        outcome.columns = Some(format_columns(&columns));

        let mut request = QueryRequest::new(&self.target, &columns, user_text);
        if let Some(context) = self.additional_context.as_deref() {
            request = request.with_context(context);
        }
        let prompt = build_query_prompt(&request);

        let generated = self.completion.complete(&prompt).await;
        outcome.prompt = Some(prompt);
        let generated = match generated {
            Ok(text) => text,
            Err(e) => {
                outcome.notify(NoticeLevel::Error, format!("Failed to generate query: {e}"));
                return outcome;
            }
        };

        let Some(sql) = sanitize_sql(&generated) else {
            outcome.notify(NoticeLevel::Warning, NO_SQL_WARNING);
            return outcome;
        };
        tracing::debug!(sql_len = sql.len(), "Generated SQL");

        let execution = QueryExecutor::new(self.warehouse.as_ref())
            .execute(&sql)
            .await;
        outcome.sql = Some(sql);
        if let Some(message) = execution.error_message() {
            outcome.notify(NoticeLevel::Error, message);
        }
        outcome.result = execution.into_result();

        if let Some(warning) = outcome.result.truncation_warning() {
            outcome.notify(NoticeLevel::Warning, warning);
        }

        if outcome.result.is_empty() {
            if !outcome.has_errors() {
                outcome.notify(NoticeLevel::Info, "The query returned no rows.");
            }
        } else if self.summarize {
            match Summarizer::new(self.completion.as_ref())
                .summarize(&outcome.result)
                .await
            {
                Ok(summary) if !summary.trim().is_empty() => outcome.summary = Some(summary),
                Ok(_) => {}
                Err(e) => {
                    outcome.notify(NoticeLevel::Error, format!("Failed to generate summary: {e}"))
                }
            }
        }

        tracing::info!(
            total_duration_ms = start.elapsed().as_millis(),
            row_count = outcome.result.row_count,
            has_summary = outcome.summary.is_some(),
            errors = outcome.has_errors(),
            "Chat turn complete"
        );
        outcome
    }
}
