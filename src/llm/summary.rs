//! Prose summaries of query results.

use std::time::Instant;

use crate::db::QueryResult;
use crate::error::Result;
use crate::llm::{build_summary_prompt, CompletionClient};

/// Asks the completion service to summarize a result set.
pub struct Summarizer<'a> {
    client: &'a dyn CompletionClient,
}

impl<'a> Summarizer<'a> {
    /// Creates a summarizer using `client`.
    pub fn new(client: &'a dyn CompletionClient) -> Self {
        Self { client }
    }

    /// Serializes every row of `result` into the summary prompt and returns
    /// the completion.
    pub async fn summarize(&self, result: &QueryResult) -> Result<String> {
        let start = Instant::now();
        let prompt = build_summary_prompt(result);

        tracing::debug!(
            row_count = result.rows.len(),
            prompt_len = prompt.len(),
            "Requesting summary"
        );

        let summary = self.client.complete(&prompt).await?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            summary_len = summary.len(),
            "Summary generated"
        );
        Ok(summary)
    }
}
