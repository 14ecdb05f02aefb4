//! Mock completion clients for testing.
//!
//! Provides deterministic responses based on prompt patterns.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{NovaiError, Result};
use crate::llm::CompletionClient;

/// Marker of the generation prompt.
const GENERATION_MARKER: &str = "Generate an SQL query";

/// Marker of the summary prompt.
const SUMMARY_MARKER: &str = "Provide a concise summary";

/// Mock completion client that returns canned responses based on prompt patterns.
///
/// Without custom responses it answers generation prompts with a revenue
/// ranking query (honoring "top N" in the user request) and summary prompts
/// with a sentence naming the first record.
#[derive(Debug, Default)]
pub struct MockCompletionClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// Every prompt received, in order.
    prompts: Mutex<Vec<String>>,
}

impl MockCompletionClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the prompt contains `pattern` (case-insensitive), the mock returns `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Returns every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn mock_response(&self, prompt: &str) -> String {
        let prompt_lower = prompt.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if prompt_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if prompt.starts_with(GENERATION_MARKER) {
            let limit = user_request(prompt).and_then(top_n).unwrap_or(10);
            return format!(
                "SELECT PRODUCT, SUM(REVENUE) AS REVENUE FROM NORTHWINDS.REGRESSION_SANDBOX \
                 GROUP BY PRODUCT ORDER BY REVENUE DESC LIMIT {limit};"
            );
        }

        if prompt.starts_with(SUMMARY_MARKER) {
            return summarize_records(prompt);
        }

        String::new()
    }
}

/// Extracts the user request line from a generation prompt.
fn user_request(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("- User Request: "))
}

/// Finds `N` in "top N".
fn top_n(text: &str) -> Option<usize> {
    let lower = text.to_lowercase();
    let words = lower.split_whitespace().collect::<Vec<_>>();
    words
        .windows(2)
        .find(|pair| pair[0] == "top")
        .and_then(|pair| pair[1].parse().ok())
}

fn summarize_records(prompt: &str) -> String {
    let records = prompt
        .split_once('\n')
        .and_then(|(_, json)| serde_json::from_str::<Vec<serde_json::Value>>(json).ok())
        .unwrap_or_default();

    let leader = records.first().and_then(|record| {
        record
            .as_object()?
            .values()
            .find_map(|v| v.as_str().map(String::from))
    });

    match leader {
        Some(name) => format!(
            "{name} leads the results.\nThe data covers {} rows in total.",
            records.len()
        ),
        None => format!("The data covers {} rows.", records.len()),
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        Ok(self.mock_response(prompt))
    }

    fn model(&self) -> &str {
        "mock"
    }
}

/// A completion client that fails every request, optionally only for prompts
/// containing a pattern (other prompts are delegated to a default mock).
#[derive(Debug, Default)]
pub struct FailingCompletionClient {
    message: String,
    only_matching: Option<String>,
    fallback: MockCompletionClient,
}

impl FailingCompletionClient {
    /// Creates a client that fails every request with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            only_matching: None,
            fallback: MockCompletionClient::new(),
        }
    }

    /// Restricts failures to prompts containing `pattern`.
    pub fn only_for(mut self, pattern: impl Into<String>) -> Self {
        self.only_matching = Some(pattern.into());
        self
    }

    /// Fails summary prompts only.
    pub fn for_summaries(message: impl Into<String>) -> Self {
        Self::new(message).only_for(SUMMARY_MARKER)
    }
}

#[async_trait]
impl CompletionClient for FailingCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match &self.only_matching {
            Some(pattern) if !prompt.contains(pattern.as_str()) => {
                self.fallback.complete(prompt).await
            }
            _ => Err(NovaiError::completion(self.message.clone())),
        }
    }

    fn model(&self) -> &str {
        "failing"
    }
}
