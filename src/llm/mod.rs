//! Completion service integration for NovAi.
//!
//! Provides the completion trait, the Cortex implementation that calls
//! `SNOWFLAKE.CORTEX.COMPLETE` through the warehouse, prompt construction,
//! and the result summarizer.

pub mod cortex;
pub mod mock;
pub mod prompt;
pub mod summary;

pub use cortex::CortexClient;
pub use mock::{FailingCompletionClient, MockCompletionClient};
pub use prompt::{build_query_prompt, build_summary_prompt, QueryRequest, QUERY_RULES};
pub use summary::Summarizer;

use async_trait::async_trait;

use crate::error::Result;

/// Trait for clients that turn one prompt into one completion.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends `prompt` and returns the completion text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging and display.
    fn model(&self) -> &str;
}
