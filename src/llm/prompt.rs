//! Prompt construction for completion requests.
//!
//! Builds the SQL generation prompt for one chat turn and the prompt asking
//! for a prose summary of a result set.

use crate::db::{format_columns, ColumnDescriptor, QueryResult, TargetTable};

/// Rules the model is asked to follow when writing SQL.
///
/// These are instructions only; nothing checks the generated SQL against them.
pub const QUERY_RULES: [&str; 13] = [
    "Always use explicit JOINs instead of implicit syntax.",
    "Use parameterized queries to prevent SQL injection.",
    "Ensure all SELECT queries have a LIMIT unless otherwise specified by the user.",
    "Avoid using functions that lock the database.",
    "Do not allow any DDL commands like CREATE, DROP, ALTER in the queries.",
    "Enforce the use of specific schemas and tables to restrict access.",
    "Ensure that transactional commands like INSERT, UPDATE, DELETE are not used.",
    "Syntax should be specifically for Snowflake SQL.",
    "The WHERE clause should ALWAYS originate from the SALES_DATA schema.",
    "Only respond with the query, no other context. The response will be executed verbatim.",
    "Do not include a semicolon at the end of the statement.",
    "If using an aggregate function, always add a GROUP BY clause for all relevant columns.",
    "Force the date format as YYYY-MM-DD when working with date fields.",
];

/// Opening line of the summary prompt.
const SUMMARY_INSTRUCTIONS: &str = "Provide a concise summary of the following sales data points. \
Just pick a few interesting insights (like one product doing better than another, etc). \
This will be shown to the user in a chat window. \
Make sure the formatting is written like a human. Break things into lines, etc.";

/// Everything the generation prompt is built from for one chat turn.
#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    /// Table the query must target.
    pub target: &'a TargetTable,
    /// Columns of the target table.
    pub columns: &'a [ColumnDescriptor],
    /// The user's chat message.
    pub user_text: &'a str,
    /// Extra context appended after the user request, if any.
    pub additional_context: Option<&'a str>,
}

impl<'a> QueryRequest<'a> {
    /// Creates a request without additional context.
    pub fn new(target: &'a TargetTable, columns: &'a [ColumnDescriptor], user_text: &'a str) -> Self {
        Self {
            target,
            columns,
            user_text,
            additional_context: None,
        }
    }

    /// Sets the additional context line.
    pub fn with_context(mut self, context: &'a str) -> Self {
        self.additional_context = Some(context);
        self
    }
}

/// Builds the instruction asking the model for a single Snowflake SQL query.
pub fn build_query_prompt(request: &QueryRequest<'_>) -> String {
    let rules = QUERY_RULES
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {rule}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Generate an SQL query for the Snowflake database using the following details and rules:\n\
         - Database: {database}\n\
         - Schema: {schema}\n\
         - Table: {table}\n\
         - Columns: {columns}\n\
         - User Request: {user_text}\n\
         - Additional Context: {context}\n\
         Rules:\n\
         {rules}\n",
        database = request.target.database,
        schema = request.target.schema,
        table = request.target.table,
        columns = format_columns(request.columns),
        user_text = request.user_text,
        context = request.additional_context.unwrap_or(""),
    )
}

/// Builds the prompt asking for a prose summary of `result`.
pub fn build_summary_prompt(result: &QueryResult) -> String {
    format!("{SUMMARY_INSTRUCTIONS}\n{}", result.to_records())
}
