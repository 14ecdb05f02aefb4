//! Terminal output for chat turns.
//!
//! Provides two formats: a human-readable text layout (target columns, the
//! optional generation prompt, query caption, results table, bar chart,
//! summary and notices) and one JSON object per turn.

mod chart;
mod export;
mod table;

pub use chart::BarChart;
pub use export::{export_csv, write_csv, EXPORT_FILE_NAME};
pub use table::ResultTable;

use serde::Serialize;

use crate::db::ColumnInfo;
use crate::pipeline::{Notice, NoticeLevel, TurnOutcome};

/// Line shown before the generated SQL.
pub const QUERY_CAPTION: &str = "Here is the query I have attempted to generate!";

/// Heading of the summary section.
pub const SUMMARY_HEADING: &str = "Summary of the Data";

/// Label of the target column list.
pub const COLUMNS_LABEL: &str = "Columns:";

/// Heading of the generation prompt, shown with `--show-prompt`.
pub const PROMPT_HEADING: &str = "Prompt:";

/// Output format for chat turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per turn.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// JSON output structure.
#[derive(Debug, Serialize)]
struct JsonTurn<'a> {
    input: &'a str,
    target_columns: Option<&'a str>,
    prompt: Option<&'a str>,
    sql: Option<&'a str>,
    columns: &'a [ColumnInfo],
    records: serde_json::Value,
    row_count: usize,
    was_truncated: bool,
    execution_ms: u64,
    summary: Option<&'a str>,
    notices: &'a [Notice],
}

/// Formats chat turns.
pub struct TurnRenderer {
    format: OutputFormat,
    show_prompt: bool,
}

impl TurnRenderer {
    /// Creates a new renderer.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_prompt: false,
        }
    }

    /// Includes the generation prompt in text output.
    pub fn with_prompt(mut self, show: bool) -> Self {
        self.show_prompt = show;
        self
    }

    /// Formats the outcome according to the configured format.
    pub fn format(&self, outcome: &TurnOutcome) -> String {
        match self.format {
            OutputFormat::Text => self.format_text(outcome),
            OutputFormat::Json => Self::format_json(outcome),
        }
    }

    fn format_text(&self, outcome: &TurnOutcome) -> String {
        let mut out = Vec::new();
        if let Some(columns) = &outcome.columns {
            out.push(format!("{COLUMNS_LABEL} {columns}"));
        }
        if self.show_prompt {
            if let Some(prompt) = &outcome.prompt {
                out.push(PROMPT_HEADING.to_string());
                out.extend(prompt.trim().lines().map(|line| format!("  {line}")));
            }
        }
        if !out.is_empty() {
            out.push(String::new());
        }

        out.push(QUERY_CAPTION.to_string());
        if let Some(sql) = &outcome.sql {
            out.push(format!("  {}", sql.trim()));
        }

        if !outcome.result.is_empty() {
            out.push(String::new());
            out.extend(ResultTable::new(&outcome.result).render_to_lines());

            if let Some(chart) = BarChart::from_result(&outcome.result) {
                out.push(String::new());
                out.extend(chart.render_to_lines());
            }
            out.push("─".repeat(40));

            if let Some(summary) = &outcome.summary {
                out.push(SUMMARY_HEADING.to_string());
                out.push(summary.trim().to_string());
            }
        }

        if !outcome.notices.is_empty() {
            out.push(String::new());
            out.extend(outcome.notices.iter().map(format_notice));
        }

        format!("{}\n", out.join("\n"))
    }

    fn format_json(outcome: &TurnOutcome) -> String {
        let result = &outcome.result;
        let json = JsonTurn {
            input: &outcome.user_text,
            target_columns: outcome.columns.as_deref(),
            prompt: outcome.prompt.as_deref(),
            sql: outcome.sql.as_deref(),
            columns: &result.columns,
            records: result.to_records(),
            row_count: result.row_count,
            was_truncated: result.was_truncated,
            execution_ms: result.execution_time.as_millis() as u64,
            summary: outcome.summary.as_deref(),
            notices: &outcome.notices,
        };

        let line = serde_json::to_string(&json)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e));
        format!("{line}\n")
    }
}

fn format_notice(notice: &Notice) -> String {
    let label = match notice.level {
        NoticeLevel::Info => "Info",
        NoticeLevel::Warning => "Warning",
        NoticeLevel::Error => "Error",
    };
    format!("{label}: {}", notice.message)
}
