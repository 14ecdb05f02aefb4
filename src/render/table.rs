//! Plain-text result tables.
//!
//! Renders query results as boxed tables with column headers and
//! auto-sized columns.

use crate::db::{QueryResult, Value};

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Renders a query result as a text table.
pub struct ResultTable<'a> {
    result: &'a QueryResult,
}

impl<'a> ResultTable<'a> {
    /// Creates a new result table.
    pub fn new(result: &'a QueryResult) -> Self {
        Self { result }
    }

    /// Calculates the width of each column in characters.
    fn calculate_column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .result
            .columns
            .iter()
            .map(|col| col.name.chars().count().max(MIN_COLUMN_WIDTH))
            .collect();

        for row in &self.result.rows {
            for (width, value) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(value.to_display_string().chars().count());
            }
        }

        widths.into_iter().map(|w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    /// Truncates a string to `max_width` characters, adding an ellipsis if needed.
    fn truncate(s: &str, max_width: usize) -> String {
        if s.chars().count() <= max_width {
            s.to_string()
        } else if max_width <= 3 {
            s.chars().take(max_width).collect()
        } else {
            let head: String = s.chars().take(max_width - 3).collect();
            format!("{head}...")
        }
    }

    /// Renders the table to lines.
    pub fn render_to_lines(&self) -> Vec<String> {
        if self.result.columns.is_empty() {
            return vec!["(empty result)".to_string()];
        }

        let widths = self.calculate_column_widths();
        let mut lines = Vec::with_capacity(self.result.rows.len() + 5);

        lines.push(Self::render_border(&widths, '┌', '┬', '┐'));
        let header = self
            .result
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>();
        lines.push(Self::render_row(&header, &widths));
        lines.push(Self::render_border(&widths, '├', '┼', '┤'));

        for row in &self.result.rows {
            let cells = row.iter().map(Value::to_display_string).collect::<Vec<_>>();
            let cells = cells.iter().map(String::as_str).collect::<Vec<_>>();
            lines.push(Self::render_row(&cells, &widths));
        }

        lines.push(Self::render_border(&widths, '└', '┴', '┘'));

        lines.push(format!(
            "{} row{} returned ({}ms)",
            self.result.row_count,
            if self.result.row_count == 1 { "" } else { "s" },
            self.result.execution_time.as_millis()
        ));

        lines
    }

    fn render_border(widths: &[usize], left: char, mid: char, right: char) -> String {
        let segments = widths
            .iter()
            .map(|&w| "─".repeat(w + 2))
            .collect::<Vec<_>>()
            .join(&mid.to_string());
        format!("{left}{segments}{right}")
    }

    fn render_row(cells: &[&str], widths: &[usize]) -> String {
        let padded = widths
            .iter()
            .enumerate()
            .map(|(i, &width)| {
                let text = Self::truncate(cells.get(i).copied().unwrap_or(""), width);
                let pad = width - text.chars().count();
                format!(" {text}{} ", " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join("│");
        format!("│{padded}│")
    }
}
