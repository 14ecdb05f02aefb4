//! Horizontal bar charts for query results.
//!
//! Plots every numeric column as its own block of bars, labelled by the first
//! text column (or the row number when there is none).

use crate::db::{QueryResult, Value};

/// Width of the longest bar.
const BAR_WIDTH: usize = 40;

/// Maximum width of a bar label.
const MAX_LABEL_WIDTH: usize = 24;

/// One plotted column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Column name.
    pub name: String,
    values: Vec<f64>,
}

/// A bar chart derived from a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    labels: Vec<String>,
    series: Vec<Series>,
}

impl BarChart {
    /// Builds a chart from `result`, or `None` if there is nothing to plot.
    pub fn from_result(result: &QueryResult) -> Option<Self> {
        let column_has = |i: usize, pred: fn(&Value) -> bool| {
            result.rows.iter().any(|row| row.get(i).is_some_and(pred))
        };

        let series: Vec<Series> = (0..result.columns.len())
            .filter(|&i| column_has(i, |v| v.as_f64().is_some()))
            .map(|i| Series {
                name: result.columns[i].name.clone(),
                values: result
                    .rows
                    .iter()
                    .map(|row| row.get(i).and_then(Value::as_f64).unwrap_or(0.0))
                    .collect(),
            })
            .collect();
        if series.is_empty() {
            return None;
        }

        let label_index =
            (0..result.columns.len()).find(|&i| column_has(i, |v| matches!(v, Value::String(_))));
        let labels = result
            .rows
            .iter()
            .enumerate()
            .map(|(n, row)| match label_index.and_then(|i| row.get(i)) {
                Some(value) => value.to_display_string(),
                None => n.to_string(),
            })
            .collect();

        Some(Self { labels, series })
    }

    /// Plotted columns, in result order.
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Renders each series as a heading followed by one line per bar, scaled
    /// to that series' largest value. Series are separated by a blank line.
    pub fn render_to_lines(&self) -> Vec<String> {
        let label_width = self
            .labels
            .iter()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0)
            .min(MAX_LABEL_WIDTH);

        let mut lines = Vec::new();
        for (n, series) in self.series.iter().enumerate() {
            if n > 0 {
                lines.push(String::new());
            }
            lines.push(series.name.clone());

            let max = series
                .values
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .fold(0.0_f64, f64::max);

            for (label, value) in self.labels.iter().zip(&series.values) {
                let len = if max > 0.0 && value.is_finite() && *value > 0.0 {
                    ((value / max) * BAR_WIDTH as f64).round() as usize
                } else {
                    0
                };
                let label: String = label.chars().take(label_width).collect();
                let pad = label_width - label.chars().count();
                lines.push(format!(
                    "{label}{} │{} {}",
                    " ".repeat(pad),
                    "█".repeat(len),
                    Value::Float(*value)
                ));
            }
        }
        lines
    }
}
