//! CSV export of query results.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::db::{QueryResult, Value};
use crate::error::{NovaiError, Result};

/// File name of the exported results.
pub const EXPORT_FILE_NAME: &str = "query_results.csv";

/// Writes `result` as CSV to `writer`: a header row of column names, then one
/// record per row. NULL becomes an empty field.
pub fn write_csv<W: Write>(result: &QueryResult, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record(result.columns.iter().map(|c| c.name.as_str()))
        .map_err(export_error)?;
    for row in &result.rows {
        csv.write_record(row.iter().map(|value| match value {
            Value::Null => String::new(),
            other => other.to_display_string(),
        }))
        .map_err(export_error)?;
    }
    csv.flush()
        .map_err(|e| NovaiError::internal(format!("Failed to write CSV: {e}")))?;
    Ok(())
}

/// Exports `result` to `<dir>/query_results.csv`, replacing any previous
/// export, and returns the file path.
pub fn export_csv(result: &QueryResult, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| {
        NovaiError::internal(format!("Failed to create {}: {e}", dir.display()))
    })?;

    let path = dir.join(EXPORT_FILE_NAME);
    let file = std::fs::File::create(&path).map_err(|e| {
        NovaiError::internal(format!("Failed to create {}: {e}", path.display()))
    })?;
    write_csv(result, file)?;

    tracing::info!(path = %path.display(), row_count = result.row_count, "Exported results");
    Ok(path)
}

fn export_error(e: csv::Error) -> NovaiError {
    NovaiError::internal(format!("Failed to write CSV: {e}"))
}
