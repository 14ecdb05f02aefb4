//! Target table metadata for NovAi.
//!
//! The chat is scoped to a single table. This module names that table and
//! turns its INFORMATION_SCHEMA rows into the column list given to the model.

use super::{QueryResult, Statement};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The database, schema and table the chat generates queries against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetTable {
    /// Database name.
    #[serde(default = "default_database")]
    pub database: String,

    /// Schema name.
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Table name.
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_database() -> String {
    "PANDATA_DEMO".to_string()
}

fn default_schema() -> String {
    "NORTHWINDS".to_string()
}

fn default_table() -> String {
    "REGRESSION_SANDBOX".to_string()
}

impl Default for TargetTable {
    fn default() -> Self {
        Self {
            database: default_database(),
            schema: default_schema(),
            table: default_table(),
        }
    }
}

impl TargetTable {
    /// Creates a target table from its three identifiers.
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Returns `DATABASE.SCHEMA.TABLE`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.database, self.schema, self.table)
    }

    /// Builds the metadata statement listing the table's columns.
    ///
    /// The database has to appear as an identifier; schema and table are bound.
    pub fn columns_statement(&self) -> Statement {
        Statement::new(format!(
            "SELECT COLUMN_NAME, DATA_TYPE FROM {}.INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION",
            quote_identifier(&self.database)
        ))
        .bind_text(&self.schema)
        .bind_text(&self.table)
    }
}

/// Returns a plain identifier unchanged, otherwise a double-quoted one.
fn quote_identifier(ident: &str) -> String {
    let mut chars = ident.chars();
    let is_plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    if is_plain {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

/// A column of the target table as reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Declared data type.
    pub data_type: String,
}

impl ColumnDescriptor {
    /// Creates a new column descriptor.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Converts `(COLUMN_NAME, DATA_TYPE)` rows into descriptors.
///
/// Rows with a missing name are skipped and repeated names keep their first
/// occurrence.
pub(super) fn descriptors_from_result(result: &QueryResult) -> Vec<ColumnDescriptor> {
    let mut seen = HashSet::new();
    result
        .rows
        .iter()
        .filter_map(|row| {
            let name = row.first().filter(|v| !v.is_null())?.to_display_string();
            let data_type = row
                .get(1)
                .filter(|v| !v.is_null())
                .map(|v| v.to_display_string())
                .unwrap_or_default();
            Some(ColumnDescriptor::new(name, data_type))
        })
        .filter(|column| seen.insert(column.name.clone()))
        .collect()
}

/// Formats columns as `NAME (TYPE), NAME (TYPE)` for the generation prompt.
pub fn format_columns(columns: &[ColumnDescriptor]) -> String {
    columns
        .iter()
        .map(|c| format!("{} ({})", c.name, c.data_type))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Binding, ColumnInfo, Value};

    fn metadata(rows: Vec<(&str, &str)>) -> QueryResult {
        QueryResult::with_data(
            vec![
                ColumnInfo::new("COLUMN_NAME", "TEXT"),
                ColumnInfo::new("DATA_TYPE", "TEXT"),
            ],
            rows.into_iter()
                .map(|(n, t)| vec![Value::from(n), Value::from(t)])
                .collect(),
        )
    }

    #[test]
    fn test_default_target() {
        let target = TargetTable::default();
        assert_eq!(
            target.qualified_name(),
            "PANDATA_DEMO.NORTHWINDS.REGRESSION_SANDBOX"
        );
    }

    #[test]
    fn test_columns_statement_binds_schema_and_table() {
        let statement = TargetTable::default().columns_statement();

        assert!(statement
            .sql
            .starts_with("SELECT COLUMN_NAME, DATA_TYPE FROM PANDATA_DEMO.INFORMATION_SCHEMA.COLUMNS"));
        assert!(statement.sql.contains("TABLE_SCHEMA = ? AND TABLE_NAME = ?"));
        assert!(!statement.sql.contains("NORTHWINDS"));
        assert_eq!(
            statement.bindings,
            vec![
                Binding::Text("NORTHWINDS".to_string()),
                Binding::Text("REGRESSION_SANDBOX".to_string()),
            ]
        );
    }

    #[test]
    fn test_columns_statement_quotes_unusual_database() {
        let target = TargetTable::new("my-db\"x", "S", "T");
        assert!(target
            .columns_statement()
            .sql
            .contains("FROM \"my-db\"\"x\".INFORMATION_SCHEMA.COLUMNS"));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("SALES_2024"), "SALES_2024");
        assert_eq!(quote_identifier("_x$"), "_x$");
        assert_eq!(quote_identifier("1abc"), "\"1abc\"");
        assert_eq!(quote_identifier(""), "\"\"");
    }

    #[test]
    fn test_descriptors_from_result() {
        let columns = descriptors_from_result(&metadata(vec![
            ("PRODUCT", "TEXT"),
            ("REVENUE", "NUMBER"),
            ("ORDER_DATE", "DATE"),
        ]));

        assert_eq!(
            columns,
            vec![
                ColumnDescriptor::new("PRODUCT", "TEXT"),
                ColumnDescriptor::new("REVENUE", "NUMBER"),
                ColumnDescriptor::new("ORDER_DATE", "DATE"),
            ]
        );
    }

    #[test]
    fn test_descriptors_keep_first_duplicate() {
        let columns =
            descriptors_from_result(&metadata(vec![("A", "TEXT"), ("A", "NUMBER"), ("B", "DATE")]));
        assert_eq!(
            columns,
            vec![
                ColumnDescriptor::new("A", "TEXT"),
                ColumnDescriptor::new("B", "DATE"),
            ]
        );
    }

    #[test]
    fn test_descriptors_skip_null_names() {
        let result = QueryResult::with_data(
            vec![],
            vec![
                vec![Value::Null, Value::from("TEXT")],
                vec![Value::from("ID"), Value::Null],
            ],
        );
        assert_eq!(
            descriptors_from_result(&result),
            vec![ColumnDescriptor::new("ID", "")]
        );
    }

    #[test]
    fn test_format_columns() {
        let columns = vec![
            ColumnDescriptor::new("PRODUCT", "TEXT"),
            ColumnDescriptor::new("REVENUE", "NUMBER"),
        ];
        assert_eq!(format_columns(&columns), "PRODUCT (TEXT), REVENUE (NUMBER)");
        assert_eq!(format_columns(&[]), "");
    }
}
