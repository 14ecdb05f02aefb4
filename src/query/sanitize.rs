//! Post-processing of generated SQL.

/// Removes every semicolon from generated SQL.
///
/// All other characters are kept in order. Returns `None` when nothing but
/// whitespace remains, so an empty generation never reaches the warehouse.
pub fn sanitize_sql(raw: &str) -> Option<String> {
    let sql: String = raw.chars().filter(|&c| c != ';').collect();
    if sql.trim().is_empty() {
        None
    } else {
        Some(sql)
    }
}
