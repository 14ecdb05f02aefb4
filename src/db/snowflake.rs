//! Snowflake SQL API client implementation.
//!
//! Provides the `SnowflakeClient` struct that implements the `WarehouseClient`
//! trait on top of the Snowflake SQL API v2 (`/api/v2/statements`) using reqwest.

use crate::config::{TokenType, WarehouseConfig};
use crate::db::{Binding, ColumnInfo, QueryResult, Row, Statement, TargetTable, Value, WarehouseClient};
use crate::error::{NovaiError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Path of the statements endpoint, relative to the account URL.
const STATEMENTS_PATH: &str = "/api/v2/statements";

/// Maximum rows to return from a query.
const MAX_ROWS: usize = 1000;

/// Delay between status checks while a statement is still running.
const POLL_INTERVAL_MS: u64 = 500;

/// Days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const USER_AGENT: &str = concat!("novai/", env!("CARGO_PKG_VERSION"));

/// Snowflake warehouse client.
#[derive(Debug)]
pub struct SnowflakeClient {
    client: Client,
    base_url: Url,
    token: String,
    token_type: TokenType,
    database: String,
    schema: String,
    warehouse: Option<String>,
    role: Option<String>,
    timeout_secs: Option<u64>,
    closed: AtomicBool,
}

impl SnowflakeClient {
    /// Creates a client for the configured account, running statements in the
    /// context of the target table's database and schema.
    pub fn new(config: &WarehouseConfig, target: &TargetTable) -> Result<Self> {
        let base_url = config.api_base_url()?;
        let token = config.require_token()?.to_string();

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NovaiError::connection(format!("Failed to create HTTP client: {e}")))?;

        info!(account = %config.display_string(), "Snowflake client ready");

        Ok(Self {
            client,
            base_url,
            token,
            token_type: config.token_type(),
            database: target.database.clone(),
            schema: target.schema.clone(),
            warehouse: config.warehouse.clone(),
            role: config.role.clone(),
            timeout_secs: config.timeout_secs,
            closed: AtomicBool::new(false),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| NovaiError::internal(format!("Invalid SQL API path '{path}': {e}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(
                "X-Snowflake-Authorization-Token-Type",
                self.token_type.as_header_value(),
            )
            .header("Accept", "application/json")
    }

    fn request_body<'a>(&'a self, statement: &'a Statement) -> StatementRequest<'a> {
        StatementRequest {
            statement: &statement.sql,
            timeout: self.timeout_secs,
            database: &self.database,
            schema: &self.schema,
            warehouse: self.warehouse.as_deref(),
            role: self.role.as_deref(),
            bindings: statement
                .bindings
                .iter()
                .enumerate()
                .map(|(i, b)| ((i + 1).to_string(), b))
                .collect(),
        }
    }

    /// Submits a statement and waits until its first partition is available.
    async fn submit(&self, statement: &Statement) -> Result<ResultSetResponse> {
        let url = self.url(STATEMENTS_PATH)?;
        let response = self
            .request(Method::POST, url)
            .json(&self.request_body(statement))
            .send()
            .await
            .map_err(map_request_error)?;

        let mut pending = match read_statement_response(response).await? {
            StatementResponse::Ready(result) => return Ok(result),
            StatementResponse::Running(status) => status,
        };

        loop {
            debug!(handle = %pending.statement_handle, "Statement still running");
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;

            let path = pending
                .statement_status_url
                .clone()
                .unwrap_or_else(|| format!("{STATEMENTS_PATH}/{}", pending.statement_handle));
            let response = self
                .request(Method::GET, self.url(&path)?)
                .send()
                .await
                .map_err(map_request_error)?;

            match read_statement_response(response).await? {
                StatementResponse::Ready(result) => return Ok(result),
                StatementResponse::Running(status) => pending = status,
            }
        }
    }

    /// Fetches one additional result partition.
    async fn fetch_partition(&self, handle: &str, partition: usize) -> Result<Vec<RawRow>> {
        let mut url = self.url(&format!("{STATEMENTS_PATH}/{handle}"))?;
        url.query_pairs_mut()
            .append_pair("partition", &partition.to_string());

        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(map_request_error)?;

        match read_statement_response(response).await? {
            StatementResponse::Ready(result) => Ok(result.data),
            StatementResponse::Running(_) => Err(NovaiError::query(format!(
                "Partition {partition} of statement {handle} is not available"
            ))),
        }
    }
}

#[async_trait]
impl WarehouseClient for SnowflakeClient {
    async fn execute(&self, statement: &Statement) -> Result<QueryResult> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(NovaiError::connection("Warehouse client is closed"));
        }

        let start = Instant::now();
        debug!(
            sql_len = statement.sql.len(),
            bindings = statement.bindings.len(),
            "Submitting statement"
        );

        let response = self.submit(statement).await?;
        let meta = response.result_set_meta_data.unwrap_or_default();
        let mut raw_rows = response.data;

        if let Some(handle) = response.statement_handle.as_deref() {
            for partition in 1..meta.partition_info.len() {
                if raw_rows.len() >= MAX_ROWS {
                    break;
                }
                raw_rows.extend(self.fetch_partition(handle, partition).await?);
            }
        }

        let mut result = build_query_result(&meta, raw_rows);
        result.execution_time = start.elapsed();

        if result.was_truncated {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                result.total_rows.unwrap_or(result.row_count),
                MAX_ROWS
            );
        }

        debug!(
            row_count = result.row_count,
            duration_ms = result.execution_time.as_millis(),
            "Statement complete"
        );
        Ok(result)
    }

    async fn close(&self) -> Result<()> {
        // The SQL API is stateless; closing only stops further use of this client.
        self.closed.store(true, Ordering::SeqCst);
        debug!("Snowflake client closed");
        Ok(())
    }
}

/// Outcome of a statement submission or status check.
#[derive(Debug)]
enum StatementResponse {
    Ready(ResultSetResponse),
    Running(QueryStatus),
}

async fn read_statement_response(response: Response) -> Result<StatementResponse> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| NovaiError::connection(format!("Failed to read response: {e}")))?;

    match status {
        StatusCode::OK => serde_json::from_str(&body)
            .map(StatementResponse::Ready)
            .map_err(|e| NovaiError::query(format!("Failed to parse result set: {e}"))),
        StatusCode::ACCEPTED => serde_json::from_str(&body)
            .map(StatementResponse::Running)
            .map_err(|e| NovaiError::query(format!("Failed to parse statement status: {e}"))),
        _ => Err(parse_error(status, &body)),
    }
}

/// Converts an error response into a NovaiError.
fn parse_error(status: StatusCode, body: &str) -> NovaiError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return NovaiError::connection(
            "Authentication failed. Check SNOWFLAKE_TOKEN and SNOWFLAKE_TOKEN_TYPE.",
        );
    }

    if let Ok(error) = serde_json::from_str::<ErrorResponse>(body) {
        let message = match (&error.code, &error.sql_state) {
            (Some(code), Some(state)) => format!("{} ({code}, SQL state {state})", error.message),
            (Some(code), None) => format!("{} ({code})", error.message),
            _ => error.message,
        };
        return NovaiError::query(message);
    }

    if status.is_server_error() {
        NovaiError::connection(format!("Snowflake SQL API error ({status}): {body}"))
    } else {
        NovaiError::query(format!("Snowflake SQL API error ({status}): {body}"))
    }
}

fn map_request_error(e: reqwest::Error) -> NovaiError {
    if e.is_timeout() {
        NovaiError::connection("Request to Snowflake timed out.")
    } else if e.is_connect() {
        NovaiError::connection("Failed to connect to Snowflake. Check the account and network.")
    } else {
        NovaiError::connection(format!("Request failed: {e}"))
    }
}

/// Builds a typed result set from SQL API metadata and raw string rows.
fn build_query_result(meta: &ResultSetMetaData, raw_rows: Vec<RawRow>) -> QueryResult {
    let columns = meta
        .row_type
        .iter()
        .map(|col| ColumnInfo::new(&col.name, col.describe()))
        .collect();

    let fetched = raw_rows.len();
    let total_rows = meta.num_rows.unwrap_or(fetched).max(fetched);
    let was_truncated = total_rows > MAX_ROWS;

    let rows: Vec<Row> = raw_rows
        .into_iter()
        .take(MAX_ROWS)
        .map(|raw| {
            raw.iter()
                .enumerate()
                .map(|(i, cell)| match meta.row_type.get(i) {
                    Some(col) => convert_value(cell.as_deref(), col),
                    None => cell.as_deref().map(Value::from).unwrap_or(Value::Null),
                })
                .collect()
        })
        .collect();

    let row_count = rows.len();
    QueryResult {
        columns,
        rows,
        execution_time: Duration::ZERO,
        row_count,
        total_rows: Some(total_rows),
        was_truncated,
    }
}

/// Converts a `jsonv2` cell to a typed value based on its column type.
fn convert_value(raw: Option<&str>, column: &RowType) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };

    match column.kind.to_lowercase().as_str() {
        "fixed" if column.scale.unwrap_or(0) == 0 => raw
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| raw.parse::<f64>().map(Value::Float))
            .unwrap_or_else(|_| Value::from(raw)),
        "fixed" | "real" => raw
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::from(raw)),
        "boolean" => match raw {
            "true" | "TRUE" | "1" => Value::Bool(true),
            "false" | "FALSE" | "0" => Value::Bool(false),
            _ => Value::from(raw),
        },
        "date" => raw
            .parse::<i64>()
            .ok()
            .and_then(date_from_epoch_days)
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or_else(|| Value::from(raw)),
        "time" => parse_epoch_seconds(raw)
            .and_then(|(secs, nanos)| {
                NaiveTime::from_num_seconds_from_midnight_opt(u32::try_from(secs).ok()?, nanos)
            })
            .map(|t| Value::String(t.format("%H:%M:%S").to_string()))
            .unwrap_or_else(|| Value::from(raw)),
        "timestamp_ntz" | "timestamp_ltz" | "timestamp_tz" => {
            // TIMESTAMP_TZ appends the offset after a space.
            let seconds = raw.split_whitespace().next().unwrap_or(raw);
            parse_epoch_seconds(seconds)
                .and_then(|(secs, nanos)| DateTime::from_timestamp(secs, nanos))
                .map(|ts| Value::String(ts.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string()))
                .unwrap_or_else(|| Value::from(raw))
        }
        _ => Value::from(raw),
    }
}

fn date_from_epoch_days(days: i64) -> Option<NaiveDate> {
    let days = i32::try_from(days).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// Parses `seconds[.fraction]` into whole seconds and non-negative nanoseconds.
fn parse_epoch_seconds(raw: &str) -> Option<(i64, u32)> {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    let negative = whole.starts_with('-');
    let mut secs: i64 = whole.parse().ok()?;

    let digits: String = fraction.chars().take(9).collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut nanos: u32 = if digits.is_empty() {
        0
    } else {
        format!("{digits:0<9}").parse().ok()?
    };

    if negative && nanos > 0 {
        secs -= 1;
        nanos = 1_000_000_000 - nanos;
    }
    Some((secs, nanos))
}

// Snowflake SQL API types

type RawRow = Vec<Option<String>>;

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    database: &'a str,
    schema: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    bindings: BTreeMap<String, &'a Binding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetResponse {
    statement_handle: Option<String>,
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<RawRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    num_rows: Option<usize>,
    #[serde(default)]
    row_type: Vec<RowType>,
    #[serde(default)]
    partition_info: Vec<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct RowType {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    precision: Option<u32>,
    scale: Option<u32>,
}

impl RowType {
    /// Human-readable type, e.g. `NUMBER(38,2)` or `TEXT`.
    fn describe(&self) -> String {
        match (self.kind.to_lowercase().as_str(), self.precision, self.scale) {
            ("fixed", Some(p), Some(s)) => format!("NUMBER({p},{s})"),
            ("fixed", _, _) => "NUMBER".to_string(),
            ("real", _, _) => "FLOAT".to_string(),
            (kind, _, _) => kind.to_uppercase(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryStatus {
    statement_handle: String,
    statement_status_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    code: Option<String>,
    message: String,
    sql_state: Option<String>,
}
