//! Live Snowflake tests.
//!
//! Require SNOWFLAKE_ACCOUNT and SNOWFLAKE_TOKEN (plus SNOWFLAKE_WAREHOUSE and
//! SNOWFLAKE_ROLE as your account needs). The target table comes from
//! NOVAI_TEST_DATABASE / NOVAI_TEST_SCHEMA / NOVAI_TEST_TABLE, defaulting to
//! the demo table.

use std::sync::Arc;

use novai::config::{WarehouseConfig, DEFAULT_MODEL};
use novai::db::{SnowflakeClient, TargetTable, Value, WarehouseClient};
use novai::llm::{CompletionClient, CortexClient};
use novai::pipeline::ChatPipeline;

fn test_target() -> TargetTable {
    let defaults = TargetTable::default();
    TargetTable::new(
        std::env::var("NOVAI_TEST_DATABASE").unwrap_or(defaults.database),
        std::env::var("NOVAI_TEST_SCHEMA").unwrap_or(defaults.schema),
        std::env::var("NOVAI_TEST_TABLE").unwrap_or(defaults.table),
    )
}

/// Creates a client from the environment, or None if it is not configured.
fn get_test_client() -> Option<Arc<SnowflakeClient>> {
    std::env::var("SNOWFLAKE_ACCOUNT").ok()?;
    std::env::var("SNOWFLAKE_TOKEN").ok()?;

    let mut config = WarehouseConfig::default();
    config.apply_env_defaults();
    SnowflakeClient::new(&config, &test_target()).ok().map(Arc::new)
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: SNOWFLAKE_ACCOUNT/SNOWFLAKE_TOKEN not set");
        return;
    };

    let result = client
        .execute_query("SELECT 1 AS NUM, 'hello' AS GREETING, NULL AS NOTHING")
        .await
        .unwrap();

    assert_eq!(result.columns.len(), 3);
    assert_eq!(result.columns[0].name, "NUM");
    assert_eq!(result.rows[0][0], Value::Int(1));
    assert_eq!(result.rows[0][1], Value::from("hello"));
    assert!(result.rows[0][2].is_null());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_execute_invalid_sql_is_query_error() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: SNOWFLAKE_ACCOUNT/SNOWFLAKE_TOKEN not set");
        return;
    };

    let err = client
        .execute_query("SELEC broken FROM nowhere")
        .await
        .unwrap_err();
    assert_eq!(err.category(), "Query Error");
}

#[tokio::test]
async fn test_introspect_target_table() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: SNOWFLAKE_ACCOUNT/SNOWFLAKE_TOKEN not set");
        return;
    };

    let columns = client.introspect_columns(&test_target()).await.unwrap();
    assert!(!columns.is_empty());
}

#[tokio::test]
async fn test_cortex_completion() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: SNOWFLAKE_ACCOUNT/SNOWFLAKE_TOKEN not set");
        return;
    };

    let cortex = CortexClient::new(client, DEFAULT_MODEL);
    let text = cortex
        .complete("Reply with the single word: pong. Don't say it's a game.")
        .await
        .unwrap();
    assert!(!text.trim().is_empty());
}

#[tokio::test]
async fn test_live_turn() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: SNOWFLAKE_ACCOUNT/SNOWFLAKE_TOKEN not set");
        return;
    };

    let cortex = Arc::new(CortexClient::new(client.clone(), DEFAULT_MODEL));
    let pipeline = ChatPipeline::new(client, cortex, test_target());

    let outcome = pipeline.run_turn("how many rows are in the table?").await;
    assert!(outcome.prompt.is_some());
    assert!(
        !outcome.notices.iter().any(|n| n.message.starts_with("Failed to introspect")),
        "{:?}",
        outcome.notices
    );
}
