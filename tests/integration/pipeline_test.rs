//! Chat pipeline integration tests.
//!
//! Runs whole turns through the public API with in-memory clients.

use std::sync::Arc;

use novai::db::{MockWarehouseClient, TargetTable, Value};
use novai::llm::{FailingCompletionClient, MockCompletionClient, QUERY_RULES};
use novai::pipeline::{ChatPipeline, NoticeLevel};
use novai::render::{export_csv, OutputFormat, TurnRenderer, EXPORT_FILE_NAME};
use pretty_assertions::assert_eq;

const TOP_FIVE_SQL: &str = "SELECT PRODUCT, SUM(REVENUE) AS REVENUE FROM NORTHWINDS.REGRESSION_SANDBOX GROUP BY PRODUCT ORDER BY REVENUE DESC LIMIT 5;";

fn mock_pipeline(
    warehouse: Arc<MockWarehouseClient>,
    completion: Arc<MockCompletionClient>,
) -> ChatPipeline {
    ChatPipeline::new(warehouse, completion, TargetTable::default())
}

#[tokio::test]
async fn test_top_five_products_end_to_end() {
    let warehouse = Arc::new(MockWarehouseClient::new());
    let completion = Arc::new(MockCompletionClient::new().with_response("top 5 products", TOP_FIVE_SQL));
    let pipeline = mock_pipeline(warehouse.clone(), completion.clone());

    let outcome = pipeline.run_turn("show top 5 products by revenue").await;

    let prompt = outcome.prompt.as_deref().unwrap();
    assert!(prompt.contains(QUERY_RULES[2]));
    assert!(prompt.contains(QUERY_RULES[11]));
    assert!(prompt.contains("- Database: PANDATA_DEMO\n"));
    assert!(prompt.contains("- Schema: NORTHWINDS\n"));
    assert!(prompt.contains("- Table: REGRESSION_SANDBOX\n"));
    assert!(prompt.contains("- Columns: PRODUCT (TEXT), REVENUE (NUMBER)\n"));

    assert_eq!(outcome.sql.as_deref(), Some(TOP_FIVE_SQL.trim_end_matches(';')));
    assert_eq!(warehouse.executed()[1].sql, TOP_FIVE_SQL.trim_end_matches(';'));

    assert_eq!(outcome.result.row_count, 5);
    assert_eq!(outcome.result.columns[0].name, "PRODUCT");
    assert_eq!(outcome.result.rows[0][0], Value::from("Côte de Blaye"));

    let summary = outcome.summary.as_deref().unwrap();
    assert!(summary.contains("Côte de Blaye"));
    assert!(outcome.notices.is_empty());

    // The summary request carried the five rows.
    let summary_prompt = &completion.prompts()[1];
    let (_, json) = summary_prompt.split_once('\n').unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_str(json).unwrap();
    assert_eq!(records.len(), 5);
}

#[tokio::test]
async fn test_semicolon_only_generation_never_executes() {
    let warehouse = Arc::new(MockWarehouseClient::new());
    let completion = Arc::new(MockCompletionClient::new().with_response("User Request", " ;\n; "));
    let outcome = mock_pipeline(warehouse.clone(), completion)
        .run_turn("what is the meaning of life")
        .await;

    assert_eq!(outcome.sql, None);
    assert_eq!(outcome.notices.len(), 1);
    assert_eq!(outcome.notices[0].level, NoticeLevel::Warning);
    assert_eq!(warehouse.executed().len(), 1);
}

#[tokio::test]
async fn test_turns_are_independent() {
    let warehouse = Arc::new(MockWarehouseClient::new().with_error("LIMIT 1", "boom"));
    let pipeline = mock_pipeline(warehouse, Arc::new(MockCompletionClient::new()));

    let failed = pipeline.run_turn("top 1").await;
    assert!(failed.has_errors());
    assert!(failed.result.is_empty());

    let ok = pipeline.run_turn("top 3").await;
    assert!(!ok.has_errors());
    assert_eq!(ok.result.row_count, 3);
}

#[tokio::test]
async fn test_warehouse_closed_mid_session() {
    use novai::db::WarehouseClient;

    let warehouse = Arc::new(MockWarehouseClient::new());
    let pipeline = mock_pipeline(warehouse.clone(), Arc::new(MockCompletionClient::new()));
    warehouse.close().await.unwrap();

    let outcome = pipeline.run_turn("top 3").await;
    assert_eq!(outcome.notices.len(), 1);
    assert!(outcome.notices[0]
        .message
        .starts_with("Failed to introspect table: Connection error:"));
}

#[tokio::test]
async fn test_summary_failure_still_renders_table_and_exports() {
    let dir = tempfile::TempDir::new().unwrap();
    let pipeline = ChatPipeline::new(
        Arc::new(MockWarehouseClient::new()),
        Arc::new(FailingCompletionClient::for_summaries("Cortex quota exceeded")),
        TargetTable::default(),
    );

    let outcome = pipeline.run_turn("top 2 products").await;
    let text = TurnRenderer::new(OutputFormat::Text).format(&outcome);
    let path = export_csv(&outcome.result, dir.path()).unwrap();

    assert!(text.contains("Thüringer Rostbratwurst"));
    assert!(text.contains("Error: Failed to generate summary:"));
    assert_eq!(path.file_name().unwrap(), EXPORT_FILE_NAME);
    assert_eq!(
        std::fs::read_to_string(path).unwrap(),
        "PRODUCT,REVENUE\nCôte de Blaye,141396.74\nThüringer Rostbratwurst,80368.67\n"
    );
}
