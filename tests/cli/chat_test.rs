//! Tests for the novai binary in --mock mode.

use super::common::{run_novai, run_novai_with_input};
use tempfile::TempDir;

#[test]
fn test_one_shot_text_output() {
    let home = TempDir::new().unwrap();
    let (code, stdout, stderr) = run_novai(
        home.path(),
        &["--mock", "--query", "show top 5 products by revenue"],
    );

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.starts_with("Columns: PRODUCT (TEXT), REVENUE (NUMBER)\n"));
    assert!(stdout.contains("Here is the query I have attempted to generate!\n"));
    assert!(!stdout.contains("Prompt:"));
    assert!(stdout.contains("ORDER BY REVENUE DESC LIMIT 5\n"));
    assert!(!stdout.contains(';'));
    assert!(stdout.contains("5 rows returned"));
    assert!(stdout.contains("Summary of the Data\nCôte de Blaye leads the results."));
}

#[test]
fn test_one_shot_json_output() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_novai(
        home.path(),
        &["--mock", "--output", "json", "-q", "top 3 products"],
    );

    assert_eq!(code, 0);
    assert_eq!(stdout.lines().count(), 1);
    let json: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(json["input"], "top 3 products");
    assert_eq!(json["row_count"], 3);
    assert_eq!(json["records"].as_array().unwrap().len(), 3);
    assert!(json["summary"].as_str().unwrap().contains("Côte de Blaye"));
}

#[test]
fn test_show_prompt_flag() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_novai(home.path(), &["--mock", "--show-prompt", "-q", "top 2"]);

    assert_eq!(code, 0);
    assert!(stdout.contains("Prompt:\n"));
    assert!(stdout.contains("  - User Request: top 2\n"));
}

#[test]
fn test_no_summary_flag() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_novai(home.path(), &["--mock", "--no-summary", "-q", "top 2"]);

    assert_eq!(code, 0);
    assert!(stdout.contains("2 rows returned"));
    assert!(!stdout.contains("Summary of the Data"));
}

#[test]
fn test_export_dir_writes_csv() {
    let home = TempDir::new().unwrap();
    let export = home.path().join("exports");
    let export_arg = export.to_string_lossy().to_string();

    let (code, stdout, _) = run_novai(
        home.path(),
        &["--mock", "--export-dir", &export_arg, "-q", "top 2"],
    );

    assert_eq!(code, 0);
    assert!(stdout.contains("Info: Results saved to"));
    let csv = std::fs::read_to_string(export.join("query_results.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("PRODUCT,REVENUE\n"));
}

#[test]
fn test_repl_runs_until_quit() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_novai_with_input(
        home.path(),
        &["--mock"],
        "top 2\n\n/quit\ntop 3\n",
    );

    assert_eq!(code, 0);
    assert!(stdout.contains("Ask me about PANDATA_DEMO.NORTHWINDS.REGRESSION_SANDBOX"));
    assert!(stdout.contains("2 rows returned"));
    assert!(!stdout.contains("3 rows returned"));
    // Piped input is read without the line editor's prompt.
    assert!(!stdout.lines().any(|line| line.starts_with("> ")));
}

#[test]
fn test_repl_ends_at_eof() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_novai_with_input(
        home.path(),
        &["--mock", "--table", "ORDERS"],
        "top 1\ntop 4\n",
    );

    assert_eq!(code, 0);
    assert!(stdout.contains("Ask me about PANDATA_DEMO.NORTHWINDS.ORDERS"));
    assert!(stdout.contains("1 row returned"));
    assert!(stdout.contains("4 rows returned"));
}

#[test]
fn test_repl_json_has_no_banner() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) =
        run_novai_with_input(home.path(), &["--mock", "--output", "json"], "top 1\n");

    assert_eq!(code, 0);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.starts_with('{'));
}

#[test]
fn test_missing_account_is_fatal() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_novai(home.path(), &["-q", "top 5"]);

    assert_eq!(code, 1);
    assert!(
        stderr.contains("Configuration Error: Configuration error: Snowflake account is required"),
        "stderr: {stderr}"
    );
}

#[test]
fn test_missing_token_is_fatal() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_novai(home.path(), &["--account", "xy12345", "-q", "top 5"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("No token configured"), "stderr: {stderr}");
}

#[test]
fn test_invalid_output_format() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_novai(home.path(), &["--mock", "--output", "xml", "-q", "x"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid output format: xml"));
}

#[test]
fn test_config_file_target_is_used() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("config.toml"),
        "[target]\ndatabase = \"SALES\"\nschema = \"PUBLIC\"\ntable = \"ORDERS\"\n",
    )
    .unwrap();

    let (code, stdout, _) = run_novai_with_input(home.path(), &["--mock"], "/quit\n");

    assert_eq!(code, 0);
    assert!(stdout.contains("Ask me about SALES.PUBLIC.ORDERS"));
}
