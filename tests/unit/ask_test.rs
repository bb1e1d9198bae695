use hrdata::ask::{ask, extract_sql};
use hrdata::error::HrError;
use hrdata::ingest::insert_rows;
use hrdata::schema::Table;
use serde_json::json;

use crate::support::{CannedAnswerer, Warehouse, executor};

#[test]
fn first_sql_block_is_extracted() {
    let answer = "Here you go:\n```sql\nSELECT COUNT(*) FROM hr_data.jobs\n```\nand also\n```sql\nSELECT 2\n```";
    assert_eq!(
        extract_sql(answer).as_deref(),
        Some("SELECT COUNT(*) FROM hr_data.jobs")
    );
    assert_eq!(extract_sql("No query needed."), None);
    assert_eq!(extract_sql("```sql\n   \n```"), None);
}

#[tokio::test]
async fn summary_carries_schema_and_counts() {
    let exec = executor(Warehouse::new());
    insert_rows(&exec, "hr_data", Table::Jobs, &[json!({"id": 1, "job": "Analyst"})])
        .await
        .unwrap();
    let answerer = CannedAnswerer::new("There is one job.");

    let outcome = ask(&exec, &answerer, "hr_data", "How many jobs?").await.unwrap();
    assert_eq!(outcome.answer, "There is one job.");
    assert!(outcome.sql.is_none());

    let summary = answerer.seen_summary.lock().unwrap().clone().unwrap();
    assert!(summary.contains("hired_employees"), "{summary}");
    assert!(summary.contains("- jobs: 1"), "{summary}");
    assert!(summary.contains("- departments: 0"), "{summary}");
}

#[tokio::test]
async fn read_only_sql_is_executed() {
    let exec = executor(Warehouse::new());
    insert_rows(&exec, "hr_data", Table::Jobs, &[json!({"id": 1, "job": "Analyst"})])
        .await
        .unwrap();
    let answerer = CannedAnswerer::new("```sql\nSELECT * FROM hr_data.jobs\n```");

    let outcome = ask(&exec, &answerer, "hr_data", "List jobs").await.unwrap();
    assert_eq!(outcome.sql.as_deref(), Some("SELECT * FROM hr_data.jobs"));
    let result = outcome.result.expect("query should have run");
    assert_eq!(result.count, 1);
    assert!(outcome.sql_error.is_none());
}

#[tokio::test]
async fn write_sql_is_not_executed() {
    let exec = executor(Warehouse::new());
    insert_rows(&exec, "hr_data", Table::Jobs, &[json!({"id": 1, "job": "Analyst"})])
        .await
        .unwrap();
    let answerer = CannedAnswerer::new("```sql\nDELETE FROM hr_data.jobs\n```");

    let outcome = ask(&exec, &answerer, "hr_data", "Remove all jobs").await.unwrap();
    assert!(outcome.result.is_none());
    assert!(outcome.sql_error.unwrap().starts_with("not executed"));
    assert_eq!(exec.service().row_count(Table::Jobs), 1);
    assert!(!exec.service().statements().iter().any(|s| s.starts_with("DELETE")));
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let exec = executor(Warehouse::new());
    let answerer = CannedAnswerer::new("unused");
    let err = ask(&exec, &answerer, "hr_data", "  ").await.unwrap_err();
    assert!(matches!(err, HrError::Validation { .. }));
    assert!(exec.service().statements().is_empty());
}
