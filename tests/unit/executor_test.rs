use hrdata::backend::StatementState;
use hrdata::error::HrError;
use hrdata::executor::{PollPolicy, StatementExecutor};
use hrdata::value::{Value, WireField};

use crate::support::{ScriptedService, credentials, executor, fast_policy};

// --- Poll termination ---

#[tokio::test]
async fn finishes_after_n_plus_one_polls() {
    for running in [0usize, 1, 5, 29] {
        let exec = executor(ScriptedService::finishing_after(running));
        let result = exec.execute("SELECT 1").await.expect("should finish");
        assert_eq!(exec.service().describe_count(), running + 1, "running={running}");
        assert_eq!(exec.service().submit_count(), 1);
        assert_eq!(result.message.as_deref(), Some("Query executed successfully"));
    }
}

#[tokio::test]
async fn times_out_after_exactly_max_polls() {
    let exec = executor(ScriptedService::never_finishing());
    let err = exec.execute("SELECT 1").await.unwrap_err();
    assert!(matches!(err, HrError::Timeout { attempts: 30 }), "got {err:?}");
    assert_eq!(exec.service().describe_count(), 30);
    assert_eq!(exec.service().submit_count(), 1);
}

#[tokio::test]
async fn custom_poll_budget_is_respected() {
    let exec = StatementExecutor::new(
        ScriptedService::never_finishing(),
        credentials(),
        fast_policy(3),
    );
    let err = exec.execute("SELECT 1").await.unwrap_err();
    assert!(matches!(err, HrError::Timeout { attempts: 3 }));
    assert_eq!(exec.service().describe_count(), 3);
}

#[test]
fn default_policy_is_one_second_thirty_polls() {
    let policy = PollPolicy::default();
    assert_eq!(policy.interval.as_secs(), 1);
    assert_eq!(policy.max_attempts, 30);
}

// --- Terminal failures ---

#[tokio::test]
async fn failed_statement_is_remote_failure_with_detail() {
    let service = ScriptedService::new(vec![StatementState::Started, StatementState::Failed])
        .with_error("relation \"hr_data.nope\" does not exist");
    let exec = executor(service);
    let err = exec.execute("SELECT * FROM hr_data.nope").await.unwrap_err();
    match err {
        HrError::RemoteFailure { message } => {
            assert!(message.starts_with("Query failed:"), "{message}");
            assert!(message.contains("does not exist"));
        }
        other => panic!("expected RemoteFailure, got {other:?}"),
    }
    assert_eq!(exec.service().fetch_count(), 0);
}

#[tokio::test]
async fn aborted_statement_is_distinguished() {
    let exec = executor(ScriptedService::new(vec![StatementState::Aborted]));
    let err = exec.execute("SELECT 1").await.unwrap_err();
    match err {
        HrError::RemoteFailure { message } => {
            assert_eq!(message, "Query aborted: Unknown error");
        }
        other => panic!("expected RemoteFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_sql_is_rejected_without_submitting() {
    let exec = executor(ScriptedService::finishing_after(0));
    let err = exec.execute("   ").await.unwrap_err();
    assert!(matches!(err, HrError::Validation { .. }));
    assert_eq!(exec.service().submit_count(), 0);
}

// --- Result decoding ---

#[tokio::test]
async fn result_rows_are_decoded_per_tag() {
    let service = ScriptedService::finishing_after(2).with_result(
        &["id", "name", "score", "active", "note", "raw"],
        vec![vec![
            WireField::Long(42),
            WireField::String("Ana".to_string()),
            WireField::Double(1.5),
            WireField::Boolean(true),
            WireField::IsNull,
            WireField::Unsupported {
                tag: "blobValue".to_string(),
                text: "BlobValue(Blob { inner: [1, 2] })".to_string(),
            },
        ]],
    );
    let exec = executor(service);
    let result = exec.execute("SELECT * FROM t").await.unwrap();

    assert_eq!(result.columns, vec!["id", "name", "score", "active", "note", "raw"]);
    assert_eq!(result.count, 1);
    assert_eq!(
        result.rows[0],
        vec![
            Value::Int(42),
            Value::Text("Ana".to_string()),
            Value::Float(1.5),
            Value::Bool(true),
            Value::Null,
            Value::Text("BlobValue(Blob { inner: [1, 2] })".to_string()),
        ]
    );
    assert_eq!(exec.service().fetch_count(), 1);
}

#[tokio::test]
async fn finished_with_empty_result_set_is_empty_not_error() {
    let service = ScriptedService::finishing_after(0).with_result(&["department"], Vec::new());
    let exec = executor(service);
    let result = exec.execute("SELECT department FROM t").await.unwrap();
    assert!(result.is_empty());
    assert_eq!(result.count, 0);
    assert_eq!(result.columns, vec!["department"]);
}

#[tokio::test]
async fn misaligned_record_is_remote_failure() {
    let service = ScriptedService::finishing_after(0)
        .with_result(&["a", "b"], vec![vec![WireField::Long(1)]]);
    let exec = executor(service);
    let err = exec.execute("SELECT a, b FROM t").await.unwrap_err();
    assert!(matches!(err, HrError::RemoteFailure { .. }));
}
