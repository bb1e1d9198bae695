pub mod redshift_data;

use crate::error::HrError;
use crate::secrets::Credentials;
use crate::value::WireField;

/// Opaque identifier the query service issues for one submitted statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementHandle(pub String);

impl std::fmt::Display for StatementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state reported by the query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementState {
    Submitted,
    Picked,
    Started,
    Finished,
    Failed,
    Aborted,
    Other(String),
}

impl StatementState {
    pub fn parse(s: &str) -> Self {
        match s {
            "SUBMITTED" => StatementState::Submitted,
            "PICKED" => StatementState::Picked,
            "STARTED" => StatementState::Started,
            "FINISHED" => StatementState::Finished,
            "FAILED" => StatementState::Failed,
            "ABORTED" => StatementState::Aborted,
            other => StatementState::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StatementState::Finished | StatementState::Failed | StatementState::Aborted
        )
    }
}

/// Result of one status poll.
#[derive(Debug, Clone)]
pub struct StatementDescription {
    pub state: StatementState,
    pub has_result_set: bool,
    pub error: Option<String>,
}

/// Metadata for a single result column.
#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub name: String,
    pub type_name: String,
}

/// Raw, still-tagged result of a finished statement.
#[derive(Debug, Clone, Default)]
pub struct StatementResult {
    pub columns: Vec<ColumnMeta>,
    pub records: Vec<Vec<WireField>>,
}

/// Submit-then-poll SQL execution service.
pub trait QueryService {
    fn submit(
        &self,
        sql: &str,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<StatementHandle, HrError>> + Send;

    fn describe(
        &self,
        handle: &StatementHandle,
    ) -> impl std::future::Future<Output = Result<StatementDescription, HrError>> + Send;

    fn fetch(
        &self,
        handle: &StatementHandle,
    ) -> impl std::future::Future<Output = Result<StatementResult, HrError>> + Send;
}
