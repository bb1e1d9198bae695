use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::backend::{QueryService, StatementResult, StatementState};
use crate::error::HrError;
use crate::secrets::Credentials;
use crate::value::{Value, decode_field};
use crate::verbose::Timer;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_POLLS: u32 = 30;

/// Tabular result of a statement. `rows[i].len() == columns.len()` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResultSet {
    /// Build a result set, rejecting rows that are not aligned to `columns`.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, HrError> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(HrError::RemoteFailure {
                message: format!(
                    "malformed result: row {} has {} values for {} columns",
                    i,
                    row.len(),
                    columns.len()
                ),
            });
        }
        let count = rows.len();
        Ok(Self {
            columns,
            rows,
            count,
            message: None,
        })
    }

    /// Result of a statement that produced no result set.
    pub fn completed(message: impl Into<String>) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            count: 0,
            message: Some(message.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn decode(raw: StatementResult) -> Result<Self, HrError> {
        let columns = raw.columns.into_iter().map(|c| c.name).collect();
        let rows = raw
            .records
            .into_iter()
            .map(|record| record.into_iter().map(decode_field).collect())
            .collect();
        Self::new(columns, rows)
    }
}

/// How often and how long to poll a submitted statement.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_POLLS,
        }
    }
}

/// Runs one statement at a time: submit, poll until terminal, fetch and decode.
pub struct StatementExecutor<S> {
    service: S,
    credentials: Credentials,
    policy: PollPolicy,
}

impl<S: QueryService + Sync> StatementExecutor<S> {
    pub fn new(service: S, credentials: Credentials, policy: PollPolicy) -> Self {
        Self {
            service,
            credentials,
            policy,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run one statement to a terminal state.
    ///
    /// `FAILED`/`ABORTED` become [`HrError::RemoteFailure`]. When the poll budget
    /// runs out the statement is left running remotely and
    /// [`HrError::Timeout`] is returned; nothing is retried.
    pub async fn execute(&self, sql: &str) -> Result<ResultSet, HrError> {
        if sql.trim().is_empty() {
            return Err(HrError::invalid("SQL query is required"));
        }

        let timer = Timer::start();
        let handle = self.service.submit(sql, &self.credentials).await?;
        debug!(statement = %handle, "statement submitted");

        for attempt in 1..=self.policy.max_attempts {
            let status = self.service.describe(&handle).await?;
            match status.state {
                StatementState::Finished => {
                    let result = if status.has_result_set {
                        let raw = self.service.fetch(&handle).await?;
                        ResultSet::decode(raw)?
                    } else {
                        ResultSet::completed("Query executed successfully")
                    };
                    debug!(
                        statement = %handle,
                        polls = attempt,
                        rows = result.count,
                        elapsed_ms = timer.elapsed_ms() as u64,
                        "statement finished"
                    );
                    return Ok(result);
                }
                StatementState::Failed | StatementState::Aborted => {
                    debug!(statement = %handle, polls = attempt, state = ?status.state, "statement did not finish");
                    let detail = status.error.unwrap_or_else(|| "Unknown error".to_string());
                    let message = if status.state == StatementState::Aborted {
                        format!("Query aborted: {detail}")
                    } else {
                        format!("Query failed: {detail}")
                    };
                    return Err(HrError::RemoteFailure { message });
                }
                _ => {}
            }

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }

        tracing::warn!(statement = %handle, attempts = self.policy.max_attempts, "poll budget exhausted, statement left running");
        Err(HrError::Timeout {
            attempts: self.policy.max_attempts,
        })
    }
}
