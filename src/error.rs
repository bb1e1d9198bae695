use thiserror::Error;

#[derive(Debug, Error)]
pub enum HrError {
    #[error("validation: {}", reasons.join("; "))]
    Validation { reasons: Vec<String> },

    #[error("remote: {message}")]
    RemoteFailure { message: String },

    #[error("timeout: statement still running after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error(
        "partial restore: {table} emptied, {chunks_applied}/{chunks_total} chunks ({rows_applied} rows) re-inserted before failure: {cause}"
    )]
    PartialRestore {
        table: String,
        chunks_applied: usize,
        chunks_total: usize,
        rows_applied: usize,
        cause: String,
    },

    #[error("config: {message}")]
    Config { message: String },

    #[error("connection: {message}")]
    Connection { message: String },

    #[error("storage: {message}")]
    Storage { message: String },

    #[error("snapshot: {message}")]
    Snapshot { message: String },

    #[error("answer: {message}")]
    Answer { message: String },

    #[error("format: {message}")]
    Format { message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl HrError {
    /// Single-message validation failure.
    pub fn invalid(reason: impl Into<String>) -> Self {
        HrError::Validation {
            reasons: vec![reason.into()],
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HrError::NotFound {
            message: message.into(),
        }
    }
}
