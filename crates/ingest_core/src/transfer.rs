use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::batch::UploadId;
use crate::executions::ExecId;

/// Server acknowledgement of one accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub execution_id: ExecId,
    pub created: DateTime<Utc>,
}

/// Terminal state of one upload transfer. A failed entry never aborts its
/// siblings; mixed outcomes within a batch are a normal result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub upload_id: UploadId,
    pub result: Result<UploadReceipt, TransferFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferFailure {
    /// User aborted this transfer; suppressed from error display.
    #[error("canceled")]
    Canceled,
    #[error("http status {status}")]
    Http { status: u16, detail: Option<String> },
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("io error: {0}")]
    Io(String),
}
