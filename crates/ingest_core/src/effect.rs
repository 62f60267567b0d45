use crate::batch::{PendingUpload, UploadId};
use crate::executions::ExecId;

/// IO requested by `update`; executed by the engine, never by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Dispatch one transfer per entry, all before any is awaited.
    StartBatch { entries: Vec<PendingUpload> },
    /// Abort exactly these transfers; siblings keep running.
    CancelTransfers { upload_ids: Vec<UploadId> },
    /// Fire-and-forget server-side delete of one execution row.
    DeleteExecution { exec_id: ExecId },
    /// Supersede the current polling loop and fetch immediately.
    RestartPolling,
    /// Host should tear the operation view down (and reload if configured).
    ReloadRequested,
}
