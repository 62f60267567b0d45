use crate::batch::{AddedFile, PendingUpload, UploadId};
use crate::executions::{ExecId, ExecutionRequest};
use crate::transfer::UploadOutcome;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User dropped or selected files.
    FilesAdded(Vec<AddedFile>),
    /// User added a remote-URL entry (usually blank, filled in by edits).
    RemoteAdded { url: String, service_type: String },
    /// User removed one pending entry.
    UploadRemoved { upload_id: UploadId },
    /// User edited one pending entry (URL text, remote type).
    UploadChanged { upload: PendingUpload },
    /// User triggered upload of all ready entries.
    SubmitClicked,
    /// User aborted the listed transfers.
    CancelClicked { upload_ids: Vec<UploadId> },
    /// Transport progress for one in-flight transfer.
    UploadProgress { upload_id: UploadId, percent: u8 },
    /// Every transfer of the in-flight batch has settled.
    BatchSettled { outcomes: Vec<UploadOutcome> },
    /// A poll response arrived from the execution-request endpoint.
    RequestsRefreshed { requests: Vec<ExecutionRequest> },
    /// User deleted one tracked execution row.
    DeleteRequestClicked { exec_id: ExecId },
    /// User dismissed the operation, discarding tracked rows.
    ReloadClicked,
    /// Fallback for placeholder wiring.
    NoOp,
}
