//! Ingest core: pure upload-batch validation, execution-request
//! bookkeeping, and the operation controller state machine.
mod batch;
mod effect;
mod executions;
mod formats;
mod msg;
mod remote;
mod state;
mod transfer;
mod update;
mod view_model;

pub use batch::{
    exceeds_size_limit, ingest_files, size_label, split_file_name, validate_files, AddedFile,
    FileHandle, FileUpload, PendingUpload, UploadId, MISSING_ALL,
};
pub use effect::Effect;
pub use executions::{
    merge_confirmed, ExecId, ExecutionRequest, ExecutionStatus, InputParams, OutputParams,
    OutputResource, TrackedRequest,
};
pub use formats::{FormatCatalog, FormatDescriptor};
pub use msg::Msg;
pub use remote::{
    is_valid_remote_url, remote_issue, url_extension, url_file_stem, validate_remote_entries,
    RemoteIssue, RemotePolicy, RemoteUpload, RemoteValidation,
};
pub use state::{OperationConfig, OperationState};
pub use transfer::{TransferFailure, UploadOutcome, UploadReceipt};
pub use update::update;
pub use view_model::{OperationViewModel, RequestRowView, SubmitBlock, UploadRowView};
