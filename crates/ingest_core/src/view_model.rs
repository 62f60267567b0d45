use chrono::{DateTime, Utc};

use crate::batch::{exceeds_size_limit, size_label, PendingUpload, UploadId};
use crate::executions::{ExecId, ExecutionStatus};
use crate::remote::{remote_issue, RemoteIssue};
use crate::state::OperationState;
use crate::transfer::TransferFailure;

/// Why the submit action is blocked for the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlock {
    ExceedsSize { limit_mb: u64 },
    TooManyParallel { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationViewModel {
    pub uploads: Vec<UploadRowView>,
    /// `base.ext` labels of rejected file entries, for the inline alert.
    pub unsupported_labels: Vec<String>,
    pub ready_count: usize,
    pub uploading: bool,
    pub busy: bool,
    pub can_add: bool,
    pub can_submit: bool,
    pub submit_block: Option<SubmitBlock>,
    pub requests: Vec<RequestRowView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRowView {
    pub upload_id: UploadId,
    pub name: String,
    pub supported: bool,
    pub ready: bool,
    pub missing_extensions: Vec<String>,
    pub size_label: Option<String>,
    pub percent: Option<u8>,
    pub error: Option<String>,
    pub issue: Option<RemoteIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRowView {
    pub exec_id: ExecId,
    pub name: Option<String>,
    pub created: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub transient: bool,
    pub log: Option<String>,
    pub detail_urls: Vec<String>,
}

impl OperationState {
    pub fn view(&self) -> OperationViewModel {
        let ready_count = self.uploads.iter().filter(|u| u.ready()).count();
        let supported_count = self.uploads.iter().filter(|u| u.supported()).count();

        let submit_block = if !self.uploads.is_empty()
            && exceeds_size_limit(&self.uploads, self.config.max_allowed_size_mb)
        {
            Some(SubmitBlock::ExceedsSize {
                limit_mb: self.config.max_allowed_size_mb,
            })
        } else if supported_count > self.config.max_parallel_uploads {
            Some(SubmitBlock::TooManyParallel {
                limit: self.config.max_parallel_uploads,
            })
        } else {
            None
        };

        let uploads = self
            .uploads
            .iter()
            .filter(|upload| match upload {
                // Rejected file entries surface only in the alert labels.
                PendingUpload::File(file) => file.supported,
                PendingUpload::Remote(_) => true,
            })
            .map(|upload| self.upload_row(upload))
            .collect();

        let unsupported_labels = self
            .uploads
            .iter()
            .filter_map(|upload| match upload {
                PendingUpload::File(file) if !file.supported => Some(format!(
                    "{}.{}",
                    file.base_name,
                    file.extensions.first().map(String::as_str).unwrap_or("")
                )),
                _ => None,
            })
            .collect();

        let requests = self
            .requests
            .iter()
            .map(|tracked| {
                let request = tracked.request();
                RequestRowView {
                    exec_id: request.exec_id.clone(),
                    name: request.name.clone(),
                    created: request.created,
                    status: request.status,
                    transient: tracked.is_transient(),
                    log: request.log.clone(),
                    detail_urls: request
                        .detail_urls()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                }
            })
            .collect();

        OperationViewModel {
            uploads,
            unsupported_labels,
            ready_count,
            uploading: self.uploading,
            busy: self.busy,
            can_add: !self.uploading
                && !self.busy
                && ready_count < self.config.max_parallel_uploads,
            can_submit: !self.uploading
                && !self.busy
                && ready_count > 0
                && submit_block.is_none(),
            submit_block,
            requests,
            dirty: self.dirty,
        }
    }

    fn upload_row(&self, upload: &PendingUpload) -> UploadRowView {
        let error = match self.errors.get(&upload.id()) {
            // Cancellation is a terminal state, not a displayed error.
            Some(TransferFailure::Canceled) | None => None,
            Some(failure) => Some(failure.to_string()),
        };
        let (missing_extensions, size, issue) = match upload {
            PendingUpload::File(file) => (
                file.missing_extensions.clone(),
                Some(size_label(file.total_size_bytes())),
                None,
            ),
            // Issues surface only once the user touched the entry; a
            // freshly added blank row shows no badge yet.
            PendingUpload::Remote(remote) => (
                Vec::new(),
                None,
                remote.edited.then(|| remote_issue(remote)).flatten(),
            ),
        };
        UploadRowView {
            upload_id: upload.id(),
            name: upload.display_name(),
            supported: upload.supported(),
            ready: upload.ready(),
            missing_extensions,
            size_label: size,
            percent: self.progress.get(&upload.id()).copied(),
            error,
            issue,
        }
    }
}
