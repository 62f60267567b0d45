use std::collections::{BTreeMap, BTreeSet};

use crate::batch::{ingest_files, validate_files, AddedFile, PendingUpload, UploadId};
use crate::executions::{
    merge_confirmed, ExecutionRequest, ExecutionStatus, InputParams, OutputParams, TrackedRequest,
};
use crate::formats::FormatDescriptor;
use crate::remote::{validate_remote_entries, RemotePolicy, RemoteUpload};
use crate::transfer::{TransferFailure, UploadOutcome};

/// Session-immutable controller configuration, resolved from the
/// application configuration before the operation view opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationConfig {
    pub formats: Vec<FormatDescriptor>,
    /// Extension and service-type whitelists for remote entries.
    pub remote_policy: RemotePolicy,
    pub max_parallel_uploads: usize,
    pub max_allowed_size_mb: u64,
    pub enable_remote_uploads: bool,
    /// When set, a running execution of the configured action keeps the
    /// controller busy until completion.
    pub blocking: bool,
    pub action: Option<String>,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            formats: Vec::new(),
            remote_policy: RemotePolicy::default(),
            max_parallel_uploads: 5,
            max_allowed_size_mb: 100,
            enable_remote_uploads: false,
            blocking: false,
            action: None,
        }
    }
}

/// Client-side state of one upload operation session.
///
/// The pending batch is owned here and never persisted; the tracked request
/// list is a cache of server state refreshed by the poller.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationState {
    pub(crate) config: OperationConfig,
    pub(crate) uploads: Vec<PendingUpload>,
    pub(crate) next_upload_id: UploadId,
    pub(crate) progress: BTreeMap<UploadId, u8>,
    pub(crate) errors: BTreeMap<UploadId, TransferFailure>,
    pub(crate) completed: BTreeSet<UploadId>,
    pub(crate) requests: Vec<TrackedRequest>,
    pub(crate) uploading: bool,
    pub(crate) busy: bool,
    pub(crate) dirty: bool,
}

impl OperationState {
    pub fn new(config: OperationConfig) -> Self {
        Self {
            config,
            uploads: Vec::new(),
            next_upload_id: 1,
            progress: BTreeMap::new(),
            errors: BTreeMap::new(),
            completed: BTreeSet::new(),
            requests: Vec::new(),
            uploading: false,
            busy: false,
            dirty: false,
        }
    }

    pub fn config(&self) -> &OperationConfig {
        &self.config
    }

    pub fn uploads(&self) -> &[PendingUpload] {
        &self.uploads
    }

    pub fn requests(&self) -> &[TrackedRequest] {
        &self.requests
    }

    pub fn progress(&self) -> &BTreeMap<UploadId, u8> {
        &self.progress
    }

    pub fn errors(&self) -> &BTreeMap<UploadId, TransferFailure> {
        &self.errors
    }

    pub fn completed(&self) -> &BTreeSet<UploadId> {
        &self.completed
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Returns whether the state changed since the last call, and resets
    /// the flag.
    pub fn consume_dirty(&mut self) -> bool {
        let dirty = self.dirty;
        self.dirty = false;
        dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn add_files(&mut self, files: Vec<AddedFile>) {
        let incoming: Vec<(UploadId, AddedFile)> = files
            .into_iter()
            .map(|file| (self.allocate_upload_id(), file))
            .collect();
        let batch = std::mem::take(&mut self.uploads);
        let batch = ingest_files(batch, incoming, &self.config.formats);
        let batch = validate_files(batch, &self.config.formats);
        self.uploads = validate_remote_entries(batch, &self.config.remote_policy);
        self.mark_dirty();
    }

    pub(crate) fn add_remote(&mut self, url: String, service_type: String) {
        let id = self.allocate_upload_id();
        self.uploads
            .push(PendingUpload::Remote(RemoteUpload::new(id, url, service_type)));
        self.revalidate_remote();
        self.mark_dirty();
    }

    pub(crate) fn remove_upload(&mut self, upload_id: UploadId) {
        self.uploads.retain(|upload| upload.id() != upload_id);
        // File rejection is irreversible by design, so only the remote
        // validation (duplicate bookkeeping) is re-run here.
        self.revalidate_remote();
        self.mark_dirty();
    }

    pub(crate) fn change_upload(&mut self, changed: PendingUpload) {
        for upload in &mut self.uploads {
            if upload.id() == changed.id() {
                *upload = changed;
                break;
            }
        }
        self.revalidate_remote();
        self.mark_dirty();
    }

    pub(crate) fn ready_entries(&self) -> Vec<PendingUpload> {
        self.uploads
            .iter()
            .filter(|upload| upload.ready())
            .cloned()
            .collect()
    }

    pub(crate) fn begin_batch(&mut self) {
        self.uploading = true;
        self.progress.clear();
        self.errors.clear();
        self.mark_dirty();
    }

    pub(crate) fn drop_progress(&mut self, upload_ids: &[UploadId]) {
        for upload_id in upload_ids {
            self.progress.remove(upload_id);
        }
        self.mark_dirty();
    }

    pub(crate) fn apply_progress(&mut self, upload_id: UploadId, percent: u8) {
        // A late event after settle must not resurrect a progress bar.
        if self.uploading {
            self.progress.insert(upload_id, percent.min(100));
            self.mark_dirty();
        }
    }

    /// Applies the full result set of a settled batch. Returns whether any
    /// entry succeeded.
    pub(crate) fn apply_batch_settled(&mut self, outcomes: Vec<UploadOutcome>) -> bool {
        let mut succeeded: Vec<UploadId> = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(receipt) => {
                    let name = self
                        .uploads
                        .iter()
                        .find(|upload| upload.id() == outcome.upload_id)
                        .map(|upload| upload.display_name());
                    self.requests.insert(
                        0,
                        TrackedRequest::Transient(ExecutionRequest {
                            exec_id: receipt.execution_id,
                            name,
                            created: receipt.created,
                            status: ExecutionStatus::Running,
                            log: None,
                            input_params: InputParams {
                                action: self.config.action.clone(),
                            },
                            output_params: OutputParams::default(),
                        }),
                    );
                    self.completed.insert(outcome.upload_id);
                    succeeded.push(outcome.upload_id);
                }
                Err(failure) => {
                    self.errors.insert(outcome.upload_id, failure);
                }
            }
        }
        // Succeeded entries move into execution-request space.
        self.uploads.retain(|upload| !succeeded.contains(&upload.id()));
        self.revalidate_remote();
        self.uploading = false;
        let any_success = !succeeded.is_empty();
        if any_success && self.config.blocking {
            self.busy = true;
        }
        self.mark_dirty();
        any_success
    }

    pub(crate) fn apply_requests_refresh(&mut self, server_rows: Vec<ExecutionRequest>) {
        let tracked = std::mem::take(&mut self.requests);
        self.requests = merge_confirmed(tracked, server_rows);
        self.recompute_busy();
        self.mark_dirty();
    }

    pub(crate) fn remove_request(&mut self, exec_id: &str) {
        self.requests.retain(|request| request.exec_id() != exec_id);
        self.recompute_busy();
        self.mark_dirty();
    }

    pub(crate) fn take_all_requests(&mut self) -> Vec<TrackedRequest> {
        let requests = std::mem::take(&mut self.requests);
        self.recompute_busy();
        self.mark_dirty();
        requests
    }

    fn recompute_busy(&mut self) {
        self.busy = self.config.blocking
            && self.requests.iter().any(|request| {
                request.request().status == ExecutionStatus::Running
                    && match self.config.action.as_deref() {
                        None => true,
                        Some(action) => request.request().action() == Some(action),
                    }
            });
    }

    fn revalidate_remote(&mut self) {
        let batch = std::mem::take(&mut self.uploads);
        self.uploads = validate_remote_entries(batch, &self.config.remote_policy);
    }

    fn allocate_upload_id(&mut self) -> UploadId {
        let id = self.next_upload_id;
        self.next_upload_id += 1;
        id
    }
}
