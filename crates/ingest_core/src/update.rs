use crate::batch::exceeds_size_limit;
use crate::{Effect, Msg, OperationState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: OperationState, msg: Msg) -> (OperationState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesAdded(files) => {
            if state.uploading || files.is_empty() {
                return (state, Vec::new());
            }
            state.add_files(files);
            Vec::new()
        }
        Msg::RemoteAdded { url, service_type } => {
            if state.uploading || !state.config.enable_remote_uploads {
                return (state, Vec::new());
            }
            state.add_remote(url, service_type);
            Vec::new()
        }
        Msg::UploadRemoved { upload_id } => {
            state.remove_upload(upload_id);
            Vec::new()
        }
        Msg::UploadChanged { upload } => {
            state.change_upload(upload);
            Vec::new()
        }
        Msg::SubmitClicked => {
            // At most one batch submission per controller instance.
            if state.uploading {
                return (state, Vec::new());
            }
            let entries = state.ready_entries();
            if entries.is_empty()
                || exceeds_size_limit(state.uploads(), state.config.max_allowed_size_mb)
                || supported_count(&state) > state.config.max_parallel_uploads
            {
                return (state, Vec::new());
            }
            state.begin_batch();
            vec![Effect::StartBatch { entries }]
        }
        Msg::CancelClicked { upload_ids } => {
            if upload_ids.is_empty() {
                return (state, Vec::new());
            }
            state.drop_progress(&upload_ids);
            vec![Effect::CancelTransfers { upload_ids }]
        }
        Msg::UploadProgress { upload_id, percent } => {
            state.apply_progress(upload_id, percent);
            Vec::new()
        }
        Msg::BatchSettled { outcomes } => {
            let any_success = state.apply_batch_settled(outcomes);
            if any_success {
                // Force an immediate poll so the transient rows reconcile
                // with server state as soon as possible.
                vec![Effect::RestartPolling]
            } else {
                Vec::new()
            }
        }
        Msg::RequestsRefreshed { requests } => {
            state.apply_requests_refresh(requests);
            Vec::new()
        }
        Msg::DeleteRequestClicked { exec_id } => {
            // Optimistic: the row disappears locally before the server
            // delete is even sent; a stale row resurfacing on the next poll
            // is tolerated.
            state.remove_request(&exec_id);
            vec![Effect::DeleteExecution { exec_id }]
        }
        Msg::ReloadClicked => {
            let mut effects: Vec<Effect> = state
                .take_all_requests()
                .into_iter()
                .map(|request| Effect::DeleteExecution {
                    exec_id: request.exec_id().to_string(),
                })
                .collect();
            effects.push(Effect::ReloadRequested);
            effects
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn supported_count(state: &OperationState) -> usize {
    state
        .uploads()
        .iter()
        .filter(|upload| upload.supported())
        .count()
}
