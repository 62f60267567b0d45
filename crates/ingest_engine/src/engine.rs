use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use ingest_logging::{ingest_info, ingest_warn};
use tokio_util::sync::CancellationToken;

use ingest_core::{ExecId, PendingUpload, UploadId, UploadOutcome};

use crate::poller::ExecutionPoller;
use crate::transport::{ChannelProgressSink, ProgressSink, ReqwestUploader, TransportSettings, Uploader};
use crate::types::{ApiConfig, EngineEvent, UploadApi};

enum EngineCommand {
    SubmitBatch { entries: Vec<PendingUpload> },
    CancelUploads { upload_ids: Vec<UploadId> },
    RestartPolling,
    StopPolling,
    DeleteExecution { exec_id: ExecId },
}

/// Owns a tokio runtime on a dedicated thread and runs all IO for one
/// operation session: upload transfers, execution polling, deletes.
///
/// Cancellation tokens and the in-flight flag live here, scoped to this
/// instance; dropping the handle ends the command loop and the generation
/// guard silences any still-pending poll response.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(api: ApiConfig, settings: TransportSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let uploader = Arc::new(ReqwestUploader::new(settings));
            let upload_api = Arc::new(api.upload);
            let sink: Arc<dyn ProgressSink> =
                Arc::new(ChannelProgressSink::new(event_tx.clone()));
            let poller = ExecutionPoller::new(api.executions, event_tx.clone());
            let in_flight = Arc::new(AtomicBool::new(false));
            // Tokens of the current batch only; replaced wholesale on the
            // next submission.
            let mut cancel_tokens: HashMap<UploadId, CancellationToken> = HashMap::new();

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::SubmitBatch { entries } => {
                        if in_flight.swap(true, Ordering::SeqCst) {
                            ingest_warn!("batch submission ignored: one already in flight");
                            continue;
                        }
                        ingest_info!("dispatching batch of {} uploads", entries.len());
                        cancel_tokens.clear();
                        for entry in &entries {
                            cancel_tokens.insert(entry.id(), CancellationToken::new());
                        }
                        let tokens: HashMap<UploadId, CancellationToken> = cancel_tokens.clone();
                        runtime.spawn(run_batch(
                            uploader.clone(),
                            upload_api.clone(),
                            entries,
                            tokens,
                            sink.clone(),
                            in_flight.clone(),
                            event_tx.clone(),
                        ));
                    }
                    EngineCommand::CancelUploads { upload_ids } => {
                        for upload_id in upload_ids {
                            if let Some(token) = cancel_tokens.get(&upload_id) {
                                ingest_info!("canceling upload {upload_id}");
                                token.cancel();
                            }
                        }
                    }
                    EngineCommand::RestartPolling => {
                        poller.start(runtime.handle());
                    }
                    EngineCommand::StopPolling => {
                        poller.stop();
                    }
                    EngineCommand::DeleteExecution { exec_id } => {
                        poller.delete(runtime.handle(), exec_id);
                    }
                }
            }
        });

        Self { cmd_tx, event_rx }
    }

    /// Dispatches the ready entries as one batch. Ignored while a batch is
    /// already in flight.
    pub fn submit(&self, entries: Vec<PendingUpload>) {
        let _ = self.cmd_tx.send(EngineCommand::SubmitBatch { entries });
    }

    /// Aborts exactly the listed transfers; siblings keep running.
    pub fn cancel(&self, upload_ids: Vec<UploadId>) {
        let _ = self.cmd_tx.send(EngineCommand::CancelUploads { upload_ids });
    }

    /// Starts polling, or restarts it for an immediate refresh.
    pub fn restart_polling(&self) {
        let _ = self.cmd_tx.send(EngineCommand::RestartPolling);
    }

    pub fn stop_polling(&self) {
        let _ = self.cmd_tx.send(EngineCommand::StopPolling);
    }

    pub fn delete_execution(&self, exec_id: ExecId) {
        let _ = self.cmd_tx.send(EngineCommand::DeleteExecution { exec_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

/// Dispatches every entry before awaiting any of them; the result set is
/// delivered once all have settled, mixed outcomes included.
async fn run_batch(
    uploader: Arc<ReqwestUploader>,
    api: Arc<UploadApi>,
    entries: Vec<PendingUpload>,
    tokens: HashMap<UploadId, CancellationToken>,
    sink: Arc<dyn ProgressSink>,
    in_flight: Arc<AtomicBool>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let transfers = entries.into_iter().map(|entry| {
        let uploader = uploader.clone();
        let api = api.clone();
        let sink = sink.clone();
        let cancel = tokens.get(&entry.id()).cloned().unwrap_or_default();
        async move {
            let result = uploader.upload(&entry, &api, sink, cancel).await;
            if let Err(failure) = &result {
                ingest_warn!("upload {} failed: {failure}", entry.id());
            }
            UploadOutcome {
                upload_id: entry.id(),
                result,
            }
        }
    });
    let outcomes = futures_util::future::join_all(transfers).await;
    // Cleared regardless of outcome; there is no automatic retry.
    in_flight.store(false, Ordering::SeqCst);
    let _ = event_tx.send(EngineEvent::BatchSettled { outcomes });
}
