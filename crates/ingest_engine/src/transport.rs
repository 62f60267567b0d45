use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use futures_util::Stream;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use ingest_core::{PendingUpload, TransferFailure, UploadId, UploadReceipt};

use crate::types::{EngineEvent, UploadApi};

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Upload bodies are chunked at this size so progress can be reported
    /// per chunk.
    pub chunk_size: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            chunk_size: 64 * 1024,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        entry: &PendingUpload,
        api: &UploadApi,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<UploadReceipt, TransferFailure>;
}

/// Successful upload acknowledgement body.
#[derive(Debug, Deserialize)]
struct UploadAccepted {
    execution_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestUploader {
    settings: TransportSettings,
}

impl ReqwestUploader {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, TransferFailure> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| TransferFailure::Network(err.to_string()))
    }

    async fn build_form(
        &self,
        entry: &PendingUpload,
        api: &UploadApi,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<reqwest::multipart::Form, TransferFailure> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in api.body.fields_for(entry) {
            form = form.text(name, value);
        }
        let PendingUpload::File(file) = entry else {
            return Ok(form);
        };
        // One part per accumulated extension; progress counts bytes pulled
        // off the shared counter across all parts of this entry.
        let total = file.total_size_bytes();
        let sent = Arc::new(AtomicU64::new(0));
        for ext in &file.extensions {
            let Some(handle) = file.files.get(ext) else {
                continue;
            };
            let bytes = tokio::fs::read(&handle.path)
                .await
                .map_err(|err| TransferFailure::Io(err.to_string()))?;
            let length = bytes.len() as u64;
            let stream = progress_stream(
                bytes,
                self.settings.chunk_size.max(1),
                total,
                sent.clone(),
                entry.id(),
                sink.clone(),
            );
            let part = reqwest::multipart::Part::stream_with_length(
                reqwest::Body::wrap_stream(stream),
                length,
            )
            .file_name(handle.name.clone());
            form = form.part(format!("{ext}_file"), part);
        }
        Ok(form)
    }
}

#[async_trait::async_trait]
impl Uploader for ReqwestUploader {
    async fn upload(
        &self,
        entry: &PendingUpload,
        api: &UploadApi,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<UploadReceipt, TransferFailure> {
        let client = self.build_client()?;
        let form = self.build_form(entry, api, sink).await?;
        let request = client.request(api.method.clone(), &api.url).multipart(form);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(TransferFailure::Canceled),
            result = request.send() => result.map_err(map_reqwest_error)?,
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.ok().filter(|text| !text.is_empty());
            return Err(TransferFailure::Http {
                status: status.as_u16(),
                detail,
            });
        }

        let accepted: UploadAccepted = response.json().await.map_err(map_reqwest_error)?;
        Ok(UploadReceipt {
            execution_id: accepted.execution_id,
            created: Utc::now(),
        })
    }
}

/// Chunks `bytes` and emits an `UploadProgress` event as each chunk is
/// pulled by the transport: `percent = floor(sent * 100 / total)`.
fn progress_stream(
    bytes: Vec<u8>,
    chunk_size: usize,
    total: u64,
    sent: Arc<AtomicU64>,
    upload_id: UploadId,
    sink: Arc<dyn ProgressSink>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let data = Bytes::from(bytes);
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..data.len().min(start + chunk_size)))
        .collect();
    futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
        let so_far = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
        let percent = if total == 0 {
            100
        } else {
            (so_far * 100 / total).min(100) as u8
        };
        sink.emit(EngineEvent::UploadProgress { upload_id, percent });
        Ok(chunk)
    }))
}

fn map_reqwest_error(err: reqwest::Error) -> TransferFailure {
    if err.is_timeout() {
        return TransferFailure::Timeout;
    }
    TransferFailure::Network(err.to_string())
}
