//! Ingest engine: upload transport, execution polling, and effect
//! execution behind a channel-based handle.
mod engine;
mod payload;
mod poller;
mod transport;
mod types;

pub use engine::EngineHandle;
pub use payload::{BodyConfig, BodyField, FieldSource};
pub use poller::ExecutionPoller;
pub use transport::{
    ChannelProgressSink, ProgressSink, ReqwestUploader, TransportSettings, Uploader,
};
pub use types::{ApiConfig, EngineEvent, ExecutionApi, UploadApi};
