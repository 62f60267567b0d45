use std::time::Duration;

use ingest_core::{ExecutionRequest, UploadId, UploadOutcome};

use crate::payload::BodyConfig;

/// Events flowing from the engine back to the host loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Transport progress for one in-flight transfer, 0-100.
    UploadProgress { upload_id: UploadId, percent: u8 },
    /// Every transfer of the dispatched batch has settled, mixed outcomes
    /// included.
    BatchSettled { outcomes: Vec<UploadOutcome> },
    /// A poll of the execution-request endpoint succeeded.
    RequestsRefreshed { requests: Vec<ExecutionRequest> },
}

/// Upload endpoint configuration.
#[derive(Debug, Clone)]
pub struct UploadApi {
    pub url: String,
    pub method: reqwest::Method,
    pub body: BodyConfig,
}

impl UploadApi {
    pub fn new(url: impl Into<String>, body: BodyConfig) -> Self {
        Self {
            url: url.into(),
            method: reqwest::Method::POST,
            body,
        }
    }
}

/// Execution-request endpoint configuration.
#[derive(Debug, Clone)]
pub struct ExecutionApi {
    pub url: String,
    /// Extra query parameters, e.g. action and resource filters.
    pub params: Vec<(String, String)>,
    pub page_size: u32,
    pub refresh: Duration,
}

impl ExecutionApi {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
            page_size: 9999,
            refresh: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub upload: UploadApi,
    pub executions: ExecutionApi,
}
