use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub type ExecId = String;

/// Server-side lifecycle of an asynchronous ingestion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Queued,
    Running,
    Finished,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct InputParams {
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OutputParams {
    #[serde(default)]
    pub resources: Vec<OutputResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputResource {
    #[serde(default)]
    pub detail_url: Option<String>,
}

/// One server-tracked execution request row, wire-shaped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutionRequest {
    pub exec_id: ExecId,
    #[serde(default)]
    pub name: Option<String>,
    pub created: DateTime<Utc>,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub input_params: InputParams,
    #[serde(default)]
    pub output_params: OutputParams,
}

impl ExecutionRequest {
    pub fn action(&self) -> Option<&str> {
        self.input_params.action.as_deref()
    }

    pub fn detail_urls(&self) -> Vec<&str> {
        self.output_params
            .resources
            .iter()
            .filter_map(|resource| resource.detail_url.as_deref())
            .collect()
    }
}

/// A tracked request is either a client-synthesized placeholder shown right
/// after a successful upload submission, or a row the server has confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedRequest {
    Transient(ExecutionRequest),
    Confirmed(ExecutionRequest),
}

impl TrackedRequest {
    pub fn exec_id(&self) -> &str {
        &self.request().exec_id
    }

    pub fn request(&self) -> &ExecutionRequest {
        match self {
            TrackedRequest::Transient(request) | TrackedRequest::Confirmed(request) => request,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, TrackedRequest::Transient(_))
    }
}

/// Applies one poll response to the tracked list.
///
/// Server rows fully replace the confirmed subset, in server order. A
/// transient placeholder survives only until a confirmed row with the same
/// identity appears; at that moment the server copy silently takes over, so
/// each identity occurs at most once in the result.
pub fn merge_confirmed(
    tracked: Vec<TrackedRequest>,
    server_rows: Vec<ExecutionRequest>,
) -> Vec<TrackedRequest> {
    let confirmed_ids: BTreeSet<&str> = server_rows
        .iter()
        .map(|request| request.exec_id.as_str())
        .collect();
    let survivors: Vec<TrackedRequest> = tracked
        .into_iter()
        .filter(|request| {
            request.is_transient() && !confirmed_ids.contains(request.exec_id())
        })
        .collect();
    server_rows
        .into_iter()
        .map(TrackedRequest::Confirmed)
        .chain(survivors)
        .collect()
}
