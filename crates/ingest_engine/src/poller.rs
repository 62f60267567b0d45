use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use ingest_logging::{ingest_debug, ingest_warn};
use serde::Deserialize;

use ingest_core::{ExecId, ExecutionRequest};

use crate::types::{EngineEvent, ExecutionApi};

const POLL_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ExecutionListPage {
    #[serde(default)]
    requests: Vec<ExecutionRequest>,
}

/// Fixed-interval poller for the execution-request endpoint.
///
/// Each `start` supersedes the previous loop by bumping a generation
/// counter; a response emits only while its generation is still current, so
/// late replies from a superseded session are discarded instead of applied.
pub struct ExecutionPoller {
    api: ExecutionApi,
    generation: Arc<AtomicU64>,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl ExecutionPoller {
    pub fn new(api: ExecutionApi, event_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            api,
            generation: Arc::new(AtomicU64::new(0)),
            event_tx,
        }
    }

    /// (Re)starts polling: an immediate fetch, then one per refresh
    /// interval. Ticks are fire-and-forget; a slow response never delays
    /// the next fetch, and polling is idempotent so overlap is harmless.
    pub fn start(&self, runtime: &tokio::runtime::Handle) {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.generation.clone();
        let api = self.api.clone();
        let event_tx = self.event_tx.clone();
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(api.refresh);
            loop {
                ticker.tick().await;
                if generation.load(Ordering::SeqCst) != my_generation {
                    break;
                }
                let api = api.clone();
                let event_tx = event_tx.clone();
                let generation = generation.clone();
                tokio::spawn(async move {
                    match fetch_requests(&api).await {
                        Ok(requests) => {
                            if generation.load(Ordering::SeqCst) == my_generation {
                                ingest_debug!(
                                    "execution request poll returned {} rows",
                                    requests.len()
                                );
                                let _ = event_tx.send(EngineEvent::RequestsRefreshed { requests });
                            }
                        }
                        Err(err) => {
                            // Transient blips are tolerated; the tracked
                            // list keeps its previous state.
                            ingest_warn!("execution request poll failed: {err}");
                        }
                    }
                });
            }
        });
    }

    /// Stops polling; any in-flight response is discarded by the
    /// generation guard.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Fire-and-forget server-side delete. Local state was already updated
    /// by the caller; a failure here is logged, never rolled back.
    pub fn delete(&self, runtime: &tokio::runtime::Handle, exec_id: ExecId) {
        let url = format!("{}/{}", self.api.url.trim_end_matches('/'), exec_id);
        runtime.spawn(async move {
            if let Err(err) = delete_request(&url).await {
                ingest_warn!("delete of execution request {exec_id} failed: {err}");
            }
        });
    }
}

async fn fetch_requests(api: &ExecutionApi) -> Result<Vec<ExecutionRequest>, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(POLL_REQUEST_TIMEOUT)
        .build()?;
    let mut query: Vec<(String, String)> =
        vec![("page_size".to_string(), api.page_size.to_string())];
    query.extend(api.params.iter().cloned());
    let page: ExecutionListPage = client
        .get(&api.url)
        .query(&query)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(page.requests)
}

async fn delete_request(url: &str) -> Result<(), reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(POLL_REQUEST_TIMEOUT)
        .build()?;
    client.delete(url).send().await?.error_for_status()?;
    Ok(())
}
