use std::sync::mpsc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ingest_core::ExecutionStatus;
use ingest_engine::{EngineEvent, ExecutionApi, ExecutionPoller};

fn fast_api(server: &MockServer) -> ExecutionApi {
    ExecutionApi {
        refresh: Duration::from_millis(100),
        params: vec![("action".to_string(), "upload".to_string())],
        ..ExecutionApi::new(format!("{}/executions", server.uri()))
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn polling_fetches_and_emits_the_request_page() {
    ingest_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/executions"))
        .and(query_param("page_size", "9999"))
        .and(query_param("action", "upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "requests": [{
                "exec_id": "3f9d",
                "name": "roads.zip",
                "created": "2026-03-01T12:00:00Z",
                "status": "running"
            }]
        })))
        .mount(&server)
        .await;

    let (tx, rx) = mpsc::channel();
    let poller = ExecutionPoller::new(fast_api(&server), tx);
    poller.start(&tokio::runtime::Handle::current());

    let event = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
        .unwrap();
    let EngineEvent::RequestsRefreshed { requests } = event else {
        panic!("expected a refresh event, got {event:?}");
    };
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].exec_id, "3f9d");
    assert_eq!(requests[0].status, ExecutionStatus::Running);
    poller.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_discards_responses_already_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/executions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(200))
                .set_body_json(serde_json::json!({ "requests": [] })),
        )
        .mount(&server)
        .await;

    let (tx, rx) = mpsc::channel();
    let poller = ExecutionPoller::new(fast_api(&server), tx);
    poller.start(&tokio::runtime::Handle::current());
    // The first tick's fetch is pending behind the response delay; stopping
    // now supersedes its generation, so the reply must be swallowed.
    poller.stop();

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn restart_supersedes_the_previous_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/executions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "requests": []
        })))
        .mount(&server)
        .await;

    let (tx, rx) = mpsc::channel();
    let poller = ExecutionPoller::new(fast_api(&server), tx);
    let handle = tokio::runtime::Handle::current();
    poller.start(&handle);
    poller.start(&handle);

    // Both generations raced over the first ticks, but only the newest may
    // still be emitting by now.
    tokio::time::sleep(Duration::from_millis(350)).await;
    while rx.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(350)).await;
    let drained = std::iter::from_fn(|| rx.try_recv().ok()).count();
    // One loop at 100ms refresh produces at most four ticks in 350ms.
    assert!(drained >= 1 && drained <= 5, "saw {drained} refreshes");
    poller.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn poll_failures_emit_nothing_and_polling_continues() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/executions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/executions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "requests": []
        })))
        .mount(&server)
        .await;

    let (tx, rx) = mpsc::channel();
    let poller = ExecutionPoller::new(fast_api(&server), tx);
    poller.start(&tokio::runtime::Handle::current());

    // The failed first tick is skipped; the second tick comes through.
    let event = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event, EngineEvent::RequestsRefreshed { requests: vec![] });
    poller.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_fires_one_request_and_forgets() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/executions/3f9d"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (tx, _rx) = mpsc::channel();
    let poller = ExecutionPoller::new(fast_api(&server), tx);
    poller.delete(&tokio::runtime::Handle::current(), "3f9d".to_string());

    tokio::time::sleep(Duration::from_millis(300)).await;
    // expect(1) verifies on server drop.
}
