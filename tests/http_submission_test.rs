//! End-to-end submission over real HTTP
//!
//! This test suite mocks:
//! - The feedback collection endpoint (warp)
//!
//! and exercises the reqwest-backed proxy-aware connection factory.

use anonymous_feedback::task::{
    BackgroundScheduler, FeedbackSubmissionTask, ProgressIndicator, TaskProgress, TaskState,
    TokioScheduler,
};
use anonymous_feedback::transport::{ProxyHttpConnectionFactory, ProxySettings};
use anonymous_feedback::{send_feedback, ErrorReport, FeedbackError, FeedbackParameters};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Raw request bodies received by the mock endpoint
type Capture = Arc<Mutex<Vec<String>>>;

/// Mock feedback endpoint for testing
struct MockFeedbackServer {
    addr: SocketAddr,
    received: Capture,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockFeedbackServer {
    /// Start a mock endpoint on an ephemeral localhost port
    async fn start() -> Self {
        use warp::Filter;

        let received: Capture = Arc::new(Mutex::new(Vec::new()));
        let received_filter = received.clone();

        let report_route = warp::post()
            .and(warp::path("report"))
            .and(warp::path::end())
            .and(warp::header::exact(
                "content-type",
                "application/x-www-form-urlencoded",
            ))
            .and(warp::body::bytes())
            .map(move |body: warp::hyper::body::Bytes| {
                let body = String::from_utf8_lossy(&body).to_string();
                received_filter.lock().unwrap().push(body);
                warp::reply::with_status(
                    warp::reply::json(&json!({"number": 1337, "state": "open"})),
                    warp::http::StatusCode::CREATED,
                )
            });

        let broken_route = warp::post()
            .and(warp::path("broken"))
            .map(|| {
                warp::reply::with_status(
                    "feedback service unavailable",
                    warp::http::StatusCode::SERVICE_UNAVAILABLE,
                )
            });

        let plain_route = warp::post()
            .and(warp::path("plain"))
            .map(|| "2024");

        let routes = report_route.or(broken_route).or(plain_route);

        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        let server_handle = tokio::spawn(server);

        Self {
            addr,
            received,
            server_handle: Some(server_handle),
        }
    }

    /// Get the URL for a path on the server
    fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path)
    }

    fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    /// Stop the mock server
    async fn stop(mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}

fn direct_factory() -> ProxyHttpConnectionFactory {
    ProxyHttpConnectionFactory::new(ProxySettings {
        use_system_proxy: false,
        timeout_ms: Some(5000),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_send_feedback_returns_issue_number() {
    let server = MockFeedbackServer::start().await;
    let params = FeedbackParameters::new()
        .with("error_message", "NPE at Foo.java:10")
        .with("plugin_version", "2.1.0");

    let token = send_feedback(&direct_factory(), &server.url("report"), &params)
        .await
        .unwrap();

    assert_eq!(token, 1337);
    assert_eq!(
        server.received(),
        vec!["error_message=NPE+at+Foo.java%3A10&plugin_version=2.1.0".to_string()]
    );

    server.stop().await;
}

#[tokio::test]
async fn test_plain_integer_body() {
    let server = MockFeedbackServer::start().await;

    let token = send_feedback(&direct_factory(), &server.url("plain"), &FeedbackParameters::new())
        .await
        .unwrap();

    assert_eq!(token, 2024);
    server.stop().await;
}

#[tokio::test]
async fn test_error_status_is_protocol_error() {
    let server = MockFeedbackServer::start().await;

    let err = send_feedback(&direct_factory(), &server.url("broken"), &FeedbackParameters::new())
        .await
        .unwrap_err();

    match err {
        FeedbackError::Protocol { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "feedback service unavailable");
        }
        other => panic!("expected protocol error, got {:?}", other),
    }

    server.stop().await;
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    // Bind then drop a listener so the port is very likely closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = send_feedback(
        &direct_factory(),
        &format!("http://127.0.0.1:{}/report", port),
        &FeedbackParameters::new(),
    )
    .await
    .unwrap_err();

    assert!(err.is_transport(), "got: {:?}", err);
}

#[tokio::test]
async fn test_scheduled_report_end_to_end() {
    let server = MockFeedbackServer::start().await;
    let params = ErrorReport::new("Failed to read access transformer")
        .stack_trace("at AtParser.parse(AtParser.kt:42)")
        .plugin_version("2.1.0")
        .into_parameters();

    let (tx, rx) = oneshot::channel();
    let error = Arc::new(Mutex::new(None));
    let error_clone = error.clone();

    let task = FeedbackSubmissionTask::new(
        None,
        "Submitting error report",
        true,
        params,
        move |token| {
            let _ = tx.send(token);
        },
        move |e| *error_clone.lock().unwrap() = Some(e),
    )
    .with_endpoint(server.url("report"))
    .with_connection_factory(Arc::new(direct_factory()));

    let handle = TokioScheduler::current().schedule_background(Box::new(task));
    let progress = handle.progress();

    assert_eq!(handle.join().await, TaskState::Succeeded);
    assert_eq!(rx.await.unwrap(), 1337);
    assert!(error.lock().unwrap().is_none());
    assert!(progress.is_indeterminate());

    let received = server.received();
    assert_eq!(received.len(), 1);
    assert!(received[0].starts_with("error.message=Failed+to+read+access+transformer&error.stacktrace="));

    server.stop().await;
}

#[tokio::test]
async fn test_execute_with_progress_directly() {
    let server = MockFeedbackServer::start().await;
    let progress = TaskProgress::new();
    let token = Arc::new(Mutex::new(None));
    let token_clone = token.clone();

    let task = FeedbackSubmissionTask::new(
        None,
        "report",
        false,
        FeedbackParameters::new(),
        move |t| *token_clone.lock().unwrap() = Some(t),
        |e| panic!("unexpected failure: {}", e),
    )
    .with_endpoint(server.url("report"))
    .with_connection_factory(Arc::new(direct_factory()));

    assert_eq!(task.execute(&progress).await, TaskState::Succeeded);
    assert_eq!(*token.lock().unwrap(), Some(1337));
    assert_eq!(server.received(), vec![String::new()]);

    server.stop().await;
}
