//! End-to-end tests against a served instance of the application.
//!
//! The HTTP tests bind the real router to an ephemeral port and drive it with
//! `reqwest`, using an in-memory publisher. The Kafka test needs a reachable
//! broker and is ignored by default:
//!
//! ```bash
//! KAFKA=localhost:9092 cargo test --test integration_tests -- --ignored
//! ```
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use common::FakePublisher;
use counter_producer::models::DEMO_PAYLOAD;
use counter_producer::server;
use counter_producer::services::publish_messages;
use counter_producer::{AppState, Config, KafkaPublisher};

/// Test fixture that serves the app on an ephemeral port.
struct TestFixture {
    addr: SocketAddr,
    base_url: String,
    client: Client,
    state: AppState,
    signal: CancellationToken,
    server: tokio::task::JoinHandle<std::io::Result<bool>>,
}

impl TestFixture {
    async fn new(publisher: Arc<FakePublisher>) -> Self {
        Self::with_shutdown_timeout(publisher, Duration::from_secs(5)).await
    }

    async fn with_shutdown_timeout(publisher: Arc<FakePublisher>, timeout: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to ephemeral port");
        let addr = listener.local_addr().expect("Failed to get local address");

        let config = Config {
            host: "127.0.0.1".to_string(),
            port: addr.port().to_string(),
            publish_workers: 2,
            shutdown_timeout: timeout,
            ..Config::default()
        };
        let state = AppState::new(publisher, config);

        let signal = CancellationToken::new();
        let fired = signal.clone();
        let server = tokio::spawn(server::serve(listener, state.clone(), async move {
            fired.cancelled().await;
            "test"
        }));

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            addr,
            base_url: format!("http://{addr}"),
            client,
            state,
            signal,
            server,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fire the shutdown signal and wait for `server::serve` to return.
    ///
    /// Returns the state and whether everything finished before the deadline.
    async fn stop(self) -> (AppState, bool) {
        self.signal.cancel();
        let finished = self
            .server
            .await
            .expect("Server task panicked")
            .expect("Server failed");
        (self.state, finished)
    }

    async fn shutdown(self) -> AppState {
        let (state, finished) = self.stop().await;
        assert!(finished, "shutdown hit its deadline");
        state
    }
}

#[tokio::test]
async fn test_greetings_over_http() {
    let fixture = TestFixture::new(Arc::new(FakePublisher::new())).await;

    let response = fixture.client.get(fixture.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "This is my website!\n");

    let response = fixture
        .client
        .get(fixture.url("/hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "Hello, HTTP!\n");

    fixture.shutdown().await;
}

#[tokio::test]
async fn test_producer_over_http() {
    let publisher = Arc::new(FakePublisher::new());
    let fixture = TestFixture::new(publisher.clone()).await;

    let response = fixture
        .client
        .post(fixture.url("/producer"))
        .form(&[("counter", "3")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "Producer, counter=3\n");

    let response = fixture
        .client
        .post(fixture.url("/producer"))
        .form(&[("counter", "three")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text().await.unwrap(),
        "count value is not a valid number\n"
    );

    let state = fixture.shutdown().await;
    assert_eq!(publisher.calls(), 3);
    assert_eq!(state.pool.totals().jobs_completed, 1);
}

#[tokio::test]
async fn test_concurrent_requests_publish_every_message() {
    let publisher = Arc::new(FakePublisher::new());
    let fixture = TestFixture::new(publisher.clone()).await;

    let requests = (1..=6).map(|n| {
        fixture
            .client
            .post(fixture.url("/producer"))
            .form(&[("counter", n.to_string())])
            .send()
    });
    for response in futures_join_all(requests).await {
        assert_eq!(response.unwrap().status(), StatusCode::OK);
    }

    let state = fixture.shutdown().await;
    // 1 + 2 + ... + 6
    assert_eq!(publisher.calls(), 21);
    assert_eq!(state.pool.totals().messages_sent, 21);
}

#[tokio::test]
async fn test_shutdown_is_bounded_by_half_sent_request() {
    let publisher = Arc::new(FakePublisher::gated());
    let fixture =
        TestFixture::with_shutdown_timeout(publisher.clone(), Duration::from_millis(300)).await;

    // A job that cannot finish on its own
    let response = fixture
        .client
        .post(fixture.url("/producer"))
        .form(&[("counter", "2")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A client that never finishes its headers
    let mut stalled = TcpStream::connect(fixture.addr).await.unwrap();
    stalled
        .write_all(b"POST /producer HTTP/1.1\r\nHost: x\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    let (state, finished) = tokio::time::timeout(Duration::from_secs(5), fixture.stop())
        .await
        .expect("shutdown did not respect its deadline");

    assert!(!finished);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(state.pool.in_flight(), 0);
    assert_eq!(publisher.calls(), 0);
    drop(stalled);
}

/// Await a set of futures concurrently on the current task.
async fn futures_join_all<F>(futures: impl IntoIterator<Item = F>) -> Vec<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handles: Vec<_> = futures.into_iter().map(tokio::spawn).collect();
    let mut outputs = Vec::with_capacity(handles.len());
    for handle in handles {
        outputs.push(handle.await.expect("Request task panicked"));
    }
    outputs
}

#[tokio::test]
#[ignore = "requires a running Kafka broker (set KAFKA)"]
async fn test_publish_to_kafka() {
    let config = Config::from_lookup(|name| match name {
        "TOPIC" => Some(format!("counter-producer-test-{}", Uuid::new_v4())),
        other => std::env::var(other).ok(),
    })
    .unwrap();

    let publisher = KafkaPublisher::new(&config).unwrap();
    let report = publish_messages(
        &publisher,
        Uuid::new_v4(),
        DEMO_PAYLOAD,
        3,
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(report.attempted, 3);
    assert!(report.is_complete_success(), "errors: {:?}", report.errors);
}
