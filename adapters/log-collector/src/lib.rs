//! log-collector: best-effort delivery of telemetry events to the remote log
//! collector.
//!
//! Purpose
//! - Implement the domain's `TelemetrySink` port without ever blocking or
//!   failing the caller.
//! - Each event becomes one JSON `POST` (`stack`, `level`, `package`,
//!   `message`) to the collector endpoint.
//!
//! API
//! - `CollectorClient::deliver(&event)` → `Result<(), DeliveryError>`; the one
//!   place where delivery failures are visible, so they can be tested.
//! - `spawn_worker(client)` → `(CollectorEmitter, JoinHandle<WorkerStats>)`;
//!   the emitter pushes onto an unbounded channel and a background task
//!   delivers each event on its own task.
//!
//! Notes
//! - No retries and no ordering guarantee between events. Failures are logged
//!   at `debug` and dropped.
//! - No timeout beyond the transport default.

use domain::{TelemetryEvent, TelemetrySink};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, info, trace};

/// Collector endpoint used when none is configured.
pub const DEFAULT_COLLECTOR_URL: &str = "http://20.244.56.144/evaluation-service/logs";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("collector responded with status {0}")]
    Status(u16),
}

/// HTTP client bound to one collector endpoint.
#[derive(Clone, Debug)]
pub struct CollectorClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CollectorClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Use a preconfigured `reqwest::Client` (proxy, TLS, timeout settings).
    pub fn with_http(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one event. Any non-2xx status counts as a failure; the response
    /// body is never read.
    pub async fn deliver(&self, event: &TelemetryEvent) -> Result<(), DeliveryError> {
        let resp = self.http.post(&self.endpoint).json(event).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }
        Ok(())
    }
}

impl Default for CollectorClient {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTOR_URL)
    }
}

/// Fire-and-forget handle onto the delivery worker.
#[derive(Clone, Debug)]
pub struct CollectorEmitter {
    tx: mpsc::UnboundedSender<TelemetryEvent>,
}

impl TelemetrySink for CollectorEmitter {
    fn emit(&self, event: TelemetryEvent) {
        if self.tx.send(event).is_err() {
            trace!("log-collector: worker stopped, event dropped");
        }
    }
}

/// Delivery counts reported when the worker shuts down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub delivered: u64,
    pub failed: u64,
}

impl WorkerStats {
    fn record(&mut self, done: Result<Result<(), DeliveryError>, JoinError>) {
        match done {
            Ok(Ok(())) => self.delivered += 1,
            Ok(Err(err)) => {
                debug!(error = %err, "log-collector: delivery failed");
                self.failed += 1;
            }
            Err(err) => {
                debug!(error = %err, "log-collector: delivery task aborted");
                self.failed += 1;
            }
        }
    }
}

/// Start the background delivery worker. Must be called inside a Tokio
/// runtime.
///
/// The worker runs until every clone of the returned emitter is dropped, then
/// waits for in-flight deliveries and yields its counts.
pub fn spawn_worker(client: CollectorClient) -> (CollectorEmitter, JoinHandle<WorkerStats>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_worker(client, rx));
    (CollectorEmitter { tx }, handle)
}

async fn run_worker(
    client: CollectorClient,
    mut rx: mpsc::UnboundedReceiver<TelemetryEvent>,
) -> WorkerStats {
    let mut inflight = JoinSet::new();
    let mut stats = WorkerStats::default();

    loop {
        tokio::select! {
            next = rx.recv() => match next {
                Some(event) => {
                    let client = client.clone();
                    inflight.spawn(async move { client.deliver(&event).await });
                }
                None => break,
            },
            Some(done) = inflight.join_next(), if !inflight.is_empty() => stats.record(done),
        }
    }

    while let Some(done) = inflight.join_next().await {
        stats.record(done);
    }
    info!(
        delivered = stats.delivered,
        failed = stats.failed,
        endpoint = %client.endpoint(),
        "log-collector: worker stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use domain::{Level, Package};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<Value>>>;

    async fn record_body(
        State((seen, status)): State<(Seen, StatusCode)>,
        Json(body): Json<Value>,
    ) -> StatusCode {
        seen.lock().unwrap().push(body);
        status
    }

    fn local_client(url: impl Into<String>) -> CollectorClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        CollectorClient::with_http(url, http)
    }

    /// In-process collector answering every POST with `status`.
    async fn start_collector(status: StatusCode) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/logs", post(record_body))
            .with_state((seen.clone(), status));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/logs", addr), seen)
    }

    #[tokio::test]
    async fn deliver_posts_wire_contract() {
        let (url, seen) = start_collector(StatusCode::OK).await;
        let client = local_client(url);
        client
            .deliver(&TelemetryEvent::api_error("Invalid URL at row 2"))
            .await
            .expect("delivered");

        let bodies = seen.lock().unwrap().clone();
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            bodies[0],
            serde_json::json!({
                "stack": "frontend",
                "level": "error",
                "package": "api",
                "message": "Invalid URL at row 2"
            })
        );
    }

    #[tokio::test]
    async fn deliver_reports_non_success_status() {
        let (url, _seen) = start_collector(StatusCode::INTERNAL_SERVER_ERROR).await;
        let err = local_client(url)
            .deliver(&TelemetryEvent::api_info("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Status(500)));
    }

    #[tokio::test]
    async fn deliver_reports_transport_failure() {
        // Grab a free port, then close it so the connection is refused.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = local_client(format!("http://{}/logs", addr))
            .deliver(&TelemetryEvent::api_info("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }

    #[tokio::test]
    async fn worker_delivers_every_event() {
        let (url, seen) = start_collector(StatusCode::OK).await;
        let (emitter, worker) = spawn_worker(local_client(url));

        emitter.emit(TelemetryEvent::api_info("Short URL created: abc123"));
        emitter.emit(TelemetryEvent::api_error("Invalid validity at row 4"));
        emitter.emit(TelemetryEvent::new(Level::Warn, Package::Config, "odd"));
        drop(emitter);

        let stats = worker.await.unwrap();
        assert_eq!(stats, WorkerStats { delivered: 3, failed: 0 });

        let mut messages: Vec<String> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|b| b["message"].as_str().unwrap().to_string())
            .collect();
        // Arrival order is not guaranteed.
        messages.sort();
        assert_eq!(
            messages,
            vec!["Invalid validity at row 4", "Short URL created: abc123", "odd"]
        );
    }

    #[tokio::test]
    async fn worker_swallows_failures() {
        let (url, seen) = start_collector(StatusCode::SERVICE_UNAVAILABLE).await;
        let (emitter, worker) = spawn_worker(local_client(url));

        emitter.emit(TelemetryEvent::api_info("one"));
        emitter.emit(TelemetryEvent::api_info("two"));
        drop(emitter);

        let stats = worker.await.unwrap();
        assert_eq!(stats, WorkerStats { delivered: 0, failed: 2 });
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn emit_after_worker_stops_is_silent() {
        let (emitter, worker) = spawn_worker(local_client("http://127.0.0.1:9/logs"));
        worker.abort();
        let _ = worker.await;
        emitter.emit(TelemetryEvent::api_info("dropped"));
    }

    #[test]
    fn default_client_targets_known_collector() {
        assert_eq!(CollectorClient::default().endpoint(), DEFAULT_COLLECTOR_URL);
    }
}
