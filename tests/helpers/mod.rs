#![allow(dead_code)] // Test helpers appear unused when compiled independently

use axum::{
    extract::{RawQuery, State},
    routing::get,
    Json, Router,
};
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

const WAIT_ATTEMPTS: usize = 50;
const WAIT_DELAY: Duration = Duration::from_millis(100);

#[derive(Clone)]
struct PortalState {
    requests: Arc<Mutex<Vec<String>>>,
}

pub struct MockPortal {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl MockPortal {
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

/// Find an available TCP port
pub async fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Best-effort check for whether binding to loopback is permitted in the current sandbox.
pub async fn can_bind_loopback() -> bool {
    match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => {
            drop(listener);
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => false,
        Err(_) => true, // treat other errors as non-fatal for skipping
    }
}

/// Spawn a mock CHORDS portal that records the query string of every
/// `url_create` request. Returns (handle, base URL).
pub async fn spawn_mock_portal(port: u16) -> (MockPortal, String) {
    let state = PortalState {
        requests: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/measurements/url_create", get(url_create))
        .route("/requests", get(requests))
        .route("/health", get(health))
        .with_state(state);

    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("failed to bind mock portal listener");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(err) = server.await {
            eprintln!("mock portal server error: {}", err);
        }
    });

    (
        MockPortal {
            shutdown_tx,
            handle,
        },
        format!("http://127.0.0.1:{}", port),
    )
}

/// Wait for a server to respond to /health
pub async fn wait_for_health(client: &Client, base_url: &str) {
    poll_until(|| async {
        client
            .get(format!("{}/health", base_url))
            .send()
            .await
            .ok()
            .map(|_| ())
    })
    .await
    .unwrap_or_else(|| panic!("timed out waiting for {} to be healthy", base_url));
}

/// Poll /requests until the portal has seen at least `min_count` submissions
pub async fn wait_for_requests(client: &Client, base_url: &str, min_count: usize) -> Vec<String> {
    poll_until(|| async {
        match client.get(format!("{}/requests", base_url)).send().await.ok() {
            Some(resp) => match resp.json::<Vec<String>>().await.ok() {
                Some(requests) if requests.len() >= min_count => Some(requests),
                _ => None,
            },
            None => None,
        }
    })
    .await
    .unwrap_or_else(|| panic!("timed out waiting for {} requests at {}", min_count, base_url))
}

async fn poll_until<T, F, Fut>(mut f: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for _ in 0..WAIT_ATTEMPTS {
        if let Some(result) = f().await {
            return Some(result);
        }
        tokio::time::sleep(WAIT_DELAY).await;
    }
    None
}

async fn url_create(
    State(state): State<PortalState>,
    RawQuery(query): RawQuery,
) -> Json<serde_json::Value> {
    let mut requests = state.requests.lock().await;
    requests.push(query.unwrap_or_default());
    Json(serde_json::json!({ "status": "ok" }))
}

async fn requests(State(state): State<PortalState>) -> Json<Vec<String>> {
    let requests = state.requests.lock().await;
    Json(requests.clone())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
