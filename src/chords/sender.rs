// src/chords/sender.rs
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::SubmissionSink;
use crate::retry::{with_retry, IsRetryable, RetryConfig};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from one delivery attempt against the portal.
#[derive(Debug)]
pub enum SendError {
    Timeout,
    Http { status: u16 },
    Network(String),
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::Timeout => write!(f, "request timed out"),
            SendError::Http { status } => write!(f, "HTTP {} from portal", status),
            SendError::Network(msg) => write!(f, "network error: {}", msg),
        }
    }
}

impl std::error::Error for SendError {}

impl IsRetryable for SendError {
    fn is_retryable(&self) -> bool {
        match self {
            SendError::Timeout => true,
            SendError::Http { status } => matches!(status, 502..=504),
            SendError::Network(_) => true,
        }
    }
}

/// Background delivery queue for built `url_create` URIs.
///
/// `submit` enqueues and trims the oldest entries beyond the caller's cap;
/// the task started by `start` drains the queue one GET at a time. A URI
/// that still fails after the bounded retry is dropped and logged.
pub struct ChordsSender {
    queue: Arc<Mutex<VecDeque<String>>>,
    notify: Arc<Notify>,
    client: Client,
}

impl ChordsSender {
    /// Returns an error if the HTTP client fails to build (e.g., TLS
    /// configuration issues).
    pub fn new() -> Result<Self, SendError> {
        let client = Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .map_err(|e| SendError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            client,
        })
    }

    /// Records waiting for delivery.
    pub fn queued(&self) -> usize {
        self.queue.lock().expect("chords queue poisoned").len()
    }

    /// Start the background delivery task.
    pub fn start(&self) -> JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let notify = Arc::clone(&self.notify);
        let client = self.client.clone();

        tokio::spawn(async move {
            let retry = RetryConfig::default();
            loop {
                let next = queue.lock().expect("chords queue poisoned").pop_front();
                match next {
                    Some(uri) => match deliver(&client, &retry, &uri).await {
                        Ok(()) => debug!(uri = %uri, "record delivered"),
                        Err(e) => {
                            error!(uri = %uri, error = %e, "dropping record after failed delivery")
                        }
                    },
                    None => notify.notified().await,
                }
            }
        })
    }
}

async fn deliver(client: &Client, retry: &RetryConfig, uri: &str) -> Result<(), SendError> {
    with_retry(retry, || async {
        let response = client.get(uri).send().await.map_err(|e| {
            if e.is_timeout() {
                SendError::Timeout
            } else {
                SendError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "(failed to read body)".to_string());
            error!(status, response_body = %body, "portal returned error status");
            return Err(SendError::Http { status });
        }

        Ok(())
    })
    .await
}

impl SubmissionSink for ChordsSender {
    fn submit(&self, uri: String, max_queue_length: usize) {
        let mut queue = self.queue.lock().expect("chords queue poisoned");
        queue.push_back(uri);
        while queue.len() > max_queue_length {
            queue.pop_front();
            warn!(
                max_queue_length,
                "chords queue over capacity, dropping oldest record"
            );
        }
        drop(queue);
        self.notify.notify_one();
    }
}
