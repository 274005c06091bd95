//! An in-process [`Transport`] that replays scripted replies.
//!
//! Requests are recorded in order so a test can assert on exactly what the
//! command layer sent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::{ApiRequest, ApiResponse, Transport, TransportError};

/// Replays queued [`ApiResponse`]s, one per request.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    replies: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
    sent: AtomicU64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply while building the transport.
    pub fn reply(mut self, response: ApiResponse) -> Self {
        self.replies.get_mut().push_back(response);
        self
    }

    /// Queues a reply on a shared transport.
    pub async fn push_reply(&self, response: ApiResponse) {
        self.replies.lock().await.push_back(response);
    }

    /// Everything executed so far, oldest first.
    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of replies not yet consumed.
    pub async fn pending(&self) -> usize {
        self.replies.lock().await.len()
    }
}

impl Transport for MemoryTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let seq = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(seq, method = %request.method, url = %request.url, "memory transport request");

        self.requests.lock().await.push(request);
        self.replies
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| TransportError::ConnectionClosed(format!("no reply scripted for request #{seq}")))
    }
}
