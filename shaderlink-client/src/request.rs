//! Pending-request tracking
//!
//! This module correlates outgoing requests with their eventual
//! responses.
//!
//! # Request Lifecycle
//!
//! 1. **Generate id**: atomic counter, unique for the transport's lifetime
//! 2. **Register**: create a oneshot channel for the response
//! 3. **Send**: the transport writes the request line
//! 4. **Wait**: the caller awaits the oneshot receiver under its deadline
//! 5. **Complete**: the reader task matches the response id and sends it
//!
//! # Why Oneshot Channels?
//!
//! Responses arrive asynchronously and out of order relative to sends.
//! A dedicated oneshot per request gives natural async integration and
//! automatic cleanup when either side is dropped.
//!
//! # Timeout Removal
//!
//! On deadline expiry the caller calls [`RequestTracker::remove`] for
//! its own id. Removal races benignly with a late completion: either
//! the entry is still there and the reply will be dropped as unknown,
//! or the completion already fired into a receiver the caller is about
//! to drop. A response is never delivered to the wrong caller.

use shaderlink_core::{Error, RpcResponse, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

/// Pending request waiting for a response
struct PendingRequest {
    tx: oneshot::Sender<Result<RpcResponse>>,
}

/// Tracks in-flight requests for one transport
#[derive(Clone)]
pub(crate) struct RequestTracker {
    /// Map of request id to pending request
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    /// Monotonic id counter; ids are never reused
    counter: Arc<AtomicU64>,
}

impl RequestTracker {
    pub(crate) fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Generate the next unique request id
    pub(crate) fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a pending request and return the receiver to await
    pub(crate) async fn register(&self, id: u64) -> oneshot::Receiver<Result<RpcResponse>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, PendingRequest { tx });
        rx
    }

    /// Complete a pending request with a response
    ///
    /// Returns false if the id is unknown (already timed out or never
    /// registered), in which case the caller logs and drops the line.
    pub(crate) async fn complete(&self, id: u64, response: RpcResponse) -> bool {
        if let Some(pending) = self.pending.lock().await.remove(&id) {
            let _ = pending.tx.send(Ok(response));
            true
        } else {
            false
        }
    }

    /// Remove a pending request without completing it (timeout path)
    pub(crate) async fn remove(&self, id: u64) {
        self.pending.lock().await.remove(&id);
    }

    /// Fail every pending request with the same error (channel death)
    pub(crate) async fn fail_all(&self, error: Error) {
        let mut pending = self.pending.lock().await;
        for (_, req) in pending.drain() {
            let _ = req.tx.send(Err(error.clone()));
        }
    }

    /// Number of requests currently in flight
    #[allow(dead_code)]
    pub(crate) async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
