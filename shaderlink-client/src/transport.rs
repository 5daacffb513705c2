//! Transport abstraction
//!
//! The seam between the client and whatever moves bytes to the tooling
//! server. Two implementations exist: [`ProcessTransport`] owns a real
//! server subprocess, and [`FakeTransport`] reproduces the same
//! contract entirely in memory so the client's state machine can be
//! exercised without spawning anything.
//!
//! [`ProcessTransport`]: crate::ProcessTransport
//! [`FakeTransport`]: crate::FakeTransport

use crate::connection_state::ConnectionState;
use async_trait::async_trait;
use shaderlink_core::Result;
use std::time::Duration;
use tokio::sync::watch;

/// Moves correlated request/response messages to the tooling server
///
/// # Contract
///
/// - `initialize` ends in `Connected` on success or `Disconnected` on
///   failure, and is a no-op while already connected.
/// - `shutdown` unconditionally drives state to `Disconnected` and is
///   safe to call repeatedly, including before any `initialize`.
/// - `send_request` never auto-connects: calling it while not
///   connected fails with `NotConnected` without touching the wire.
/// - A timeout abandons only the one call; a channel failure fails
///   every outstanding call and forces `Disconnected`.
/// - `is_healthy` probes with the reserved `ping` method and reports
///   the outcome without erroring. A failed probe parks the state at
///   `Unhealthy` (the process is still there, just not answering); a
///   later successful probe restores `Connected`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the connection (spawn the process, open pipes)
    ///
    /// Idempotent: a second call while already connected returns
    /// without re-entering `Connecting`.
    async fn initialize(&self) -> Result<()>;

    /// Tear down the connection unconditionally
    async fn shutdown(&self);

    /// Send one correlated request and await its response or `timeout`
    async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<serde_json::Value>;

    /// Probe liveness with the reserved `ping` method
    async fn is_healthy(&self) -> bool;

    /// Current connection state
    fn state(&self) -> ConnectionState;

    /// Subscribe to state changes; a late subscriber immediately sees
    /// the current state
    fn subscribe_state(&self) -> watch::Receiver<ConnectionState>;
}
