//! Typed client for the shader tooling server
//!
//! [`ShaderlinkClient`] wraps exactly one [`Transport`] and exposes the
//! tooling operations as strongly typed methods. The loosely typed
//! string-keyed parameter mapping exists only at the wire boundary;
//! at this boundary the known request shapes are a tagged union,
//! [`ToolRequest`], with serde doing the translation to wire casing.
//!
//! # Lifecycle
//!
//! Construct one client per session with [`ClientBuilder`] and pass it
//! to consumers explicitly; the client is cheap to clone and safe to
//! share across tasks. `initialize()` and `shutdown()` delegate to the
//! transport and inherit its idempotence guarantees.
//!
//! # Failure Policy
//!
//! Every operation fails fast with `NotConnected` when the observed
//! state is not `Connected`, without touching the transport; a doomed
//! round trip is never started. The client performs no implicit
//! retries. Hosts reacting to a `Transport` error apply
//! [`ShaderlinkClient::reconnect`] exactly once before surfacing a
//! persistent failure.
//!
//! # Cloning
//!
//! `ShaderlinkClient` is cheaply cloneable using `Arc` internally. All
//! clones share the same transport and configuration.

use crate::connection_state::ConnectionState;
use crate::metrics::ClientMetrics;
use crate::transport::Transport;
use serde::Serialize;
use shaderlink_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Default per-call deadline
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for `set_shader`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetShaderParams {
    /// Shader source code, passed through uninspected
    pub code: String,
    /// Optional human-readable description of the edit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Suppress the automatic preview snapshot for this edit
    pub no_snapshot: bool,
}

/// Parameters for `set_shader_with_meta`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetShaderMetaParams {
    /// Shader name as shown in the editor
    pub name: String,
    /// Optional description of the shader
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional project-relative path to persist the shader at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Shader source code
    pub code: String,
    /// Persist the shader to disk on the server side
    pub save: bool,
    /// Suppress the automatic preview snapshot
    pub no_snapshot: bool,
}

/// Parameters for `export_frame`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFrameParams {
    /// Optional description recorded with the export
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional shader time to render the frame at, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

/// Parameters for `set_tab`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTabParams {
    /// Identifier of the editor tab to activate
    pub tab_id: String,
}

/// The known request shapes, one variant per reserved method
#[derive(Debug, Clone)]
pub enum ToolRequest {
    /// Replace the live shader source
    SetShader(SetShaderParams),
    /// Replace the shader with full metadata
    SetShaderWithMeta(SetShaderMetaParams),
    /// Export the current frame to an image
    ExportFrame(ExportFrameParams),
    /// Switch the active editor tab
    SetTab(SetTabParams),
}

impl ToolRequest {
    /// Wire method name for this request
    pub fn method(&self) -> &'static str {
        match self {
            ToolRequest::SetShader(_) => "set_shader",
            ToolRequest::SetShaderWithMeta(_) => "set_shader_with_meta",
            ToolRequest::ExportFrame(_) => "export_frame",
            ToolRequest::SetTab(_) => "set_tab",
        }
    }

    /// Serialize the parameters to the wire mapping
    fn params(&self) -> Result<Option<serde_json::Value>> {
        let value = match self {
            ToolRequest::SetShader(p) => serde_json::to_value(p),
            ToolRequest::SetShaderWithMeta(p) => serde_json::to_value(p),
            ToolRequest::ExportFrame(p) => serde_json::to_value(p),
            ToolRequest::SetTab(p) => serde_json::to_value(p),
        }
        .map_err(|e| Error::Transport(format!("failed to encode params: {}", e)))?;
        Ok(Some(value))
    }
}

/// RPC client for the shader tooling server
#[derive(Clone)]
pub struct ShaderlinkClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) default_timeout: Duration,
    pub(crate) metrics: Option<Arc<ClientMetrics>>,
}

impl ShaderlinkClient {
    /// Create a client with default configuration
    ///
    /// Use [`ShaderlinkClient::builder`] to customize the timeout or
    /// enable metrics.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            default_timeout: DEFAULT_TIMEOUT,
            metrics: None,
        }
    }

    /// Start building a client around the given transport
    pub fn builder(transport: Arc<dyn Transport>) -> crate::ClientBuilder {
        crate::ClientBuilder::new(transport)
    }

    /// Establish the connection; idempotent while already connected
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        let result = self.transport.initialize().await;
        self.publish_state_metric();
        result
    }

    /// Tear down the connection; safe to call repeatedly
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) {
        self.transport.shutdown().await;
        self.publish_state_metric();
    }

    /// Replace the live shader source
    pub async fn set_shader(
        &self,
        code: impl Into<String>,
        description: Option<String>,
        no_snapshot: bool,
    ) -> Result<serde_json::Value> {
        self.call(ToolRequest::SetShader(SetShaderParams {
            code: code.into(),
            description,
            no_snapshot,
        }))
        .await
    }

    /// Replace the shader with full metadata
    pub async fn set_shader_with_meta(
        &self,
        params: SetShaderMetaParams,
    ) -> Result<serde_json::Value> {
        self.call(ToolRequest::SetShaderWithMeta(params)).await
    }

    /// Export the current frame, optionally at a specific shader time
    pub async fn export_frame(
        &self,
        description: Option<String>,
        time: Option<f64>,
    ) -> Result<serde_json::Value> {
        self.call(ToolRequest::ExportFrame(ExportFrameParams {
            description,
            time,
        }))
        .await
    }

    /// Switch the active editor tab
    pub async fn set_tab(&self, tab_id: impl Into<String>) -> Result<serde_json::Value> {
        self.call(ToolRequest::SetTab(SetTabParams {
            tab_id: tab_id.into(),
        }))
        .await
    }

    /// Dispatch a request with the client's default timeout
    pub async fn call(&self, request: ToolRequest) -> Result<serde_json::Value> {
        self.call_with_timeout(request, self.default_timeout).await
    }

    /// Dispatch a request with a call-specific timeout
    #[tracing::instrument(skip(self, request), fields(method = request.method()))]
    pub async fn call_with_timeout(
        &self,
        request: ToolRequest,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        let method = request.method();

        // Fail fast: a doomed round trip is never started, and the
        // transport is not touched at all.
        if self.transport.state() != ConnectionState::Connected {
            tracing::debug!(method, "rejecting call while not connected");
            if let Some(ref m) = self.metrics {
                m.record_error("not_connected");
            }
            return Err(Error::NotConnected);
        }

        let params = request.params()?;
        let start = std::time::Instant::now();
        let result = self.transport.send_request(method, params, timeout).await;
        let duration = start.elapsed().as_secs_f64();

        match &result {
            Ok(_) => {
                if let Some(ref m) = self.metrics {
                    m.record_request(method, "success", duration);
                }
                tracing::debug!(method, duration_secs = duration, "request completed");
            }
            Err(e) => {
                if let Some(ref m) = self.metrics {
                    m.record_request(method, "error", duration);
                    m.record_error(error_kind(e));
                }
                tracing::warn!(method, error = %e, "request failed");
                self.publish_state_metric();
            }
        }

        result
    }

    /// Probe liveness; never errors, returns false on any failure
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.transport.is_healthy().await;
        if let Some(ref m) = self.metrics {
            m.record_health_probe(healthy);
        }
        self.publish_state_metric();
        healthy
    }

    /// Tear down and re-establish the connection
    ///
    /// This is the single automatic recovery step a host applies after
    /// a `Transport` error, before surfacing a persistent failure to
    /// the user. The client itself never invokes it implicitly.
    #[tracing::instrument(skip(self))]
    pub async fn reconnect(&self) -> Result<()> {
        if let Some(ref m) = self.metrics {
            m.record_reconnection_attempt();
        }
        self.transport.shutdown().await;
        let result = self.transport.initialize().await;
        if result.is_ok() {
            if let Some(ref m) = self.metrics {
                m.record_reconnection_success();
            }
        }
        self.publish_state_metric();
        result
    }

    /// Current connection state as observed by this client
    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Subscribe to connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.transport.subscribe_state()
    }

    /// The configured default per-call timeout
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    fn publish_state_metric(&self) {
        if let Some(ref m) = self.metrics {
            m.update_connection_state(state_code(self.transport.state()));
        }
    }
}

/// Gauge encoding of the connection state
fn state_code(state: ConnectionState) -> i64 {
    match state {
        ConnectionState::Disconnected => 0,
        ConnectionState::Connecting => 1,
        ConnectionState::Connected => 2,
        ConnectionState::Unhealthy => 3,
    }
}

/// Stable label for the error counter
fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::NotConnected => "not_connected",
        Error::ConnectionFailed(_) => "connection_failed",
        Error::RequestTimeout { .. } => "request_timeout",
        Error::Server(_) => "server_error",
        Error::Transport(_) => "transport",
    }
}
