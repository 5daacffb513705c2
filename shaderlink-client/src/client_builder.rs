//! Client builder for configuring timeouts and metrics
//!
//! The builder is deliberately small: a client is one transport, one
//! default timeout, and optionally a metrics handle. The transport is
//! injected rather than constructed here so the same client logic runs
//! against the subprocess transport in production and the fake in
//! tests.
//!
//! # Examples
//!
//! ```rust,no_run
//! use shaderlink_client::{ClientBuilder, ProcessTransport, ServerCommand};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> shaderlink_core::Result<()> {
//! let transport = Arc::new(ProcessTransport::new(
//!     ServerCommand::new("shader-tool-server").arg("--headless"),
//! ));
//!
//! let client = ClientBuilder::new(transport)
//!     .default_timeout(Duration::from_secs(10))
//!     .with_metrics("shader-studio")
//!     .build();
//!
//! client.initialize().await?;
//! # Ok(())
//! # }
//! ```

use crate::client::{ShaderlinkClient, DEFAULT_TIMEOUT};
use crate::metrics::ClientMetrics;
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`ShaderlinkClient`]
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    default_timeout: Duration,
    metrics: Option<Arc<ClientMetrics>>,
}

impl ClientBuilder {
    /// Create a builder around the given transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            default_timeout: DEFAULT_TIMEOUT,
            metrics: None,
        }
    }

    /// Set the default per-call timeout (30 s if unset)
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Enable OpenTelemetry metrics under the given service name
    ///
    /// Instruments register against the global meter provider, so call
    /// `shaderlink_core::init_observability` first for the data to go
    /// anywhere.
    pub fn with_metrics(mut self, service_name: &str) -> Self {
        self.metrics = Some(Arc::new(ClientMetrics::new(service_name)));
        self
    }

    /// Build the client
    pub fn build(self) -> ShaderlinkClient {
        ShaderlinkClient {
            transport: self.transport,
            default_timeout: self.default_timeout,
            metrics: self.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeTransport;

    #[test]
    fn test_builder_defaults() {
        let client = ClientBuilder::new(Arc::new(FakeTransport::new())).build();
        assert_eq!(client.default_timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_builder_custom_timeout() {
        let client = ClientBuilder::new(Arc::new(FakeTransport::new()))
            .default_timeout(Duration::from_millis(250))
            .build();
        assert_eq!(client.default_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_builder_with_metrics() {
        let client = ClientBuilder::new(Arc::new(FakeTransport::new()))
            .with_metrics("test-client")
            .build();
        assert!(client.metrics.is_some());
    }
}
