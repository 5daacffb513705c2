//! Client metrics definitions
//!
//! OpenTelemetry instruments for monitoring bridge health and
//! performance, exported by whatever meter provider the host
//! registered via `shaderlink_core::init_observability`.
//!
//! # Metrics Collected
//!
//! - **connection_state**: current connection status (gauge)
//! - **requests_total**: requests dispatched (counter)
//! - **request_duration**: request latency distribution (histogram)
//! - **errors_total**: failures by kind (counter)
//! - **health_probes**: liveness probes by outcome (counter)
//! - **reconnection_attempts** / **reconnection_success**: recovery counters

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Connection state (0=disconnected, 1=connecting, 2=connected, 3=unhealthy)
    pub connection_state: Gauge<i64>,
    /// Total number of requests dispatched
    pub requests_total: Counter<u64>,
    /// Request duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of errors
    pub errors_total: Counter<u64>,
    /// Liveness probes by outcome
    pub health_probes: Counter<u64>,
    /// Total number of reconnection attempts
    pub reconnection_attempts: Counter<u64>,
    /// Total number of successful reconnections
    pub reconnection_success: Counter<u64>,
}

impl ClientMetrics {
    /// Create a new ClientMetrics instance
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create a new ClientMetrics instance with a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("shaderlink.client.connection.state")
                .with_description("Connection state (0=disconnected, 1=connecting, 2=connected, 3=unhealthy)")
                .build(),
            requests_total: meter
                .u64_counter("shaderlink.client.requests.total")
                .with_description("Total number of requests dispatched")
                .build(),
            request_duration: meter
                .f64_histogram("shaderlink.client.request.duration")
                .with_description("Request duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("shaderlink.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
            health_probes: meter
                .u64_counter("shaderlink.client.health.probes")
                .with_description("Liveness probes by outcome")
                .build(),
            reconnection_attempts: meter
                .u64_counter("shaderlink.client.reconnection.attempts")
                .with_description("Total number of reconnection attempts")
                .build(),
            reconnection_success: meter
                .u64_counter("shaderlink.client.reconnection.success")
                .with_description("Total number of successful reconnections")
                .build(),
        }
    }

    /// Update connection state
    pub fn update_connection_state(&self, state: i64) {
        self.connection_state.record(state, &[]);
    }

    /// Record a request
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &str) {
        let attributes = &[KeyValue::new("error_type", error_type.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record a liveness probe outcome
    pub fn record_health_probe(&self, healthy: bool) {
        let attributes = &[KeyValue::new(
            "outcome",
            if healthy { "healthy" } else { "unhealthy" },
        )];
        self.health_probes.add(1, attributes);
    }

    /// Record a reconnection attempt
    pub fn record_reconnection_attempt(&self) {
        self.reconnection_attempts.add(1, &[]);
    }

    /// Record a successful reconnection
    pub fn record_reconnection_success(&self) {
        self.reconnection_success.add(1, &[]);
    }
}
