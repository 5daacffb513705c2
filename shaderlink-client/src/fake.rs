//! In-memory transport for testing the client state machine
//!
//! [`FakeTransport`] implements the full [`Transport`] contract without
//! spawning anything. Responses are pre-registered per method and
//! reproduced exactly, including sleeping out the caller's deadline
//! for a scripted timeout and flipping the state to `Disconnected` for
//! a scripted crash. Every dispatched request is recorded so tests can
//! assert on what actually went over the (absent) wire.
//!
//! Liveness is scripted independently of requests; the intermittent
//! mode draws from a seeded RNG so flaky-probe scenarios replay
//! deterministically.
//!
//! ```rust
//! use shaderlink_client::{FakeTransport, ScriptedResponse, Transport};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let fake = FakeTransport::new();
//! fake.script("set_shader", ScriptedResponse::Success(json!({"status": "ok"})));
//! fake.initialize().await.unwrap();
//!
//! let result = fake
//!     .send_request("set_shader", Some(json!({"code": "x"})), std::time::Duration::from_secs(1))
//!     .await
//!     .unwrap();
//! assert_eq!(result["status"], "ok");
//! assert_eq!(fake.history().len(), 1);
//! # }
//! ```

use crate::connection_state::{ConnectionState, StateTracker};
use crate::transport::Transport;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shaderlink_core::{Error, Result, RpcErrorData};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// Scripted behavior for one method
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Respond successfully with the given value
    Success(serde_json::Value),
    /// Respond with an error envelope
    Error {
        /// Error code to report
        code: i32,
        /// Error message to report
        message: String,
    },
    /// Never respond; the caller's deadline expires
    Timeout,
    /// Simulate the server process dying mid-call
    Crash,
}

/// Scripted liveness behavior
#[derive(Debug, Clone, Copy)]
pub enum HealthScript {
    /// Every probe succeeds
    Healthy,
    /// Every probe fails
    Unhealthy,
    /// Probes succeed with the given probability, drawn from the
    /// transport's seeded RNG
    Intermittent {
        /// Probability of a successful probe, in `[0.0, 1.0]`
        success_rate: f64,
    },
}

/// One dispatched request, as recorded for assertions
///
/// Never consulted by production logic; tests read the history to
/// verify methods and parameters.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    /// Method name of the dispatched request
    pub method: String,
    /// Parameters as they would have been serialized
    pub params: Option<serde_json::Value>,
}

/// Scriptable in-memory implementation of [`Transport`]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, ScriptedResponse>>,
    health: Mutex<HealthScript>,
    rng: Mutex<StdRng>,
    history: Mutex<Vec<RequestRecord>>,
    state: StateTracker,
    fail_next_initialize: AtomicBool,
}

impl FakeTransport {
    /// Create a fake with a fixed default RNG seed
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Create a fake with an explicit RNG seed for intermittent health
    pub fn with_seed(seed: u64) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            health: Mutex::new(HealthScript::Healthy),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            history: Mutex::new(Vec::new()),
            state: StateTracker::new(),
            fail_next_initialize: AtomicBool::new(false),
        }
    }

    /// Register the behavior for a method, replacing any earlier script
    pub fn script(&self, method: impl Into<String>, response: ScriptedResponse) {
        self.scripts
            .lock()
            .unwrap()
            .insert(method.into(), response);
    }

    /// Set the liveness behavior
    pub fn script_health(&self, script: HealthScript) {
        *self.health.lock().unwrap() = script;
    }

    /// Make the next `initialize()` fail with `ConnectionFailed`
    pub fn fail_next_initialize(&self) {
        self.fail_next_initialize.store(true, Ordering::SeqCst);
    }

    /// Snapshot of every request dispatched so far
    pub fn history(&self) -> Vec<RequestRecord> {
        self.history.lock().unwrap().clone()
    }

    /// Number of requests dispatched so far
    pub fn request_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn initialize(&self) -> Result<()> {
        match self.state.current() {
            // Idempotent while the connection is live, matching the
            // process transport.
            ConnectionState::Connected | ConnectionState::Unhealthy => return Ok(()),
            _ => {}
        }

        self.state.connecting();

        if self.fail_next_initialize.swap(false, Ordering::SeqCst) {
            self.state.disconnected();
            return Err(Error::ConnectionFailed(
                "scripted connection failure".to_string(),
            ));
        }

        self.state.connected();
        Ok(())
    }

    async fn shutdown(&self) {
        self.state.disconnected();
    }

    async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        if self.state.current() != ConnectionState::Connected {
            return Err(Error::NotConnected);
        }

        self.history.lock().unwrap().push(RequestRecord {
            method: method.to_string(),
            params,
        });

        let script = self.scripts.lock().unwrap().get(method).cloned();

        match script {
            Some(ScriptedResponse::Success(value)) => Ok(value),
            Some(ScriptedResponse::Error { code, message }) => {
                Err(Error::Server(RpcErrorData::new(code, message)))
            }
            Some(ScriptedResponse::Timeout) => {
                // Sleep out the caller's deadline, then report exactly
                // what the real transport would.
                tokio::time::sleep(timeout).await;
                Err(Error::RequestTimeout {
                    method: method.to_string(),
                })
            }
            Some(ScriptedResponse::Crash) => {
                self.state.disconnected();
                Err(Error::Transport("scripted server crash".to_string()))
            }
            // An unscripted method is a misconfigured test; answer with
            // a readable error instead of panicking.
            None => Err(Error::Server(RpcErrorData::method_not_found(method))),
        }
    }

    async fn is_healthy(&self) -> bool {
        match self.state.current() {
            ConnectionState::Connected | ConnectionState::Unhealthy => {}
            _ => return false,
        }

        let script = *self.health.lock().unwrap();
        let healthy = match script {
            HealthScript::Healthy => true,
            HealthScript::Unhealthy => false,
            HealthScript::Intermittent { success_rate } => {
                self.rng.lock().unwrap().gen_bool(success_rate.clamp(0.0, 1.0))
            }
        };

        if healthy {
            if self.state.current() == ConnectionState::Unhealthy {
                self.state.connected();
            }
        } else if self.state.current() == ConnectionState::Connected {
            self.state.unhealthy();
        }

        healthy
    }

    fn state(&self) -> ConnectionState {
        self.state.current()
    }

    fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unscripted_method_is_method_not_found() {
        let fake = FakeTransport::new();
        fake.initialize().await.unwrap();

        let result = fake
            .send_request("unknown_op", None, Duration::from_millis(50))
            .await;
        match result {
            Err(Error::Server(data)) => assert_eq!(data.code, -32601),
            other => panic!("expected Server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_records_params() {
        let fake = FakeTransport::new();
        fake.script("set_tab", ScriptedResponse::Success(json!({})));
        fake.initialize().await.unwrap();

        fake.send_request(
            "set_tab",
            Some(json!({"tabId": "preview"})),
            Duration::from_millis(50),
        )
        .await
        .unwrap();

        let history = fake.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].method, "set_tab");
        assert_eq!(history[0].params.as_ref().unwrap()["tabId"], "preview");
    }

    #[tokio::test]
    async fn test_scripted_crash_disconnects() {
        let fake = FakeTransport::new();
        fake.script("export_frame", ScriptedResponse::Crash);
        fake.initialize().await.unwrap();

        let result = fake
            .send_request("export_frame", None, Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(fake.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_scripted_initialize_failure() {
        let fake = FakeTransport::new();
        fake.fail_next_initialize();

        let result = fake.initialize().await;
        assert!(matches!(result, Err(Error::ConnectionFailed(_))));
        assert_eq!(fake.state(), ConnectionState::Disconnected);

        // The failure script is consumed; the next attempt connects.
        fake.initialize().await.unwrap();
        assert_eq!(fake.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_same_seed_replays_probe_sequence() {
        let outcomes = |seed: u64| async move {
            let fake = FakeTransport::with_seed(seed);
            fake.script_health(HealthScript::Intermittent { success_rate: 0.5 });
            fake.initialize().await.unwrap();
            let mut seen = Vec::new();
            for _ in 0..16 {
                seen.push(fake.is_healthy().await);
            }
            seen
        };

        assert_eq!(outcomes(7).await, outcomes(7).await);
    }
}
