//! Subprocess transport for the shader tooling server
//!
//! Spawns the tooling server as a child process and speaks the
//! newline-delimited JSON protocol over its standard streams. One
//! dedicated task drains stdout and completes pending calls by
//! correlation id; a second task drains stderr into the log so the
//! child can never block on a full pipe. Writers are serialized
//! through a mutex over stdin so concurrent callers never interleave
//! partial lines.
//!
//! # Failure Semantics
//!
//! A per-call timeout abandons only that call. Death of the channel
//! itself (process exit, broken pipe) fails every outstanding call
//! with `Transport` and forces the state to `Disconnected`.
//!
//! # Shutdown
//!
//! Closing stdin is the shutdown signal: the server is expected to
//! exit on EOF of its input stream. The transport waits a bounded
//! grace period (3 s by default) for the exit and kills the process if
//! it overstays, so shutdown never blocks indefinitely.

use crate::connection_state::{ConnectionState, StateTracker};
use crate::request::RequestTracker;
use crate::transport::Transport;
use async_trait::async_trait;
use shaderlink_core::{codec, Error, Id, Result, RpcRequest};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{watch, Mutex};

/// Reserved liveness probe method
const PING_METHOD: &str = "ping";

/// Default deadline for a liveness probe
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default grace period between stdin EOF and killing the child
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// How to launch the tooling server
///
/// # Examples
///
/// ```rust
/// use shaderlink_client::ServerCommand;
///
/// let command = ServerCommand::new("shader-tool-server")
///     .arg("--headless")
///     .working_dir("/projects/demo");
/// ```
#[derive(Debug, Clone)]
pub struct ServerCommand {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ServerCommand {
    /// Create a command for the given program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory, normally the project root
    ///
    /// When unset the child inherits the parent's working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// The program name, used in error messages
    pub fn program(&self) -> &str {
        &self.program
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Transport backed by a tooling server subprocess
///
/// Created disconnected; `initialize()` spawns the process. The
/// transport is exclusively owned by one client and all methods take
/// `&self`, so it is normally held behind an `Arc`.
pub struct ProcessTransport {
    command: ServerCommand,
    probe_timeout: Duration,
    shutdown_grace: Duration,
    state: Arc<StateTracker>,
    requests: RequestTracker,
    writer: Mutex<Option<ChildStdin>>,
    child: Mutex<Option<Child>>,
    /// Serializes initialize/shutdown so they cannot interleave
    lifecycle: Mutex<()>,
    /// Bumped on every initialize/shutdown; a reader task whose
    /// generation is stale must not publish state for a successor
    generation: Arc<AtomicU64>,
}

impl ProcessTransport {
    /// Create a transport for the given server command
    pub fn new(command: ServerCommand) -> Self {
        Self {
            command,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            state: Arc::new(StateTracker::new()),
            requests: RequestTracker::new(),
            writer: Mutex::new(None),
            child: Mutex::new(None),
            lifecycle: Mutex::new(()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Override the liveness probe deadline
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Override the shutdown grace period
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Complete the pending call matching one stdout line
    ///
    /// Unknown ids and undecodable lines are logged and dropped; they
    /// must never fail an unrelated pending call.
    async fn handle_line(line: &str, requests: &RequestTracker) {
        if line.trim().is_empty() {
            return;
        }
        match codec::decode_response(line) {
            Ok(response) => {
                let id = match &response.id {
                    Id::Number(n) if *n >= 0 => *n as u64,
                    other => {
                        tracing::warn!(id = %other, "dropping response with foreign id");
                        return;
                    }
                };
                if !requests.complete(id, response).await {
                    tracing::warn!(id, "dropping response with no pending request");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, line, "dropping undecodable line from server");
            }
        }
    }

    /// Dispatch one request; probes are additionally allowed while `Unhealthy`
    async fn dispatch(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        timeout: Duration,
        probe: bool,
    ) -> Result<serde_json::Value> {
        let state = self.state.current();
        let accepted = state == ConnectionState::Connected
            || (probe && state == ConnectionState::Unhealthy);
        if !accepted {
            return Err(Error::NotConnected);
        }

        let id = self.requests.next_id();
        let request = RpcRequest::new(method, params, Id::from(id));
        let line = codec::encode_request(&request)?;

        let rx = self.requests.register(id).await;

        {
            let mut writer = self.writer.lock().await;
            let stdin = match writer.as_mut() {
                Some(stdin) => stdin,
                None => {
                    self.requests.remove(id).await;
                    return Err(Error::NotConnected);
                }
            };

            let mut bytes = line.into_bytes();
            bytes.push(b'\n');
            let write_result = async {
                stdin.write_all(&bytes).await?;
                stdin.flush().await
            }
            .await;

            if let Err(e) = write_result {
                // Broken pipe: the process is gone, everyone fails. The
                // transition is published before any call resolves so
                // observers never see a failure from a "connected" state.
                let description = format!("failed to write to server stdin: {}", e);
                *writer = None;
                drop(writer);
                self.state.disconnected();
                self.requests
                    .fail_all(Error::Transport(description.clone()))
                    .await;
                return Err(Error::Transport(description));
            }
        }

        tracing::debug!(method, id, "request sent, awaiting response");

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(Ok(response))) => {
                if let Some(error) = response.error {
                    tracing::debug!(method, code = error.code, "server rejected request");
                    return Err(Error::Server(error));
                }
                // An absent result on a non-error response is a bare ack.
                Ok(response.result.unwrap_or(serde_json::Value::Null))
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(_)) => Err(Error::Transport("response channel closed".to_string())),
            Err(_) => {
                // Deadline expired: abandon only this call. A late reply
                // will find no pending entry and be dropped by the reader.
                self.requests.remove(id).await;
                tracing::debug!(method, id, "request abandoned after timeout");
                Err(Error::RequestTimeout {
                    method: method.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    #[tracing::instrument(skip(self), fields(program = self.command.program()))]
    async fn initialize(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        match self.state.current() {
            // Idempotent: do not re-enter Connecting for a live connection.
            ConnectionState::Connected | ConnectionState::Unhealthy => {
                tracing::debug!("already connected, initialize is a no-op");
                return Ok(());
            }
            _ => {}
        }

        self.state.connecting();
        tracing::info!("spawning shader tooling server");

        // Reap a previous child that died behind our back before
        // spawning its replacement.
        if let Some(mut stale) = self.child.lock().await.take() {
            let _ = stale.start_kill();
            let _ = stale.wait().await;
        }

        let mut child = match self.command.build().spawn() {
            Ok(child) => child,
            Err(e) => {
                self.state.disconnected();
                return Err(Error::ConnectionFailed(format!(
                    "failed to spawn {}: {}",
                    self.command.program(),
                    e
                )));
            }
        };

        let (stdin, stdout, stderr) = match (
            child.stdin.take(),
            child.stdout.take(),
            child.stderr.take(),
        ) {
            (Some(i), Some(o), Some(e)) => (i, o, e),
            _ => {
                let _ = child.start_kill();
                self.state.disconnected();
                return Err(Error::ConnectionFailed(
                    "server process is missing a standard stream".to_string(),
                ));
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Drain stderr continuously so the child never blocks on it.
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(target: "shaderlink::server", "{}", line);
            }
        });

        // Reader task: the only completer of pending calls.
        let requests = self.requests.clone();
        let state = Arc::clone(&self.state);
        let generations = Arc::clone(&self.generation);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => Self::handle_line(&line, &requests).await,
                    Ok(None) => {
                        tracing::warn!("server stdout closed");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to read from server stdout");
                        break;
                    }
                }
            }
            // The channel is gone. Unless a newer initialize/shutdown
            // already superseded this connection, publish the transition
            // first, then fail everyone: a caller seeing the error can
            // already observe the disconnect that caused it.
            if generations.load(Ordering::SeqCst) == generation {
                state.disconnected();
                requests
                    .fail_all(Error::Transport("server process exited".to_string()))
                    .await;
            }
        });

        *self.writer.lock().await = Some(stdin);
        *self.child.lock().await = Some(child);
        self.state.connected();
        tracing::info!("connected to shader tooling server");

        Ok(())
    }

    async fn shutdown(&self) {
        let _guard = self.lifecycle.lock().await;

        // Invalidate the reader's teardown path; shutdown owns it now.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.disconnected();

        // Dropping stdin delivers EOF, the server's shutdown signal.
        *self.writer.lock().await = None;
        self.requests
            .fail_all(Error::Transport("transport shut down".to_string()))
            .await;

        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            match tokio::time::timeout(self.shutdown_grace, child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::info!(%status, "server process exited");
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "failed to reap server process");
                }
                Err(_) => {
                    tracing::warn!(
                        grace = ?self.shutdown_grace,
                        "server did not exit within grace period, killing"
                    );
                    if let Err(e) = child.kill().await {
                        tracing::warn!(error = %e, "failed to kill server process");
                    }
                }
            }
        }
    }

    async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        self.dispatch(method, params, timeout, false).await
    }

    async fn is_healthy(&self) -> bool {
        match self.state.current() {
            ConnectionState::Connected | ConnectionState::Unhealthy => {}
            _ => return false,
        }

        match self.dispatch(PING_METHOD, None, self.probe_timeout, true).await {
            Ok(_) => {
                if self.state.current() == ConnectionState::Unhealthy {
                    tracing::info!("health probe succeeded, connection restored");
                    self.state.connected();
                }
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "health probe failed");
                // A transport failure has already forced Disconnected;
                // only a still-reachable process is parked at Unhealthy.
                if self.state.current() == ConnectionState::Connected {
                    self.state.unhealthy();
                }
                false
            }
        }
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

    #[test]
    fn test_server_command_builder() {
        let command = ServerCommand::new("shader-tool-server")
            .arg("--headless")
            .args(["--port", "0"])
            .working_dir("/tmp");

        assert_eq!(command.program(), "shader-tool-server");
        assert_eq!(command.args, vec!["--headless", "--port", "0"]);
        assert_eq!(command.working_dir, Some(PathBuf::from("/tmp")));
    }

    #[tokio::test]
    async fn test_send_before_initialize_is_not_connected() {
        let transport = ProcessTransport::new(ServerCommand::new("true"));
        let result = transport
            .send_request("set_shader", None, Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(Error::NotConnected)));
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_initialize_spawn_failure() {
        let transport =
            ProcessTransport::new(ServerCommand::new("shaderlink-no-such-binary-2f8a"));
        let result = transport.initialize().await;
        assert!(matches!(result, Err(Error::ConnectionFailed(_))));
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_shutdown_without_initialize_is_safe() {
        let transport = ProcessTransport::new(ServerCommand::new("true"));
        transport.shutdown().await;
        transport.shutdown().await;
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_is_healthy_when_disconnected() {
        let transport = ProcessTransport::new(ServerCommand::new("true"));
        assert!(!transport.is_healthy().await);
    }
}
