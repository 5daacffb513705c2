//! Error taxonomy for the tooling bridge
//!
//! Every failure that can reach a caller of this layer is one of the
//! five variants of [`Error`]. Transport internals translate whatever
//! actually went wrong (io errors, serde errors, process exits) into
//! this taxonomy before it escapes; locally recoverable conditions
//! such as a late or unmatched response are logged and dropped, never
//! surfaced.
//!
//! # Recovery
//!
//! - `NotConnected`: call `initialize()` and retry.
//! - `ConnectionFailed`: the attempt is dead, the caller may retry.
//! - `RequestTimeout` / `Server`: the connection is still usable; the
//!   individual operation failed.
//! - `Transport`: the channel itself is gone and state has already
//!   been forced to `Disconnected`; nothing works until a fresh
//!   `initialize()`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Closed failure set surfaced by the bridge
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Operation attempted while the transport is not connected
    ///
    /// Dispatch fails fast with this before touching the wire; the
    /// transport never auto-connects on behalf of a call.
    #[error("not connected to the tooling server")]
    NotConnected,

    /// `initialize()` could not establish the connection
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// No matching response arrived within the call's deadline
    ///
    /// The pending entry is removed and any late reply is discarded.
    /// This is a client-side deadline, not a protocol cancellation;
    /// connection state is unaffected.
    #[error("request timed out: {method}")]
    RequestTimeout {
        /// Method name of the abandoned call
        method: String,
    },

    /// The server explicitly rejected the call with an error envelope
    ///
    /// The connection remains usable for further calls.
    #[error("server error: {0}")]
    Server(#[from] RpcErrorData),

    /// The underlying channel broke (process exit, closed pipe)
    ///
    /// Always accompanied by a forced transition to `Disconnected`,
    /// and every outstanding call fails with this variant.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Error payload of a response line, as sent by the tooling server
///
/// Appears in the `error` field of a response. The server uses the
/// conventional JSON-RPC code ranges (`-32601` method not found,
/// `-32602` invalid params, `-32000..` application errors) but this
/// layer treats codes as opaque integers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorData {
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
}

impl RpcErrorData {
    /// Create an error payload with code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a method-not-found payload (-32601)
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(-32601, format!("Method not found: {}", method.into()))
    }

    /// Create an invalid-params payload (-32602)
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(-32602, msg)
    }
}

impl std::fmt::Display for RpcErrorData {
    /// Formats as "[code] message" for log readability
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for RpcErrorData {}
