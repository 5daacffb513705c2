//! Wire types for the shader tooling protocol
//!
//! The bridge and the tooling server exchange one JSON object per
//! newline-delimited line. A request carries `id`, `method` and an
//! optional `params` object; a response carries the same `id` plus
//! either `result` or `error`. There is no version field and no
//! notification form: every message on the wire belongs to exactly one
//! request/response pair.
//!
//! # Correlation ids
//!
//! Responses are matched to requests purely by `id`. The server echoes
//! whatever id it was given, so the type accepts both strings and
//! integers; the client side only ever generates integers from an
//! atomic counter, which keeps ids unique for the lifetime of a
//! transport.

use crate::error::RpcErrorData;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation id for one request/response pair
///
/// The wire allows either a string or an integer. `Hash` and `Eq` are
/// derived so an id can key the pending-call map directly.
///
/// # Examples
///
/// ```rust
/// use shaderlink_core::Id;
///
/// let a: Id = 7i64.into();
/// let b: Id = "frame-7".into();
/// assert_eq!(a.to_string(), "7");
/// assert_eq!(b.to_string(), "\"frame-7\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier, useful for externally supplied correlation tokens
    String(String),
    /// Numeric identifier, what the client generates
    Number(i64),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<u64> for Id {
    /// Convert from u64 to Id
    ///
    /// Casts to i64; the client's counter starts at 1 and never gets
    /// anywhere near the wrap point.
    fn from(n: u64) -> Self {
        Id::Number(n as i64)
    }
}

/// One outbound request line
///
/// Serialized as `{"id": ..., "method": ..., "params": {...}}` with
/// `params` omitted entirely when absent, matching what the tooling
/// server parses.
///
/// # Examples
///
/// ```rust
/// use shaderlink_core::{Id, RpcRequest};
/// use serde_json::json;
///
/// let req = RpcRequest::new(
///     "set_shader",
///     Some(json!({"code": "void main() {}", "noSnapshot": true})),
///     Id::Number(1),
/// );
/// assert_eq!(req.method, "set_shader");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Unique identifier correlating this request with its response
    pub id: Id,
    /// Name of the remote operation to invoke
    pub method: String,
    /// Optional parameter object, omitted from JSON if None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl RpcRequest {
    /// Create a new request
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>, id: Id) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

/// One inbound response line
///
/// Exactly one of `result` and `error` is present on a well-formed
/// response. A line with neither is a protocol violation; the reader
/// logs and drops it rather than guessing.
///
/// # Examples
///
/// ```rust
/// use shaderlink_core::{Id, RpcResponse, RpcErrorData};
/// use serde_json::json;
///
/// let ok = RpcResponse::success(json!({"status": "ok"}), Id::Number(1));
/// assert!(ok.is_success());
///
/// let err = RpcResponse::error(RpcErrorData::new(-32000, "compile failed"), Id::Number(2));
/// assert!(err.is_error());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Request id this response answers
    pub id: Id,
    /// Successful result value, mutually exclusive with `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error payload, mutually exclusive with `result`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorData>,
}

impl RpcResponse {
    /// Create a successful response
    pub fn success(result: serde_json::Value, id: Id) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(error: RpcErrorData, id: Id) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// True if `result` is present
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    /// True if `error` is present
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("probe".to_string()).to_string(), "\"probe\"");
        assert_eq!(Id::Number(42).to_string(), "42");
    }

    #[test]
    fn test_request_serialization() {
        let req = RpcRequest::new("ping", None, Id::Number(1));
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"method\":\"ping\""));
        assert!(json.contains("\"id\":1"));
        assert!(!json.contains("\"params\""));
    }

    #[test]
    fn test_request_with_params() {
        let req = RpcRequest::new(
            "set_tab",
            Some(serde_json::json!({"tabId": "preview"})),
            Id::Number(3),
        );
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"tabId\":\"preview\""));
    }

    #[test]
    fn test_response_success() {
        let resp = RpcResponse::success(serde_json::json!({"status": "ok"}), Id::Number(1));
        assert!(resp.is_success());
        assert!(!resp.is_error());
    }

    #[test]
    fn test_response_error() {
        let resp = RpcResponse::error(RpcErrorData::new(-32000, "shader rejected"), Id::Number(1));
        assert!(!resp.is_success());
        assert!(resp.is_error());
    }

    #[test]
    fn test_response_round_trip_string_id() {
        let resp = RpcResponse::success(
            serde_json::json!({"path": "/exports/frame.png"}),
            Id::String("export-1".to_string()),
        );
        let json = serde_json::to_string(&resp).unwrap();
        let decoded: RpcResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, Id::String("export-1".to_string()));
        assert!(decoded.is_success());
    }
}
