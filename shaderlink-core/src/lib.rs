//! Core wire types and error taxonomy for the shaderlink bridge
//!
//! This crate provides the foundation shared by every transport that
//! talks to the shader tooling server:
//!
//! - **Types**: the line protocol data structures (requests, responses,
//!   correlation ids)
//! - **Codec**: encoding and decoding of newline-delimited JSON messages
//! - **Error handling**: the closed failure taxonomy surfaced to callers
//! - **Observability**: OpenTelemetry bootstrap for traces, metrics and logs
//!
//! # Architecture
//!
//! The crate is transport-agnostic: it defines what moves over the wire
//! and how failures are classified, but not how bytes get there. The
//! `shaderlink-client` crate builds the subprocess transport, the test
//! fake, and the typed client on top of this foundation.
//!
//! # Example
//!
//! ```rust
//! use shaderlink_core::{codec, Id, RpcRequest};
//!
//! let request = RpcRequest::new(
//!     "export_frame",
//!     Some(serde_json::json!({"description": "hero shot", "time": 1.5})),
//!     Id::Number(1),
//! );
//!
//! let line = codec::encode_request(&request).unwrap();
//! assert!(line.contains("\"method\":\"export_frame\""));
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

// Re-export the most commonly used types for convenience
pub use error::{Error, Result, RpcErrorData};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Id, RpcRequest, RpcResponse};
