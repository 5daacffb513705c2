//! SHADERLINK - Automation bridge for a shader live-editing tool
//!
//! This is the main convenience crate that re-exports the shaderlink
//! sub-crates. Use this crate if you want a single dependency for
//! driving the shader tooling server headlessly.
//!
//! # Architecture
//!
//! Shaderlink is organized into modular crates:
//!
//! - **shaderlink-core**: wire types, codec, error taxonomy, observability
//! - **shaderlink-client**: transports (subprocess + test fake) and the
//!   typed RPC client
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use shaderlink::{ProcessTransport, ServerCommand, ShaderlinkClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(ProcessTransport::new(
//!         ServerCommand::new("shader-tool-server").arg("--headless"),
//!     ));
//!
//!     let client = ShaderlinkClient::new(transport);
//!     client.initialize().await?;
//!
//!     client.set_shader("void main() {}", None, true).await?;
//!     if client.is_healthy().await {
//!         let frame = client.export_frame(None, Some(0.0)).await?;
//!         println!("{}", serde_json::to_string_pretty(&frame)?);
//!     }
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```

// Re-export all public APIs from sub-crates
pub use shaderlink_client as client;
pub use shaderlink_core as core;

// Convenience re-exports of the most commonly used types
pub use shaderlink_client::{
    ClientBuilder, ConnectionState, FakeTransport, ProcessTransport, ServerCommand,
    ShaderlinkClient, Transport,
};
pub use shaderlink_core::{Error, Result};
