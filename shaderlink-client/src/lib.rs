//! RPC client runtime for the shader tooling server
//!
//! This crate is the automation bridge between a shader live-editing
//! application and its out-of-process tooling server. It owns the
//! server's process lifecycle, correlates newline-delimited JSON
//! requests with their responses, enforces per-call deadlines, and
//! monitors liveness with a reserved ping method.
//!
//! # Core Pieces
//!
//! - **Transport**: the seam between the client and the wire. The
//!   [`ProcessTransport`] speaks to a real subprocess; the
//!   [`FakeTransport`] reproduces the same contract in memory with
//!   scriptable responses for tests.
//! - **ShaderlinkClient**: typed operations (`set_shader`,
//!   `set_shader_with_meta`, `export_frame`, `set_tab`) over the
//!   transport, with fail-fast dispatch and a configurable default
//!   timeout.
//! - **ConnectionState**: `Disconnected` / `Connecting` / `Connected`
//!   / `Unhealthy`, published through a watch channel so observers
//!   always see the newest state.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use shaderlink_client::{ProcessTransport, ServerCommand, ShaderlinkClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(ProcessTransport::new(
//!         ServerCommand::new("shader-tool-server")
//!             .arg("--headless")
//!             .working_dir("/projects/demo"),
//!     ));
//!
//!     let client = ShaderlinkClient::new(transport);
//!     client.initialize().await?;
//!
//!     client.set_shader("void main() {}", None, true).await?;
//!     let frame = client.export_frame(Some("hero shot".into()), Some(1.5)).await?;
//!     println!("exported: {}", frame["path"]);
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```

mod client;
mod client_builder;
mod connection_state;
mod fake;
mod metrics;
mod process;
mod request;
mod transport;

pub use client::{
    ExportFrameParams, SetShaderMetaParams, SetShaderParams, SetTabParams, ShaderlinkClient,
    ToolRequest,
};
pub use client_builder::ClientBuilder;
pub use connection_state::{ConnectionState, StateTracker};
pub use fake::{FakeTransport, HealthScript, RequestRecord, ScriptedResponse};
pub use metrics::ClientMetrics;
pub use process::{ProcessTransport, ServerCommand};
pub use transport::Transport;
