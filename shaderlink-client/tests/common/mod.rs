//! Common test utilities for shaderlink-client integration tests
//!
//! Provides pre-wired fake transports and small shell-based stand-ins
//! for the tooling server so the process transport can be exercised
//! without a real shader toolchain.

use shaderlink_client::{ClientBuilder, FakeTransport, ServerCommand, ShaderlinkClient};
use std::sync::Arc;
use std::time::Duration;

/// A client over a fresh fake transport with a short default timeout
#[allow(dead_code)]
pub fn fake_pair() -> (ShaderlinkClient, Arc<FakeTransport>) {
    fake_pair_with_timeout(Duration::from_millis(200))
}

/// Same as [`fake_pair`] with an explicit default timeout
#[allow(dead_code)]
pub fn fake_pair_with_timeout(timeout: Duration) -> (ShaderlinkClient, Arc<FakeTransport>) {
    let fake = Arc::new(FakeTransport::new());
    let client = ClientBuilder::new(fake.clone())
        .default_timeout(timeout)
        .build();
    (client, fake)
}

/// Shell server that answers every request line with a success envelope
///
/// sed extracts the numeric id from the request and emits
/// `{"id":N,"result":{"status":"ok"}}` unbuffered, which is all the
/// correlation machinery needs.
#[allow(dead_code)]
pub fn echo_server() -> ServerCommand {
    ServerCommand::new("sh").arg("-c").arg(
        r#"sed -une 's/.*"id":\([0-9]*\).*/{"id":\1,"result":{"status":"ok"}}/p'"#,
    )
}

/// Shell server that rejects every request with an error envelope
#[allow(dead_code)]
pub fn rejecting_server() -> ServerCommand {
    ServerCommand::new("sh").arg("-c").arg(
        r#"sed -une 's/.*"id":\([0-9]*\).*/{"id":\1,"error":{"code":-32000,"message":"compile failed"}}/p'"#,
    )
}

/// Shell server that consumes requests and never answers
#[allow(dead_code)]
pub fn silent_server() -> ServerCommand {
    ServerCommand::new("sh").arg("-c").arg("cat > /dev/null")
}

/// Shell server that exits after reading a single request
#[allow(dead_code)]
pub fn crashing_server() -> ServerCommand {
    ServerCommand::new("sh")
        .arg("-c")
        .arg("read _line; exit 7")
}

/// Shell server that spews to stderr and an unknown-id line before serving
#[allow(dead_code)]
pub fn noisy_server() -> ServerCommand {
    ServerCommand::new("sh").arg("-c").arg(concat!(
        r#"echo "renderer booting" >&2; "#,
        r#"echo '{"id":999,"result":{}}'; "#,
        r#"echo 'not json at all'; "#,
        r#"exec sed -une 's/.*"id":\([0-9]*\).*/{"id":\1,"result":{"status":"ok"}}/p'"#,
    ))
}

/// Shell server that ignores stdin EOF and has to be killed
#[allow(dead_code)]
pub fn stubborn_server() -> ServerCommand {
    ServerCommand::new("sh").arg("-c").arg("sleep 30")
}
