//! Request/response integration tests against the scripted fake
//!
//! Exercises the success, server-error, timeout, and crash paths and
//! asserts on the request history the fake records.

mod common;

use common::{fake_pair, fake_pair_with_timeout};
use futures::future::join_all;
use shaderlink_client::{ConnectionState, ScriptedResponse};
use shaderlink_core::Error;
use serde_json::json;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_set_shader_success() {
    let (client, fake) = fake_pair();
    fake.script("set_shader", ScriptedResponse::Success(json!({"status": "ok"})));

    client.initialize().await.unwrap();
    let result = client.set_shader("x", None, true).await.unwrap();
    assert_eq!(result["status"], "ok");

    let history = fake.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].method, "set_shader");
    let params = history[0].params.as_ref().unwrap();
    assert_eq!(params["code"], "x");
    assert_eq!(params["noSnapshot"], true);
    assert!(params.get("description").is_none());
}

#[tokio::test]
async fn test_export_frame_records_time() {
    let (client, fake) = fake_pair();
    fake.script(
        "export_frame",
        ScriptedResponse::Success(json!({"path": "/exports/frame.png"})),
    );

    client.initialize().await.unwrap();
    let result = client.export_frame(Some("f".into()), Some(1.5)).await.unwrap();
    assert_eq!(result["path"], "/exports/frame.png");

    let history = fake.history();
    assert_eq!(history.len(), 1);
    let params = history[0].params.as_ref().unwrap();
    assert_eq!(params["time"], 1.5);
    assert_eq!(params["description"], "f");
}

#[tokio::test]
async fn test_set_shader_with_meta_sends_full_bag() {
    let (client, fake) = fake_pair();
    fake.script(
        "set_shader_with_meta",
        ScriptedResponse::Success(json!({"status": "ok"})),
    );

    client.initialize().await.unwrap();
    client
        .set_shader_with_meta(shaderlink_client::SetShaderMetaParams {
            name: "plasma".into(),
            description: None,
            path: Some("shaders/plasma.frag".into()),
            code: "void main() {}".into(),
            save: true,
            no_snapshot: false,
        })
        .await
        .unwrap();

    let history = fake.history();
    assert_eq!(history[0].method, "set_shader_with_meta");
    let params = history[0].params.as_ref().unwrap();
    assert_eq!(params["name"], "plasma");
    assert_eq!(params["save"], true);
    assert_eq!(params["noSnapshot"], false);
}

#[tokio::test]
async fn test_server_error_is_surfaced_exactly() {
    let (client, fake) = fake_pair();
    fake.script(
        "set_tab",
        ScriptedResponse::Error {
            code: -32602,
            message: "unknown tab".into(),
        },
    );

    client.initialize().await.unwrap();
    match client.set_tab("nope").await {
        Err(Error::Server(data)) => {
            assert_eq!(data.code, -32602);
            assert_eq!(data.message, "unknown tab");
        }
        other => panic!("expected Server error, got {:?}", other),
    }

    // A rejected call leaves the connection usable.
    assert_eq!(client.state(), ConnectionState::Connected);
    fake.script("set_tab", ScriptedResponse::Success(json!({})));
    client.set_tab("preview").await.unwrap();
}

#[tokio::test]
async fn test_timeout_abandons_only_that_call() {
    let (client, fake) = fake_pair_with_timeout(Duration::from_millis(100));
    fake.script("export_frame", ScriptedResponse::Timeout);
    fake.script("set_tab", ScriptedResponse::Success(json!({})));

    client.initialize().await.unwrap();

    let start = Instant::now();
    let result = client.export_frame(None, None).await;
    let elapsed = start.elapsed();

    match result {
        Err(Error::RequestTimeout { method }) => assert_eq!(method, "export_frame"),
        other => panic!("expected RequestTimeout, got {:?}", other),
    }
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(1), "took {:?}", elapsed);

    // Connection state is unaffected and later calls still succeed.
    assert_eq!(client.state(), ConnectionState::Connected);
    client.set_tab("preview").await.unwrap();
}

#[tokio::test]
async fn test_per_call_timeout_override() {
    let (client, fake) = fake_pair_with_timeout(Duration::from_secs(5));
    fake.script("set_shader", ScriptedResponse::Timeout);

    client.initialize().await.unwrap();

    let start = Instant::now();
    let result = client
        .call_with_timeout(
            shaderlink_client::ToolRequest::SetShader(shaderlink_client::SetShaderParams {
                code: "x".into(),
                description: None,
                no_snapshot: true,
            }),
            Duration::from_millis(50),
        )
        .await;

    assert!(matches!(result, Err(Error::RequestTimeout { .. })));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_crash_fails_call_and_disconnects() {
    let (client, fake) = fake_pair();
    fake.script("set_shader", ScriptedResponse::Crash);

    client.initialize().await.unwrap();
    let result = client.set_shader("x", None, true).await;
    assert!(matches!(result, Err(Error::Transport(_))));
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // Without a reconnect nothing goes through.
    let result = client.set_shader("x", None, true).await;
    assert!(matches!(result, Err(Error::NotConnected)));
}

#[tokio::test]
async fn test_concurrent_requests_all_complete() {
    let (client, fake) = fake_pair();
    fake.script("set_tab", ScriptedResponse::Success(json!({})));
    fake.script(
        "export_frame",
        ScriptedResponse::Success(json!({"path": "/exports/frame.png"})),
    );

    client.initialize().await.unwrap();

    let calls = vec![
        client.set_tab("preview"),
        client.set_tab("uniforms"),
        client.set_tab("log"),
    ];
    let results = join_all(calls).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let frame = client.export_frame(None, Some(0.0)).await.unwrap();
    assert_eq!(frame["path"], "/exports/frame.png");
    assert_eq!(fake.request_count(), 4);
}
