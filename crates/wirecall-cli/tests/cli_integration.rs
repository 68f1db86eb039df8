//! Integration tests for the wirecall-cli commands.
//!
//! These exercise the same code paths as the binary against a server
//! started on an ephemeral port.

use std::sync::Arc;

use serde_json::json;
use wirecall_cli::commands::call;
use wirecall_cli::handlers::{demo_registry, DEMO_FAILURE_CODE};
use wirecall_core::RpcService;
use wirecall_server::{start_server, ServerConfig};

async fn demo_server(route_prefix: &str) -> String {
    let config = ServerConfig {
        port: 0,
        route_prefix: route_prefix.to_string(),
        ..ServerConfig::default()
    };
    let service = RpcService::new(Arc::new(demo_registry()));
    let addr = start_server(config, service)
        .await
        .expect("Failed to start server");
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_call_math_add() {
    let url = demo_server("").await;
    let data = call::invoke(&url, Some(""), "math.add", Some(json!({ "a": 1, "b": 2 })))
        .await
        .expect("Expected success");
    assert_eq!(data, json!({ "sum": 3.0 }));
}

#[tokio::test]
async fn test_call_echo_without_args() {
    let url = demo_server("").await;
    let data = call::invoke(&url, Some(""), "echo", None)
        .await
        .expect("Expected success");
    assert_eq!(data, json!({}));
}

#[tokio::test]
async fn test_call_failure_reports_data() {
    let url = demo_server("").await;
    let err = call::invoke(&url, Some(""), "fail", Some(json!("boom")))
        .await
        .expect_err("Expected failure");
    assert!(err.starts_with("fail failed:"));
    assert!(err.contains(DEMO_FAILURE_CODE));
    assert!(err.contains("boom"));
}

#[tokio::test]
async fn test_call_invalid_params() {
    let url = demo_server("").await;
    let err = call::invoke(&url, Some(""), "math.add", Some(json!({ "a": "one" })))
        .await
        .expect_err("Expected failure");
    assert!(err.contains("ERR_INVALID_PARAMS"));
}

#[tokio::test]
async fn test_call_unknown_method() {
    let url = demo_server("").await;
    let err = call::invoke(&url, Some(""), "nope", None)
        .await
        .expect_err("Expected failure");
    assert!(err.contains("Missing RPC handler for nope"));
    assert!(err.contains("ERR_MISSING_HANDLER"));
}

#[tokio::test]
async fn test_call_with_route_prefix() {
    let url = demo_server("/rpc").await;
    let data = call::invoke(&url, Some("/rpc"), "echo", Some(json!([true])))
        .await
        .expect("Expected success");
    assert_eq!(data, json!([true]));
}
