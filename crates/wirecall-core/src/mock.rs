//! Same-process dispatcher for exercising call sites in tests.
//!
//! `MockRpc` follows the same lookup/invoke/return rule as the real
//! dispatchers, but needs no request context, emits no telemetry and has
//! no transport. Unknown methods fail with the same `MissingHandlerError`.

use std::sync::Arc;

use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{MissingHandlerError, RpcError};
use crate::registry::HandlerRegistry;

#[derive(Clone, Default)]
pub struct MockRpc {
    registry: Arc<HandlerRegistry>,
}

impl MockRpc {
    pub fn new(registry: impl Into<Arc<HandlerRegistry>>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    pub async fn request(&self, method: &str, args: Value) -> Result<Value, RpcError> {
        let handler = self
            .registry
            .get(method)
            .ok_or_else(|| MissingHandlerError::new(method))?;

        Ok(handler.call(args, RequestContext::detached()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_with_missing_handler() {
        let rpc = MockRpc::new(HandlerRegistry::new());
        let err = rpc.request("test", Value::Null).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing RPC handler for test");
        assert_eq!(err.code(), Some("ERR_MISSING_HANDLER"));
    }

    #[tokio::test]
    async fn test_mock_with_no_handlers() {
        let rpc = MockRpc::default();
        assert!(rpc.request("anything", Value::Null).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_with_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register("test", |args, _ctx| async move {
            assert_eq!(args, json!({ "test": "args" }));
            Ok(json!(10))
        });

        let rpc = MockRpc::new(registry);
        let result = rpc.request("test", json!({ "test": "args" })).await;
        assert_eq!(result.unwrap(), json!(10));
    }

    #[tokio::test]
    async fn test_mock_passes_handler_error_through() {
        let mut registry = HandlerRegistry::new();
        registry.register_sync("fail", |_args, _ctx| {
            Err(HandlerError::new("nope").with_code("ERR_NOPE"))
        });

        let rpc = MockRpc::new(registry);
        let err = rpc.request("fail", Value::Null).await.unwrap_err();
        assert_eq!(err, RpcError::Handler(HandlerError::new("nope").with_code("ERR_NOPE")));
    }
}
