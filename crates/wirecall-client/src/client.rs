//! Browser-side dispatcher.
//!
//! A call to `request("user.get", args)` becomes
//! `POST <prefix>/api/user.get` with the JSON-encoded argument as body. The
//! answer envelope's `status` decides the outcome: `"success"` resolves with
//! `data`, anything else fails with `data` verbatim.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use wirecall_core::envelope::STATUS_SUCCESS;
use wirecall_core::{HandlerRegistry, ResponseError};

use crate::error::ClientError;
use crate::fetch::{Fetch, FetchOptions, ReqwestFetch};

/// Process-wide route prefix injected by the host runtime.
pub const ROUTE_PREFIX_ENV: &str = "WIRECALL_ROUTE_PREFIX";

/// Explicit value, else the runtime-injected value, else empty.
pub fn resolve_route_prefix(explicit: Option<&str>) -> String {
    pick_route_prefix(explicit, std::env::var(ROUTE_PREFIX_ENV).ok())
}

fn pick_route_prefix(explicit: Option<&str>, injected: Option<String>) -> String {
    match explicit {
        Some(prefix) => prefix.to_string(),
        None => injected.unwrap_or_default(),
    }
}

/// Builds [`RpcClient`]s sharing one transport and one route prefix.
///
/// The prefix is resolved once, when the factory is built.
#[derive(Clone)]
pub struct RpcClientFactory {
    fetch: Arc<dyn Fetch>,
    route_prefix: String,
}

impl RpcClientFactory {
    pub fn builder(fetch: Arc<dyn Fetch>) -> RpcClientFactoryBuilder {
        RpcClientFactoryBuilder {
            fetch,
            route_prefix: None,
            handlers: None,
        }
    }

    /// Factory over `reqwest`, targeting the server at `base_url`.
    pub fn http(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder(Arc::new(ReqwestFetch::new(base_url))).build()
    }

    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    pub fn client(&self) -> RpcClient {
        RpcClient {
            fetch: Arc::clone(&self.fetch),
            route_prefix: self.route_prefix.clone(),
        }
    }
}

pub struct RpcClientFactoryBuilder {
    fetch: Arc<dyn Fetch>,
    route_prefix: Option<String>,
    handlers: Option<Arc<HandlerRegistry>>,
}

impl RpcClientFactoryBuilder {
    /// Override the route prefix. Mostly useful for tests.
    pub fn route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = Some(prefix.into());
        self
    }

    /// Handlers visible to the client build. In debug builds, a registry
    /// holding callable handlers is rejected: server implementations must
    /// never ship in client code.
    pub fn handlers(mut self, handlers: Arc<HandlerRegistry>) -> Self {
        self.handlers = Some(handlers);
        self
    }

    pub fn build(self) -> Result<RpcClientFactory, ClientError> {
        #[cfg(debug_assertions)]
        if let Some(handlers) = &self.handlers {
            if handlers.has_callables() {
                return Err(ClientError::ServerHandlersBundled);
            }
        }

        let route_prefix = resolve_route_prefix(self.route_prefix.as_deref());
        tracing::debug!(route_prefix = %route_prefix, "RPC client factory ready");

        Ok(RpcClientFactory {
            fetch: self.fetch,
            route_prefix,
        })
    }
}

#[derive(Clone)]
pub struct RpcClient {
    fetch: Arc<dyn Fetch>,
    route_prefix: String,
}

impl RpcClient {
    pub fn url_for(&self, method: &str) -> String {
        format!("{}/api/{}", self.route_prefix, method)
    }

    /// Call `method`. `None` is sent as `{}`.
    pub async fn request(&self, method: &str, args: Option<Value>) -> Result<Value, ClientError> {
        let args = args.unwrap_or_else(|| Value::Object(Default::default()));
        let body = serde_json::to_string(&args)?;

        let response = self
            .fetch
            .fetch(self.url_for(method), FetchOptions::post_json(body))
            .await?;

        settle(response)
    }

    /// Typed variant of [`request`](Self::request).
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, ClientError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let args = serde_json::to_value(params)?;
        let data = self.request(method, Some(args)).await?;
        serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn settle(response: Value) -> Result<Value, ClientError> {
    let (status, data) = match response {
        Value::Object(mut envelope) => (
            envelope.remove("status"),
            envelope.remove("data").unwrap_or(Value::Null),
        ),
        _ => (None, Value::Null),
    };

    if status.as_ref().and_then(Value::as_str) == Some(STATUS_SUCCESS) {
        Ok(data)
    } else {
        Err(ClientError::Failure(ResponseError::new(data)))
    }
}
