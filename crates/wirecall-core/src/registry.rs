//! Handler registry for dispatching calls by method name.
//!
//! The registry maps method names to handlers. It is built once at startup
//! and shared read-only (`Arc<HandlerRegistry>`) for the process lifetime.
//!
//! # Example
//!
//! ```ignore
//! use wirecall_core::registry::HandlerRegistry;
//!
//! let mut registry = HandlerRegistry::new();
//!
//! registry
//!     .register("echo", |args, _ctx| async move { Ok(args) })
//!     .register_sync("ping", |_args, _ctx| Ok(serde_json::json!("pong")));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{HandlerError, INVALID_RESULT_CODE};

/// Result type for handler functions.
pub type HandlerResult = Result<Value, HandlerError>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for handler functions.
pub trait Handler: Send + Sync + 'static {
    /// Handle one call with its argument and the request context.
    fn call(&self, args: Value, ctx: RequestContext) -> BoxFuture<'static, HandlerResult>;
}

/// Handler backed by an async closure.
pub struct AsyncHandler<F> {
    handler: F,
}

impl<F, Fut> Handler for AsyncHandler<F>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, args: Value, ctx: RequestContext) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.handler)(args, ctx))
    }
}

/// Handler backed by a plain closure that returns immediately.
pub struct SyncHandler<F> {
    handler: F,
}

impl<F> Handler for SyncHandler<F>
where
    F: Fn(Value, &RequestContext) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, args: Value, ctx: RequestContext) -> BoxFuture<'static, HandlerResult> {
        let result = (self.handler)(args, &ctx);
        Box::pin(std::future::ready(result))
    }
}

/// Wrapper that deserializes the argument and serializes the result.
pub struct TypedHandler<F, P, R, Fut> {
    handler: F,
    _phantom: PhantomData<fn(P) -> (R, Fut)>,
}

impl<F, P, R, Fut> Handler for TypedHandler<F, P, R, Fut>
where
    F: Fn(P, RequestContext) -> Fut + Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
{
    fn call(&self, args: Value, ctx: RequestContext) -> BoxFuture<'static, HandlerResult> {
        let params: P = match serde_json::from_value(args) {
            Ok(p) => p,
            Err(e) => return Box::pin(std::future::ready(Err(HandlerError::invalid_params(e)))),
        };

        let fut = (self.handler)(params, ctx);
        Box::pin(async move {
            let result = fut.await?;
            serde_json::to_value(result).map_err(|e| {
                HandlerError::new(format!("Failed to serialize result: {}", e))
                    .with_code(INVALID_RESULT_CODE)
            })
        })
    }
}

/// Method name → handler mapping.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async handler.
    pub fn register<F, Fut>(&mut self, method: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.insert(method, Arc::new(AsyncHandler { handler }))
    }

    /// Register a synchronous handler.
    pub fn register_sync<F>(&mut self, method: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Value, &RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(method, Arc::new(SyncHandler { handler }))
    }

    /// Register a handler with typed params and result.
    ///
    /// An argument that does not deserialize into `P` fails the call with
    /// code `ERR_INVALID_PARAMS` before the handler runs.
    pub fn register_typed<F, P, R, Fut>(&mut self, method: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(P, RequestContext) -> Fut + Send + Sync + 'static,
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        self.insert(
            method,
            Arc::new(TypedHandler {
                handler,
                _phantom: PhantomData,
            }),
        )
    }

    /// Register an already-built handler.
    pub fn insert(&mut self, method: impl Into<String>, handler: Arc<dyn Handler>) -> &mut Self {
        let method = method.into();
        if self.handlers.insert(method.clone(), handler).is_some() {
            tracing::warn!(method = %method, "Replacing previously registered RPC handler");
        }
        self
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, method: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether any entry is a callable implementation. Browser-side code
    /// must never be built with one of these.
    pub fn has_callables(&self) -> bool {
        !self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.method_names())
            .finish()
    }
}
