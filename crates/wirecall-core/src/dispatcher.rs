//! Server-side, in-process dispatcher.
//!
//! `RpcService` is built once at startup from the handler registry and an
//! optional telemetry source. For each inbound request it hands out one
//! `Dispatcher`, memoized in the request's context, so repeated calls made
//! while serving that request share it.
//!
//! # Usage
//!
//! ```ignore
//! let service = RpcService::new(Arc::new(registry)).with_emitters(Arc::new(bus));
//!
//! let rpc = service.from_context(&ctx)?;
//! let user = rpc.request("user.get", json!({ "id": 7 }), &ctx).await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{ContextError, MissingHandlerError, RpcError};
use crate::registry::HandlerRegistry;
use crate::telemetry::{elapsed_ms, emit_guarded, Emitter, EmitterSource, Origin, RpcEvent};

/// Lifecycle of a single call. Every call starts at `Idle` and ends in a
/// terminal state; no state is re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Resolving,
    Invoking,
    MethodNotFound,
    Succeeded,
    Failed,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallState::MethodNotFound | CallState::Succeeded | CallState::Failed
        )
    }
}

/// Process-wide dispatcher factory.
#[derive(Clone)]
pub struct RpcService {
    registry: Arc<HandlerRegistry>,
    emitters: Option<Arc<dyn EmitterSource>>,
}

impl RpcService {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            emitters: None,
        }
    }

    pub fn with_emitters(mut self, emitters: Arc<dyn EmitterSource>) -> Self {
        self.emitters = Some(emitters);
        self
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Narrow the telemetry source to the emitter for `ctx`.
    pub fn emitter_for(&self, ctx: &RequestContext) -> Option<Arc<dyn Emitter>> {
        self.emitters.as_ref().and_then(|source| source.scoped(ctx))
    }

    /// The dispatcher for `ctx`, created on first use and reused afterwards.
    ///
    /// Fails when `ctx` is not bound to an inbound request.
    pub fn from_context(&self, ctx: &RequestContext) -> Result<Arc<Dispatcher>, ContextError> {
        if !ctx.has_headers() {
            return Err(ContextError);
        }

        Ok(ctx.memoize(|| Dispatcher {
            registry: Arc::clone(&self.registry),
            emitter: self.emitter_for(ctx),
            request_id: ctx.request_id().to_string(),
        }))
    }

    /// Resolve and invoke `method`, emitting one event tagged with `origin`.
    ///
    /// This is the path shared by in-process calls and the HTTP adapter.
    pub async fn dispatch(
        &self,
        origin: Origin,
        method: &str,
        args: Value,
        ctx: &RequestContext,
    ) -> Result<Value, RpcError> {
        let emitter = self.emitter_for(ctx);
        dispatch(&self.registry, emitter.as_ref(), origin, method, args, ctx).await
    }
}

/// Request-scoped in-process dispatcher.
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    emitter: Option<Arc<dyn Emitter>>,
    /// Id of the context this dispatcher was resolved from.
    request_id: String,
}

impl Dispatcher {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Call `method` with `args`. Resolves with the handler's value
    /// unchanged, or fails with the handler's own error.
    ///
    /// `ctx` must be the context this dispatcher was resolved from; its
    /// emitter is scoped to that request.
    pub async fn request(
        &self,
        method: &str,
        args: Value,
        ctx: &RequestContext,
    ) -> Result<Value, RpcError> {
        debug_assert_eq!(
            ctx.request_id(),
            self.request_id,
            "dispatcher used with a context from another request"
        );

        dispatch(
            &self.registry,
            self.emitter.as_ref(),
            Origin::Server,
            method,
            args,
            ctx,
        )
        .await
    }
}

async fn dispatch(
    registry: &HandlerRegistry,
    emitter: Option<&Arc<dyn Emitter>>,
    origin: Origin,
    method: &str,
    args: Value,
    ctx: &RequestContext,
) -> Result<Value, RpcError> {
    let start = Instant::now();
    trace_state(method, CallState::Idle);
    trace_state(method, CallState::Resolving);

    let Some(handler) = registry.get(method) else {
        trace_state(method, CallState::MethodNotFound);
        let err = RpcError::from(MissingHandlerError::new(method));
        tracing::debug!(method, origin = origin.as_str(), "No RPC handler registered");
        emit_guarded(emitter, &RpcEvent::unresolved(method, origin, err.clone()));
        return Err(err);
    };

    trace_state(method, CallState::Invoking);
    match handler.call(args, ctx.clone()).await {
        Ok(result) => {
            trace_state(method, CallState::Succeeded);
            emit_guarded(
                emitter,
                &RpcEvent::success(method, origin, elapsed_ms(start)),
            );
            Ok(result)
        }
        Err(e) => {
            trace_state(method, CallState::Failed);
            let err = RpcError::Handler(e);
            emit_guarded(
                emitter,
                &RpcEvent::failure(method, origin, elapsed_ms(start), err.clone()),
            );
            Err(err)
        }
    }
}

fn trace_state(method: &str, state: CallState) {
    tracing::trace!(method, state = ?state, terminal = state.is_terminal(), "RPC call state");
}
