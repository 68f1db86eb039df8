//! wirecall core: transport-agnostic named-method RPC.
//!
//! A caller invokes a method by name with one JSON argument; the call is
//! routed to a handler from the [`HandlerRegistry`] and answered with the
//! handler's value or error. This crate holds everything that does not
//! depend on a transport:
//!
//! - [`registry`]: method name → handler mapping
//! - [`dispatcher`]: in-process, request-scoped dispatch with telemetry
//! - [`mock`]: same-process dispatch for tests
//! - [`envelope`]: `{status, data}` wire types
//! - [`telemetry`]: per-call events, emitters and an event bus
//!
//! # Feature Flags
//!
//! - `axum`: Enables `IntoResponse` impls on `RpcError` and `Envelope`.

pub mod context;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod mock;
pub mod registry;
pub mod telemetry;

// Convenience re-exports
pub use context::RequestContext;
pub use dispatcher::{Dispatcher, RpcService};
pub use envelope::{Envelope, ErrorPayload};
pub use error::{
    ContextError, HandlerError, MissingHandlerError, ResponseError, RpcError, MISSING_HANDLER_CODE,
};
pub use mock::MockRpc;
pub use registry::{BoxFuture, Handler, HandlerRegistry, HandlerResult};
