//! Per-call instrumentation.
//!
//! Every dispatch emits exactly one [`RpcEvent`]: an `rpc:method` event with
//! status and timing when a handler ran, or an `rpc:error` event when the
//! method could not be resolved. Emission is a side channel. A panicking
//! emitter is caught and logged, never allowed to change the call's outcome.

mod bus;
mod recording;
mod tracing_emitter;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde::{Serialize, Serializer};

use crate::context::RequestContext;
use crate::error::RpcError;

pub use bus::{BusEvent, EventBus};
pub use recording::RecordingEmitter;
pub use tracing_emitter::TracingEmitter;

/// Event kind for calls that reached a handler.
pub const METHOD_EVENT: &str = "rpc:method";

/// Event kind for calls whose method could not be resolved.
pub const ERROR_EVENT: &str = "rpc:error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    #[serde(rename = "rpc:method")]
    Method,
    #[serde(rename = "rpc:error")]
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Method => METHOD_EVENT,
            EventKind::Error => ERROR_EVENT,
        }
    }
}

/// Which side of the wire the call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// In-process call made on the server.
    Server,
    /// Call that arrived over HTTP from the browser-side dispatcher.
    Browser,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Server => "server",
            Origin::Browser => "browser",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Failure,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Failure => "failure",
        }
    }
}

/// One telemetry record.
///
/// `status` and `timing` are present for `rpc:method` events and absent for
/// `rpc:error` events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcEvent {
    pub method: String,
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CallStatus>,
    /// Elapsed milliseconds, rounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<RpcError>,
}

impl RpcEvent {
    pub fn success(method: impl Into<String>, origin: Origin, timing: u64) -> Self {
        Self {
            method: method.into(),
            origin,
            status: Some(CallStatus::Success),
            timing: Some(timing),
            error: None,
        }
    }

    pub fn failure(method: impl Into<String>, origin: Origin, timing: u64, error: RpcError) -> Self {
        Self {
            method: method.into(),
            origin,
            status: Some(CallStatus::Failure),
            timing: Some(timing),
            error: Some(error),
        }
    }

    pub fn unresolved(method: impl Into<String>, origin: Origin, error: RpcError) -> Self {
        Self {
            method: method.into(),
            origin,
            status: None,
            timing: None,
            error: Some(error),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self.status {
            Some(_) => EventKind::Method,
            None => EventKind::Error,
        }
    }
}

fn serialize_error<S: Serializer>(error: &Option<RpcError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(err) => err.to_payload().serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// Sink for telemetry events.
pub trait Emitter: Send + Sync {
    fn emit(&self, kind: EventKind, event: &RpcEvent);
}

/// Hands out the emitter scoped to one request.
///
/// Scoped emitters must not hold on to the context itself: a dispatcher is
/// memoized inside the context and keeps its emitter alive.
pub trait EmitterSource: Send + Sync {
    fn scoped(&self, ctx: &RequestContext) -> Option<Arc<dyn Emitter>>;
}

/// Emit `event` on `emitter`, if any, isolating the call from emitter panics.
pub fn emit_guarded(emitter: Option<&Arc<dyn Emitter>>, event: &RpcEvent) {
    let Some(emitter) = emitter else {
        return;
    };

    let kind = event.kind();
    if catch_unwind(AssertUnwindSafe(|| emitter.emit(kind, event))).is_err() {
        tracing::warn!(
            method = %event.method,
            kind = kind.as_str(),
            "Telemetry emitter panicked; event dropped"
        );
    }
}

/// Milliseconds since `start`, rounded to the nearest integer.
pub fn elapsed_ms(start: Instant) -> u64 {
    (start.elapsed().as_secs_f64() * 1000.0).round() as u64
}
