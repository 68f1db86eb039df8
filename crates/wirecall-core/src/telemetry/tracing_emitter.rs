//! Emitter that turns RPC events into `tracing` records.

use std::sync::Arc;

use super::{CallStatus, Emitter, EmitterSource, EventKind, RpcEvent};
use crate::context::RequestContext;

#[derive(Debug, Clone, Default)]
pub struct TracingEmitter {
    request_id: Option<String>,
}

impl TracingEmitter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Emitter for TracingEmitter {
    fn emit(&self, kind: EventKind, event: &RpcEvent) {
        let request_id = self.request_id.as_deref().unwrap_or("-");
        let timing = event.timing.unwrap_or_default();

        match (kind, event.status) {
            (EventKind::Method, Some(CallStatus::Success)) => tracing::debug!(
                kind = kind.as_str(),
                method = %event.method,
                origin = event.origin.as_str(),
                request_id,
                timing_ms = timing,
                "RPC call succeeded"
            ),
            _ => tracing::warn!(
                kind = kind.as_str(),
                method = %event.method,
                origin = event.origin.as_str(),
                request_id,
                timing_ms = timing,
                error = %event.error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
                "RPC call failed"
            ),
        }
    }
}

impl EmitterSource for TracingEmitter {
    fn scoped(&self, ctx: &RequestContext) -> Option<Arc<dyn Emitter>> {
        Some(Arc::new(TracingEmitter {
            request_id: Some(ctx.request_id().to_string()),
        }))
    }
}
