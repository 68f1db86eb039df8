//! In-process event bus for RPC telemetry.
//!
//! Hosts subscribe to receive every `RpcEvent`, tagged with the request id
//! of the context the event was scoped to.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::{Emitter, EmitterSource, EventKind, RpcEvent};
use crate::context::RequestContext;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct BusEvent {
    pub kind: EventKind,
    /// `None` when emitted outside a request scope.
    pub request_id: Option<String>,
    pub event: RpcEvent,
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, kind: EventKind, request_id: Option<String>, event: &RpcEvent) {
        // No subscribers is not an error.
        let _ = self.sender.send(BusEvent {
            kind,
            request_id,
            event: event.clone(),
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter for EventBus {
    fn emit(&self, kind: EventKind, event: &RpcEvent) {
        self.publish(kind, None, event);
    }
}

impl EmitterSource for EventBus {
    fn scoped(&self, ctx: &RequestContext) -> Option<Arc<dyn Emitter>> {
        Some(Arc::new(ScopedBusEmitter {
            bus: self.clone(),
            request_id: ctx.request_id().to_string(),
        }))
    }
}

struct ScopedBusEmitter {
    bus: EventBus,
    request_id: String,
}

impl Emitter for ScopedBusEmitter {
    fn emit(&self, kind: EventKind, event: &RpcEvent) {
        self.bus.publish(kind, Some(self.request_id.clone()), event);
    }
}
