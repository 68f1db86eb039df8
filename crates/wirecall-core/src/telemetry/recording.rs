//! Emitter that keeps every event in memory. Used by tests to assert on
//! emission counts and payloads.

use std::sync::{Arc, Mutex, PoisonError};

use super::{Emitter, EmitterSource, EventKind, RpcEvent};
use crate::context::RequestContext;

#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    events: Arc<Mutex<Vec<(EventKind, RpcEvent)>>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(EventKind, RpcEvent)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Emitter for RecordingEmitter {
    fn emit(&self, kind: EventKind, event: &RpcEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, event.clone()));
    }
}

impl EmitterSource for RecordingEmitter {
    fn scoped(&self, _ctx: &RequestContext) -> Option<Arc<dyn Emitter>> {
        Some(Arc::new(self.clone()))
    }
}
