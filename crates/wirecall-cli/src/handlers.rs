//! Demo handlers served by `wirecall serve`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use wirecall_core::{HandlerError, HandlerRegistry};

pub const DEMO_FAILURE_CODE: &str = "ERR_DEMO_FAILURE";

#[derive(Debug, Deserialize)]
pub struct AddParams {
    pub a: f64,
    pub b: f64,
}

#[derive(Debug, Serialize)]
pub struct AddResult {
    pub sum: f64,
}

/// Build the registry of demo methods:
///
/// - `echo` returns its argument unchanged
/// - `math.add` takes `{a, b}` and returns `{sum}`
/// - `fail` always fails with [`DEMO_FAILURE_CODE`] and the argument as meta
pub fn demo_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register_sync("echo", |args, _ctx| Ok(args))
        .register_typed("math.add", |p: AddParams, _ctx| async move {
            Ok(AddResult { sum: p.a + p.b })
        })
        .register_sync("fail", |args, ctx| {
            Err(HandlerError::new("Demo failure")
                .with_code(DEMO_FAILURE_CODE)
                .with_meta(json!({ "args": args, "requestId": ctx.request_id() })))
        });
    registry
}
