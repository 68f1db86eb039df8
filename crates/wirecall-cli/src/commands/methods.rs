//! `wirecall methods`: List the demo methods.

use serde_json::json;

use super::print_json;
use crate::handlers::demo_registry;

pub fn list() -> Result<(), String> {
    let registry = demo_registry();
    print_json(&json!({ "methods": registry.method_names() }));
    Ok(())
}
