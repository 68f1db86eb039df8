//! `wirecall call`: Invoke a method on a running server.

use std::sync::Arc;

use serde_json::Value;
use wirecall_client::{ClientError, ReqwestFetch, RpcClientFactory};

use super::print_json;

/// Parse `--args`. Absent args are sent as `{}` by the client.
pub fn parse_args(args: Option<&str>) -> Result<Option<Value>, String> {
    args.map(|raw| serde_json::from_str(raw).map_err(|e| format!("Invalid JSON args: {}", e)))
        .transpose()
}

/// Call `method` and return the success data.
///
/// A failure envelope becomes `Err` carrying its `data` pretty-printed.
pub async fn invoke(
    url: &str,
    route_prefix: Option<&str>,
    method: &str,
    args: Option<Value>,
) -> Result<Value, String> {
    let mut builder = RpcClientFactory::builder(Arc::new(ReqwestFetch::new(url)));
    if let Some(prefix) = route_prefix {
        builder = builder.route_prefix(prefix);
    }
    let rpc = builder.build().map_err(|e| e.to_string())?.client();
    tracing::debug!(url = %rpc.url_for(method), "Calling RPC method");

    match rpc.request(method, args).await {
        Ok(data) => Ok(data),
        Err(ClientError::Failure(failure)) => {
            tracing::debug!(method, code = ?failure.code(), "RPC method failed");
            Err(format!(
                "{} failed:\n{}",
                method,
                serde_json::to_string_pretty(failure.data())
                    .unwrap_or_else(|_| failure.to_string())
            ))
        }
        Err(e) => Err(e.to_string()),
    }
}

pub async fn run(
    url: &str,
    route_prefix: Option<&str>,
    method: &str,
    args: Option<&str>,
) -> Result<(), String> {
    let args = parse_args(args)?;
    let data = invoke(url, route_prefix, method, args).await?;
    print_json(&data);
    Ok(())
}
