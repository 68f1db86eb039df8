//! RPC middleware.
//!
//! Intercepts `POST <prefix>/api/<method>` and answers with the response
//! envelope:
//!
//! | Outcome              | HTTP | Body                                              |
//! |----------------------|------|---------------------------------------------------|
//! | handler succeeded    | 200  | `{"status":"success","data":<result>}`            |
//! | handler failed       | 200  | `{"status":"failure","data":{message,code,meta}}` |
//! | method not found     | 404  | `{"status":"failure","data":{message,code}}`      |
//!
//! Every other request passes through to the inner service with a fresh
//! [`RequestContext`] in its extensions, so downstream handlers can make
//! in-process calls through [`RpcService::from_context`].

use std::sync::Arc;

use axum::body::{Body, HttpBody};
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Router;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use regex::Regex;
use serde_json::Value;
use wirecall_core::telemetry::Origin;
use wirecall_core::{Envelope, RequestContext, RpcService};

use crate::error::BodyError;

lazy_static::lazy_static! {
    static ref METHOD_SEGMENT: Regex =
        Regex::new(r"^/api/([^/]+)").expect("method segment pattern is valid");
}

/// Header whose value, when present, becomes the context's request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared state of the RPC middleware.
pub struct RpcLayerState {
    service: RpcService,
    route_prefix: String,
    body_limit: usize,
}

impl RpcLayerState {
    pub fn new(service: RpcService, route_prefix: impl Into<String>, body_limit: usize) -> Self {
        Self {
            service,
            route_prefix: normalize_prefix(route_prefix.into()),
            body_limit,
        }
    }

    pub fn service(&self) -> &RpcService {
        &self.service
    }

    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    /// The method name addressed by this request, if it is an RPC call.
    ///
    /// A matching path with nothing after `/api/` yields an empty name,
    /// which no registry resolves.
    pub fn rpc_method(&self, method: &Method, path: &str) -> Option<String> {
        if method != Method::POST {
            return None;
        }

        let rest = path.strip_prefix(self.route_prefix.as_str())?;
        if !rest.starts_with("/api/") {
            return None;
        }

        let name = METHOD_SEGMENT
            .captures(rest)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        Some(name)
    }
}

fn normalize_prefix(prefix: String) -> String {
    prefix.trim_end_matches('/').to_string()
}

/// Wrap `app` with the RPC middleware.
pub fn with_rpc(app: Router, state: Arc<RpcLayerState>) -> Router {
    app.layer(axum::middleware::from_fn_with_state(state, rpc_middleware))
}

pub async fn rpc_middleware(
    State(state): State<Arc<RpcLayerState>>,
    request: Request,
    next: Next,
) -> Response {
    let rpc_method = state.rpc_method(request.method(), request.uri().path());
    let (mut parts, body) = request.into_parts();

    let Some(method) = rpc_method else {
        parts.extensions.insert(context_from_parts(&parts, Value::Null));
        return next.run(Request::from_parts(parts, body)).await;
    };

    // Unknown methods are answered without reading the body.
    let args = if state.service.registry().contains(&method) {
        match read_json_body(&parts.headers, body, state.body_limit).await {
            Ok(args) => args,
            Err(err) => {
                tracing::warn!(method = %method, error = %err, "Rejected RPC request body");
                return err.into_response();
            }
        }
    } else {
        Value::Null
    };

    let ctx = context_from_parts(&parts, args.clone());
    tracing::debug!(method = %method, request_id = ctx.request_id(), "Dispatching RPC request");

    match state
        .service
        .dispatch(Origin::Browser, &method, args, &ctx)
        .await
    {
        Ok(data) => Envelope::success(data).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Read and parse a JSON body. An empty body parses as `{}`.
async fn read_json_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Value, BodyError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) || body.size_hint().lower() > limit as u64 {
        return Err(BodyError::TooLarge { limit });
    }

    // Streamed bodies carry no length up front; the limit trips mid-read.
    let bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                BodyError::TooLarge { limit }
            } else {
                BodyError::Read(e.to_string())
            }
        })?
        .to_bytes();

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }

    serde_json::from_slice(&bytes).map_err(|e| BodyError::Invalid(e.to_string()))
}

/// Build the execution context for one inbound request.
pub fn context_from_parts(parts: &Parts, body: Value) -> RequestContext {
    let mut builder = RequestContext::builder()
        .http_method(parts.method.as_str())
        .path(parts.uri.path())
        .body(body);

    for (name, value) in &parts.headers {
        builder = builder.header(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }

    if let Some(id) = parts
        .headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        builder = builder.request_id(id);
    }

    builder.build()
}
