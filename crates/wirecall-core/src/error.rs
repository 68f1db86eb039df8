//! Error types shared by every dispatch path.
//!
//! `RpcError` is what an in-process caller sees. It is either a
//! `MissingHandlerError` (the method is not registered) or the handler's
//! own `HandlerError`, returned exactly as the handler produced it.
//! `ResponseError` is the browser-side view of a failed remote call: the
//! failure `data` from the wire, kept verbatim.
//!
//! When the `axum` feature is enabled, `RpcError` also implements
//! `IntoResponse` so the HTTP adapter can answer with the failure envelope.

use serde_json::Value;

use crate::envelope::ErrorPayload;

/// Error code carried by every [`MissingHandlerError`].
pub const MISSING_HANDLER_CODE: &str = "ERR_MISSING_HANDLER";

/// Error code used when a typed handler cannot deserialize its argument.
pub const INVALID_PARAMS_CODE: &str = "ERR_INVALID_PARAMS";

/// Error code used when a typed handler's result cannot be serialized.
pub const INVALID_RESULT_CODE: &str = "ERR_INVALID_RESULT";

/// No handler is registered under the requested method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing RPC handler for {method}")]
pub struct MissingHandlerError {
    method: String,
}

impl MissingHandlerError {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn code(&self) -> &'static str {
        MISSING_HANDLER_CODE
    }
}

/// The dispatcher was asked to run without a request-bound context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("RPC requires a context")]
pub struct ContextError;

/// Error raised by a handler.
///
/// Only `message`, `code` and `meta` survive the trip across the wire;
/// the in-process caller gets the whole value back untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
    pub code: Option<String>,
    pub meta: Option<Value>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            meta: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn invalid_params(err: impl std::fmt::Display) -> Self {
        Self::new(format!("Invalid params: {}", err)).with_code(INVALID_PARAMS_CODE)
    }

    /// Project onto the wire shape `{message, code, meta}`.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            message: Some(self.message.clone()),
            code: self.code.clone(),
            meta: self.meta.clone(),
        }
    }
}

/// Outcome of a failed in-process dispatch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RpcError {
    #[error(transparent)]
    MissingHandler(#[from] MissingHandlerError),

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl RpcError {
    pub fn code(&self) -> Option<&str> {
        match self {
            RpcError::MissingHandler(e) => Some(e.code()),
            RpcError::Handler(e) => e.code.as_deref(),
        }
    }

    pub fn is_missing_handler(&self) -> bool {
        matches!(self, RpcError::MissingHandler(_))
    }

    /// Wire projection. A missing handler reports `{message, code}` only.
    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            RpcError::MissingHandler(e) => ErrorPayload {
                message: Some(e.to_string()),
                code: Some(e.code().to_string()),
                meta: None,
            },
            RpcError::Handler(e) => e.to_payload(),
        }
    }
}

/// A failed remote call as seen by the browser-side dispatcher.
///
/// `data` is the failure envelope's `data` exactly as received. The
/// accessors recover `message`/`code`/`meta` when `data` is an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseError {
    data: Value,
}

impl ResponseError {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }

    pub fn code(&self) -> Option<&str> {
        self.data.get("code").and_then(Value::as_str)
    }

    pub fn meta(&self) -> Option<&Value> {
        self.data.get("meta").filter(|meta| !meta.is_null())
    }
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.message() {
            Some(message) => f.write_str(message),
            None => write!(f, "{}", self.data),
        }
    }
}

impl std::error::Error for ResponseError {}

// ---------------------------------------------------------------------------
// axum integration (opt-in via feature flag)
// ---------------------------------------------------------------------------

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for RpcError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        // 404 is reserved for unknown methods; handler failures ride on 200.
        let status = match &self {
            RpcError::MissingHandler(_) => StatusCode::NOT_FOUND,
            RpcError::Handler(_) => StatusCode::OK,
        };

        let body = crate::envelope::Envelope::Failure(self.to_payload());
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_handler_message_and_code() {
        let err = MissingHandlerError::new("test");
        assert_eq!(err.to_string(), "Missing RPC handler for test");
        assert_eq!(err.code(), "ERR_MISSING_HANDLER");
        assert_eq!(err.method(), "test");
    }

    #[test]
    fn test_missing_handler_payload_has_no_meta() {
        let payload = RpcError::from(MissingHandlerError::new("valueOf")).to_payload();
        let value = serde_json::to_value(payload).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "Missing RPC handler for valueOf",
                "code": "ERR_MISSING_HANDLER"
            })
        );
    }

    #[test]
    fn test_handler_error_payload_keeps_all_fields() {
        let err = HandlerError::new("Test Failure")
            .with_code("ERR_CODE_TEST")
            .with_meta(json!({ "hello": "world" }));
        let value = serde_json::to_value(RpcError::from(err).to_payload()).unwrap();
        assert_eq!(value["message"], "Test Failure");
        assert_eq!(value["code"], "ERR_CODE_TEST");
        assert_eq!(value["meta"], json!({ "hello": "world" }));
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_context_error_message() {
        assert_eq!(ContextError.to_string(), "RPC requires a context");
    }

    #[test]
    fn test_response_error_accessors() {
        let err = ResponseError::new(json!({
            "message": "boom",
            "code": "ERR_BOOM",
            "meta": { "retry": false }
        }));
        assert_eq!(err.message(), Some("boom"));
        assert_eq!(err.code(), Some("ERR_BOOM"));
        assert_eq!(err.meta(), Some(&json!({ "retry": false })));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_response_error_non_object_data() {
        let err = ResponseError::new(json!("failure data"));
        assert_eq!(err.message(), None);
        assert_eq!(err.code(), None);
        assert_eq!(err.data(), &json!("failure data"));
        assert_eq!(err.to_string(), "\"failure data\"");
    }

    #[test]
    fn test_rpc_error_code() {
        let missing = RpcError::from(MissingHandlerError::new("x"));
        assert_eq!(missing.code(), Some(MISSING_HANDLER_CODE));
        assert!(missing.is_missing_handler());

        let plain = RpcError::from(HandlerError::new("no code"));
        assert_eq!(plain.code(), None);
        assert!(!plain.is_missing_handler());
    }
}
