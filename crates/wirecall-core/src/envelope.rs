//! Response envelope wire types.
//!
//! Every RPC answer over HTTP is one of:
//!
//! ```text
//! {"status": "success", "data": <result>}
//! {"status": "failure", "data": {"message": ..., "code": ..., "meta": ...}}
//! ```
//!
//! These types are not tied to any HTTP framework.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status string of a successful envelope.
pub const STATUS_SUCCESS: &str = "success";

/// Status string of a failed envelope.
pub const STATUS_FAILURE: &str = "failure";

/// `{status, data}` response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum Envelope {
    Success(Value),
    Failure(ErrorPayload),
}

/// Failure `data`: the plain projection of an error. Absent fields are
/// omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Envelope::Success(data)
    }

    pub fn failure(payload: ErrorPayload) -> Self {
        Envelope::Failure(payload)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            Envelope::Success(_) => STATUS_SUCCESS,
            Envelope::Failure(_) => STATUS_FAILURE,
        }
    }
}

impl From<Result<Value, crate::error::RpcError>> for Envelope {
    fn from(result: Result<Value, crate::error::RpcError>) -> Self {
        match result {
            Ok(data) => Envelope::Success(data),
            Err(err) => Envelope::Failure(err.to_payload()),
        }
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Envelope {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self).into_response()
    }
}
