//! Request body errors raised before a call reaches its handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use wirecall_core::{Envelope, ErrorPayload};

pub const INVALID_BODY_CODE: &str = "ERR_INVALID_BODY";
pub const BODY_TOO_LARGE_CODE: &str = "ERR_BODY_TOO_LARGE";

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("Request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    Read(String),

    #[error("Invalid JSON body: {0}")]
    Invalid(String),
}

impl BodyError {
    pub fn code(&self) -> &'static str {
        match self {
            BodyError::TooLarge { .. } => BODY_TOO_LARGE_CODE,
            BodyError::Read(_) | BodyError::Invalid(_) => INVALID_BODY_CODE,
        }
    }
}

impl IntoResponse for BodyError {
    fn into_response(self) -> Response {
        let status = match &self {
            BodyError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            BodyError::Read(_) | BodyError::Invalid(_) => StatusCode::BAD_REQUEST,
        };

        let body = Envelope::failure(ErrorPayload {
            message: Some(self.to_string()),
            code: Some(self.code().to_string()),
            meta: None,
        });
        (status, axum::Json(body)).into_response()
    }
}
