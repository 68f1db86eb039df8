//! Client-side error types.

use serde_json::Value;
use wirecall_core::ResponseError;

/// Failure of the underlying HTTP exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid JSON response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success envelope. Carries the
    /// envelope's `data` verbatim.
    #[error("RPC call failed: {0}")]
    Failure(ResponseError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to encode RPC arguments: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to decode RPC result: {0}")]
    Decode(String),

    #[error(
        "Don't bundle server-side handlers in the client. Build the client \
         factory without a callable handler registry; handlers belong to the server."
    )]
    ServerHandlersBundled,
}

impl ClientError {
    /// The failure envelope's `data`, if the server answered with one.
    pub fn failure_data(&self) -> Option<&Value> {
        match self {
            ClientError::Failure(err) => Some(err.data()),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Failure(err) => err.code(),
            _ => None,
        }
    }
}
