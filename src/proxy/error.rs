// Pipeline errors and their mapping to inbound responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Everything that can stop a request from being relayed.
///
/// The display strings are the exact `error` texts clients receive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// The path segment is not valid standard base64.
    #[error("invalid url")]
    Decode,

    /// The decoded bytes are not an absolute, forwardable URL.
    #[error("invalid url")]
    InvalidUrl,

    #[error("hostname not whitelisted in ALLOWED_DOMAINS environment variable")]
    UnauthorizedHost,

    #[error("invalid method")]
    MethodNotSupported,

    /// The outbound exchange could not complete (DNS, connect, TLS, timeout).
    #[error("{0}")]
    Transport(String),
}

impl ProxyError {
    /// Validation failures keep the default status; only transport failures are 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
