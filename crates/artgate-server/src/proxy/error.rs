//! Route-boundary errors
//!
//! Every failure a proxy route can hit is converted here into a JSON
//! envelope `{"error": "<message>"}`. Upstream failures keep the upstream
//! status code; local failures map to 400/401/500. Transport and internal
//! details are logged server-side and never sent to the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::error::ArtgateError;
use crate::vault::DecryptionError;

/// Errors surfaced by the proxy and config routes
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Missing, malformed or expired bearer credential
    #[error("not logged in")]
    Unauthenticated,

    /// The principal has no usable credential for the requested service
    #[error("{0}")]
    Unconfigured(String),

    /// A stored secret that the operation requires could not be decrypted
    #[error("stored API key could not be decrypted")]
    Decryption(#[from] DecryptionError),

    /// Upstream answered with a non-success status
    #[error("{body}")]
    Upstream { status: StatusCode, body: String },

    /// Request body missing a required field or not parseable
    #[error("{0}")]
    MalformedRequest(String),

    /// Upstream could not be reached; the detail stays in the server log
    #[error("proxy request failed")]
    Transport(String),

    /// Anything else that went wrong locally
    #[error("internal server error")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ProxyError::Unconfigured(_) | ProxyError::MalformedRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Decryption(_) | ProxyError::Transport(_) | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ProxyError::Unauthenticated => "unauthenticated",
            ProxyError::Unconfigured(_) => "unconfigured",
            ProxyError::Decryption(_) => "decryption",
            ProxyError::Upstream { .. } => "upstream",
            ProxyError::MalformedRequest(_) => "malformed_request",
            ProxyError::Transport(_) => "transport",
            ProxyError::Internal(_) => "internal",
        }
    }

    /// Build an upstream error from a reqwest status and the body text
    pub fn upstream(status: reqwest::StatusCode, prefix: &str, body: &str) -> Self {
        ProxyError::Upstream {
            status: StatusCode::from_u16(status.as_u16())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: format!("{prefix}: {body}"),
        }
    }

    /// Classify a reqwest send failure
    pub fn transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            ProxyError::Transport(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            ProxyError::Transport(format!("Failed to connect to upstream: {e}"))
        } else {
            ProxyError::Transport(format!("Request failed: {e}"))
        }
    }
}

impl From<ArtgateError> for ProxyError {
    fn from(e: ArtgateError) -> Self {
        ProxyError::Internal(e.to_string())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ProxyError::Transport(detail) | ProxyError::Internal(detail) => {
                tracing::error!(
                    error_type = self.category(),
                    error_message = %detail,
                    "Request failed"
                );
            }
            ProxyError::Decryption(e) => {
                tracing::error!(error_type = self.category(), "Secret unusable: {e}");
            }
            ProxyError::Upstream { status, .. } => {
                tracing::warn!(
                    error_type = self.category(),
                    status = %status,
                    "Upstream returned error, passing status through"
                );
            }
            _ => {
                tracing::debug!(error_type = self.category(), status = %status, "{self}");
            }
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
