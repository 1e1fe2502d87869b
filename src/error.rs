use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No token, or a token that failed verification. Callers never learn which.
    #[error("unauthorized access")]
    Unauthorized,

    /// Verified principal does not own the requested data.
    #[error("forbidden access")]
    Forbidden,

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("{0}")]
    BadRequest(String),

    /// Document store failure, passed through to the client.
    #[error("{0:#}")]
    Store(anyhow::Error),

    #[error("internal server error")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidId(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Store(e) => tracing::error!(error = %e, "store operation failed"),
            Self::Internal(e) => tracing::error!(error = %e, "internal error"),
            _ => {}
        }
        (self.status(), self.to_string()).into_response()
    }
}
