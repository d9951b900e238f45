//! Server error types

use axum::http::StatusCode;
use thiserror::Error;

use crate::anchoring::ots::OtsError;
use crate::anchoring::AnchorError;
use crate::config::Environment;

/// Main server error type
#[derive(Debug, Error)]
pub enum ServerError {
    // ========== Validation Errors ==========
    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid hash format
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    // ========== Protocol Errors ==========
    /// Proof bytes are structurally invalid
    #[error("protocol error: {0}")]
    Protocol(#[from] OtsError),

    // ========== Upstream Errors ==========
    /// Operation exceeded its deadline
    #[error("upstream timeout after {0} ms")]
    UpstreamTimeout(u64),

    /// Not enough upstream servers answered
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    // ========== Server Errors ==========
    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Server result type alias
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            ServerError::InvalidArgument(_) | ServerError::InvalidHash(_) => {
                StatusCode::BAD_REQUEST
            }

            // 422 Unprocessable Entity
            ServerError::Protocol(_) => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable
            ServerError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

            // 504 Gateway Timeout
            ServerError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code for API response
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ServerError::InvalidHash(_) => "INVALID_HASH",
            ServerError::Protocol(_) => "PROTOCOL_ERROR",
            ServerError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            ServerError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Check if error is recoverable (client can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ServerError::UpstreamTimeout(_) | ServerError::UpstreamUnavailable(_)
        )
    }

    /// Replace upstream and internal detail with a generic message in production
    #[must_use]
    pub fn sanitize(self, environment: Environment) -> Self {
        if !environment.is_production() {
            return self;
        }
        match self {
            ServerError::UpstreamUnavailable(_) => {
                ServerError::UpstreamUnavailable("timestamp servers are unavailable".into())
            }
            ServerError::Internal(_) => ServerError::Internal("unexpected server error".into()),
            ServerError::Config(_) => ServerError::Config("server misconfigured".into()),
            other => other,
        }
    }
}

// Conversions from external errors

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::InvalidArgument(e.to_string())
    }
}

impl From<hex::FromHexError> for ServerError {
    fn from(e: hex::FromHexError) -> Self {
        ServerError::InvalidHash(e.to_string())
    }
}

impl From<AnchorError> for ServerError {
    fn from(e: AnchorError) -> Self {
        match e {
            AnchorError::Protocol(ots) => ServerError::Protocol(ots),
            AnchorError::Timeout(ms) => ServerError::UpstreamTimeout(ms),
            other => ServerError::UpstreamUnavailable(other.to_string()),
        }
    }
}
