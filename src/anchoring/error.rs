//! Upstream (pool, calendar, tip source) error types

use thiserror::Error;

use super::ots::OtsError;

/// Errors from talking to a remote timestamping or chain service
#[derive(Debug, Clone, Error)]
pub enum AnchorError {
    /// Network communication error
    #[error("network error: {0}")]
    Network(String),

    /// Service returned an error status
    #[error("service error: {0}")]
    ServiceError(String),

    /// Invalid response from service
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request timeout
    #[error("timeout after {0} ms")]
    Timeout(u64),

    /// Calendar does not have an upgrade yet (HTTP 404)
    #[error("not yet available")]
    Pending,

    /// Proof bytes from upstream are structurally invalid
    #[error("protocol error: {0}")]
    Protocol(#[from] OtsError),
}

impl AnchorError {
    /// Transport-level failure (as opposed to a well-formed negative answer)
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::ServiceError(_)
        )
    }

    pub(crate) fn from_reqwest(e: &reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            Self::Timeout(timeout_ms)
        } else {
            Self::Network(e.to_string())
        }
    }
}
