//! Client-side error types

use thiserror::Error;

use crate::config::Environment;

/// Failure talking to the timestamp proxy
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Connection refused, DNS failure, reset
    #[error("proxy unreachable: {0}")]
    Unreachable(String),

    #[error("proxy request timed out")]
    Timeout,

    /// Non-2xx answer from the proxy
    #[error("proxy returned {status} ({code}): {message}")]
    Upstream {
        status: u16,
        code: String,
        message: String,
    },

    /// Response body did not decode
    #[error("invalid proxy response: {0}")]
    InvalidResponse(String),

    /// Operation needs state the session does not have
    #[error("invalid session state: {0}")]
    InvalidState(String),
}

impl ClientError {
    /// Whether the poll loop should retry with backoff
    ///
    /// Unreachable, timeout and any 5xx are retried. Validation (4xx) and
    /// protocol (422) failures never are.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Unreachable(_) | ClientError::Timeout => true,
            ClientError::Upstream { status, .. } => *status >= 500,
            ClientError::InvalidResponse(_) | ClientError::InvalidState(_) => false,
        }
    }

    /// Message safe to show an end user
    #[must_use]
    pub fn user_message(&self, environment: Environment) -> String {
        if !environment.is_production() {
            return self.to_string();
        }
        match self {
            ClientError::Unreachable(_) => "Timestamp service is unreachable".to_string(),
            ClientError::Timeout => "Timestamp service timed out".to_string(),
            ClientError::Upstream { status, .. } if *status >= 500 => {
                "Timestamp servers are temporarily unavailable".to_string()
            }
            ClientError::Upstream { .. } => "The timestamp request was rejected".to_string(),
            ClientError::InvalidResponse(_) => {
                "The timestamp service sent an unreadable response".to_string()
            }
            ClientError::InvalidState(_) => "Nothing to check yet".to_string(),
        }
    }

    pub(crate) fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else {
            ClientError::Unreachable(e.to_string())
        }
    }
}
