//! Polling configuration

use std::time::Duration;

use crate::anchoring::ots::parse_env;
use crate::config::Environment;

use super::backoff::Backoff;

/// Age thresholds that refine a pending proof into sub-stages
#[derive(Debug, Clone)]
pub struct StageWindows {
    /// Younger than this: `batched`
    pub batch: Duration,
    /// Younger than this: `submitted`
    pub submit: Duration,
    /// Younger than this: `in_mempool`; older is plain `pending`
    pub mempool: Duration,
}

impl Default for StageWindows {
    fn default() -> Self {
        Self {
            batch: Duration::from_secs(10 * 60),
            submit: Duration::from_secs(60 * 60),
            mempool: Duration::from_secs(3 * 60 * 60),
        }
    }
}

/// Poll interval per status
#[derive(Debug, Clone)]
pub struct Cadence {
    pub stamped: Duration,
    pub batched: Duration,
    pub submitted: Duration,
    pub in_mempool: Duration,
    pub pending: Duration,
    pub anchored: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            stamped: Duration::from_secs(30),
            batched: Duration::from_secs(5 * 60),
            submitted: Duration::from_secs(2 * 60),
            in_mempool: Duration::from_secs(30),
            pending: Duration::from_secs(2 * 60),
            anchored: Duration::from_secs(10 * 60),
        }
    }
}

/// Client polling configuration
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub windows: StageWindows,
    pub cadence: Cadence,
    /// Retry schedule for transient failures
    pub backoff: Backoff,
    /// Consecutive retries before the loop pauses
    pub max_error_attempts: u32,
    /// Confirmations needed for `confirmed`
    pub min_confirmations: u64,
    /// Production hides raw upstream error text
    pub environment: Environment,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            windows: StageWindows::default(),
            cadence: Cadence::default(),
            backoff: Backoff::default(),
            max_error_attempts: 6,
            min_confirmations: 3,
            environment: Environment::default(),
        }
    }
}

impl PollConfig {
    /// Load from environment variables
    ///
    /// - `MBT_ENVIRONMENT`: production | development
    /// - `MBT_MIN_CONFIRMATIONS` (default: 3)
    /// - `MBT_POLL_MAX_ERROR_ATTEMPTS` (default: 6)
    /// - `MBT_POLL_BACKOFF_BASE_SECS` (default: 15)
    /// - `MBT_POLL_BACKOFF_CAP_SECS` (default: 600)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let backoff = Backoff {
            base: parse_env("MBT_POLL_BACKOFF_BASE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.backoff.base),
            cap: parse_env("MBT_POLL_BACKOFF_CAP_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.backoff.cap),
            ..defaults.backoff
        };

        Self {
            backoff,
            max_error_attempts: parse_env("MBT_POLL_MAX_ERROR_ATTEMPTS")
                .unwrap_or(defaults.max_error_attempts),
            min_confirmations: parse_env("MBT_MIN_CONFIRMATIONS")
                .unwrap_or(defaults.min_confirmations),
            environment: parse_env("MBT_ENVIRONMENT").unwrap_or(defaults.environment),
            ..defaults
        }
    }
}
