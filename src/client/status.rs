//! Session status lifecycle

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{Cadence, StageWindows};

/// Where a timestamp session is in its lifecycle
///
/// `idle → stamping → stamped → {batched | submitted | in_mempool | pending}
/// → anchored → confirmed`, with `error` reachable from any network step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Stamping,
    Stamped,
    Batched,
    Submitted,
    InMempool,
    Pending,
    Anchored,
    Confirmed,
    Error,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Confirmed)
    }

    /// One of the cycled pre-anchor sub-stages
    #[must_use]
    pub fn is_pending_stage(self) -> bool {
        matches!(
            self,
            SessionStatus::Batched
                | SessionStatus::Submitted
                | SessionStatus::InMempool
                | SessionStatus::Pending
        )
    }

    /// Refine a pending proof by its age
    #[must_use]
    pub fn pending_stage(age: Duration, windows: &StageWindows) -> Self {
        if age < windows.batch {
            SessionStatus::Batched
        } else if age < windows.submit {
            SessionStatus::Submitted
        } else if age < windows.mempool {
            SessionStatus::InMempool
        } else {
            SessionStatus::Pending
        }
    }

    /// Regular poll interval, `None` where nothing is scheduled
    #[must_use]
    pub fn cadence(self, cadence: &Cadence) -> Option<Duration> {
        match self {
            SessionStatus::Stamped => Some(cadence.stamped),
            SessionStatus::Batched => Some(cadence.batched),
            SessionStatus::Submitted => Some(cadence.submitted),
            SessionStatus::InMempool => Some(cadence.in_mempool),
            SessionStatus::Pending => Some(cadence.pending),
            SessionStatus::Anchored => Some(cadence.anchored),
            SessionStatus::Idle
            | SessionStatus::Stamping
            | SessionStatus::Confirmed
            | SessionStatus::Error => None,
        }
    }

    /// Short user-facing description
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            SessionStatus::Idle => "Not timestamped yet",
            SessionStatus::Stamping => "Submitting to timestamp servers",
            SessionStatus::Stamped => "Submitted, waiting for calendars",
            SessionStatus::Batched => "Batched by calendar servers",
            SessionStatus::Submitted => "Calendar transaction submitted",
            SessionStatus::InMempool => "Waiting in the Bitcoin mempool",
            SessionStatus::Pending => "Waiting for a Bitcoin block",
            SessionStatus::Anchored => "Anchored in Bitcoin, awaiting confirmations",
            SessionStatus::Confirmed => "Confirmed in Bitcoin",
            SessionStatus::Error => "Timestamp service unavailable",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Stamping => "stamping",
            SessionStatus::Stamped => "stamped",
            SessionStatus::Batched => "batched",
            SessionStatus::Submitted => "submitted",
            SessionStatus::InMempool => "in_mempool",
            SessionStatus::Pending => "pending",
            SessionStatus::Anchored => "anchored",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Error => "error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
