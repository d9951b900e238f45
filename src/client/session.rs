//! Client-owned timestamp session

use tokio::time::Instant;

use crate::api::dto::{StampResponse, UpgradeResponse};
use crate::config::Environment;

use super::config::PollConfig;
use super::error::ClientError;
use super::status::SessionStatus;

/// Bitcoin block information for an anchored proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub height: u64,
    /// Last known count; kept when a later lookup is unavailable
    pub confirmations: Option<u64>,
    /// Tip height the count was computed against
    pub tip_height: Option<u64>,
}

/// State of one timestamp request, mutated only by the polling machine
#[derive(Debug, Clone)]
pub struct TimestampSession {
    /// Merkle root being timestamped
    pub root_hex: Option<String>,
    /// Latest proof; empty until stamped
    pub ots_proof: Vec<u8>,
    pub status: SessionStatus,
    pub block_info: Option<BlockInfo>,
    /// Pool servers that accepted the digest
    pub submission_servers: Vec<String>,
    /// Calendar server that last advanced the proof
    pub calendar_server_tip: Option<String>,
    pub stamped_at: Option<Instant>,
    pub consecutive_errors: u32,
    pub last_error: Option<ClientError>,
    /// Bumped by reset so stale in-flight results are dropped
    pub epoch: u64,
}

impl Default for TimestampSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root_hex: None,
            ots_proof: Vec::new(),
            status: SessionStatus::Idle,
            block_info: None,
            submission_servers: Vec::new(),
            calendar_server_tip: None,
            stamped_at: None,
            consecutive_errors: 0,
            last_error: None,
            epoch: 0,
        }
    }

    /// Back to `idle` with a new epoch
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self::new();
        self.epoch = epoch;
    }

    #[must_use]
    pub fn is_stamped(&self) -> bool {
        !self.ots_proof.is_empty()
    }

    /// Reached `anchored` at some point; survives later errors
    #[must_use]
    pub fn is_anchored(&self) -> bool {
        self.block_info.is_some()
    }

    pub fn begin_stamp(&mut self, root_hex: &str) {
        self.root_hex = Some(root_hex.to_string());
        self.status = SessionStatus::Stamping;
    }

    pub fn apply_stamp(&mut self, response: StampResponse, now: Instant) {
        self.ots_proof = response.ots_file;
        self.submission_servers = response.servers;
        self.stamped_at = Some(now);
        self.status = SessionStatus::Stamped;
        self.clear_errors();
    }

    /// Fold an upgrade response into the session
    ///
    /// Status only moves forward: an anchored session stays anchored when the
    /// response carries no attestation or no confirmation count, and
    /// `confirmed` is never left.
    pub fn apply_upgrade(&mut self, response: UpgradeResponse, now: Instant, config: &PollConfig) {
        self.clear_errors();

        if self.status == SessionStatus::Confirmed {
            return;
        }

        if let Some(server) = response.calendar_server.clone() {
            self.calendar_server_tip = Some(server);
        }

        match response.block_height {
            Some(height) => {
                let previous = self.block_info.take();
                let confirmations = response
                    .confirmations
                    .or_else(|| previous.as_ref().and_then(|b| b.confirmations));
                let tip_height = response
                    .tip_height
                    .or_else(|| previous.as_ref().and_then(|b| b.tip_height));

                self.block_info = Some(BlockInfo {
                    height,
                    confirmations,
                    tip_height,
                });
                self.ots_proof = response.ots_file;
                self.status = match confirmations {
                    Some(n) if n >= config.min_confirmations => SessionStatus::Confirmed,
                    _ => SessionStatus::Anchored,
                };
            }
            None if self.is_anchored() => {
                // Keep the richer proof we already hold
                self.status = SessionStatus::Anchored;
            }
            None => {
                if !response.ots_file.is_empty() {
                    self.ots_proof = response.ots_file;
                }
                let age = self
                    .stamped_at
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or_default();
                self.status = SessionStatus::pending_stage(age, &config.windows);
            }
        }
    }

    pub fn record_error(&mut self, error: ClientError) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        self.last_error = Some(error);
        self.status = SessionStatus::Error;
    }

    fn clear_errors(&mut self) {
        self.consecutive_errors = 0;
        self.last_error = None;
    }

    /// Terse user-facing message for the current status
    #[must_use]
    pub fn status_message(&self, environment: Environment) -> String {
        match (&self.status, &self.last_error, &self.block_info) {
            (SessionStatus::Error, Some(err), _) => err.user_message(environment),
            (SessionStatus::Anchored, _, Some(info)) => match info.confirmations {
                Some(n) => format!("Anchored in block {} ({n} confirmations)", info.height),
                None => format!("Anchored in block {}", info.height),
            },
            (SessionStatus::Confirmed, _, Some(info)) => {
                format!("Confirmed in block {}", info.height)
            }
            (status, _, _) => status.message().to_string(),
        }
    }
}
