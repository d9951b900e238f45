//! Stateless timestamp proxy
//!
//! `stamp` submits a digest to every pool server and needs a quorum of them to
//! answer. `upgrade` races the calendar servers for each pending commitment in
//! a proof and merges whatever attestations come back. Neither keeps state
//! between calls.

mod stamp;
mod upgrade;

use std::time::Duration;

use crate::anchoring::ots::{CalendarClient, OtsConfig};
use crate::anchoring::AnchorError;
use crate::error::{ServerError, ServerResult};

pub use stamp::{parse_digest, StampResult};
pub use upgrade::{UpgradeResult, MAX_PROOF_BYTES};

pub struct TimestampProxy {
    client: CalendarClient,
    pool_urls: Vec<String>,
    calendar_urls: Vec<String>,
    quorum: usize,
    source_timeout: Duration,
    request_timeout: Duration,
}

impl TimestampProxy {
    pub fn new(config: &OtsConfig) -> Result<Self, AnchorError> {
        Ok(Self {
            client: CalendarClient::new(config.source_timeout)?,
            pool_urls: config.pool_urls.clone(),
            calendar_urls: config.calendar_urls.clone(),
            quorum: config.quorum,
            source_timeout: config.source_timeout,
            request_timeout: config.request_timeout,
        })
    }

    /// Submit a hex digest to the pool servers
    ///
    /// # Errors
    ///
    /// `InvalidHash` for a malformed digest, `UpstreamUnavailable` when fewer
    /// than `quorum` pools succeed, `UpstreamTimeout` past the request deadline
    /// or when every failed pool timed out.
    pub async fn stamp(&self, digest_hex: &str) -> ServerResult<StampResult> {
        let digest = parse_digest(digest_hex)?;
        self.with_deadline(self.stamp_digest(&digest)).await
    }

    /// Ask calendars for upgrades to every pending commitment in `proof`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty or oversized proof, `Protocol` for a
    /// corrupt attestation stream, `UpstreamUnavailable` when every calendar
    /// query failed at the transport level, `UpstreamTimeout` past the deadline.
    pub async fn upgrade(&self, proof: &[u8]) -> ServerResult<UpgradeResult> {
        upgrade::check_size(proof)?;
        self.with_deadline(self.upgrade_proof(proof)).await
    }

    async fn with_deadline<T>(
        &self,
        fut: impl std::future::Future<Output = ServerResult<T>>,
    ) -> ServerResult<T> {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                let ms = u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(timeout_ms = ms, "Proxy request deadline exceeded");
                Err(ServerError::UpstreamTimeout(ms))
            }
        }
    }
}
