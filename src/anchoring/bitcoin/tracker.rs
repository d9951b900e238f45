//! Confirmation counting against a cached Bitcoin tip height

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::anchoring::fanout::first_success;
use crate::cache::TtlCache;

use super::source::TipSource;

/// Tip-tracking configuration
#[derive(Debug, Clone)]
pub struct BitcoinConfig {
    /// How long a fetched tip height is reused
    pub tip_cache_ttl: Duration,

    /// Timeout for each tip source
    pub source_timeout: Duration,
}

impl Default for BitcoinConfig {
    fn default() -> Self {
        Self {
            tip_cache_ttl: Duration::from_secs(30),
            source_timeout: Duration::from_secs(5),
        }
    }
}

impl BitcoinConfig {
    /// Environment variables:
    /// - `MBT_TIP_CACHE_TTL_SECS` (default: 30)
    /// - `MBT_TIP_SOURCE_TIMEOUT_MS` (default: 5000)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tip_cache_ttl: crate::anchoring::ots::parse_env("MBT_TIP_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.tip_cache_ttl),
            source_timeout: crate::anchoring::ots::parse_env("MBT_TIP_SOURCE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.source_timeout),
        }
    }
}

/// Confirmation count for a block, or "unknown" when no source answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationInfo {
    pub confirmations: Option<u64>,
    pub tip_height: Option<u64>,
    pub available: bool,
}

impl ConfirmationInfo {
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// `tip - block + 1`, floored at zero
#[must_use]
pub fn confirmations_at(tip_height: u64, block_height: u64) -> u64 {
    if block_height > tip_height {
        0
    } else {
        tip_height - block_height + 1
    }
}

/// Resolves the current tip from several sources and counts confirmations
pub struct ConfirmationTracker {
    sources: Vec<Arc<dyn TipSource>>,
    cache: Arc<TtlCache<u64>>,
    source_timeout: Duration,
}

impl ConfirmationTracker {
    pub fn new(
        sources: Vec<Arc<dyn TipSource>>,
        cache: Arc<TtlCache<u64>>,
        source_timeout: Duration,
    ) -> Self {
        Self {
            sources,
            cache,
            source_timeout,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &TtlCache<u64> {
        &self.cache
    }

    /// Current tip: cached if fresh, otherwise the first source to answer
    pub async fn tip_height(&self) -> Option<u64> {
        if let Some(tip) = self.cache.get() {
            tracing::trace!(tip_height = tip, "Tip height cache hit");
            return Some(tip);
        }

        let calls = self
            .sources
            .iter()
            .map(|s| (s.name().to_string(), s.tip_height()))
            .collect();

        match first_success(calls, self.source_timeout).await {
            Ok((source, tip)) => {
                tracing::debug!(source = %source, tip_height = tip, "Fetched Bitcoin tip height");
                self.cache.refresh(tip);
                Some(tip)
            }
            Err(errors) => {
                tracing::warn!(
                    sources = errors.len(),
                    errors = ?errors.iter().map(|(s, e)| format!("{s}: {e}")).collect::<Vec<_>>(),
                    "All tip height sources failed"
                );
                None
            }
        }
    }

    /// Confirmations for a block at `block_height`
    pub async fn confirmations(&self, block_height: u64) -> ConfirmationInfo {
        match self.tip_height().await {
            Some(tip) => ConfirmationInfo {
                confirmations: Some(confirmations_at(tip, block_height)),
                tip_height: Some(tip),
                available: true,
            },
            None => ConfirmationInfo::unavailable(),
        }
    }
}
