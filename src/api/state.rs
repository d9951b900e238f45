//! Application state shared across HTTP handlers

use std::sync::Arc;

use crate::anchoring::bitcoin::{ConfirmationTracker, HttpTipSource, TipSource};
use crate::api::dto::HealthResponse;
use crate::cache::TtlCache;
use crate::config::{Environment, ServerConfig};
use crate::error::{ServerError, ServerResult};
use crate::proxy::TimestampProxy;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Pool/calendar proxy
    pub proxy: Arc<TimestampProxy>,

    /// Tip height and confirmation counts
    pub tracker: Arc<ConfirmationTracker>,

    /// Last health response
    pub health_cache: Arc<TtlCache<HealthResponse>>,

    /// Controls error sanitization
    pub environment: Environment,

    /// Confirmations required to report `confirmed`
    pub min_confirmations: u64,
}

impl AppState {
    /// Validate `config` and build state with the public tip sources
    ///
    /// # Errors
    ///
    /// `Config` when the configuration is unusable or an HTTP client cannot
    /// be built.
    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        config.validate().map_err(ServerError::Config)?;

        let sources = HttpTipSource::defaults(config.bitcoin.source_timeout)
            .map_err(|e| ServerError::Config(e.to_string()))?
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn TipSource>)
            .collect();

        let tracker = ConfirmationTracker::new(
            sources,
            Arc::new(TtlCache::new(config.bitcoin.tip_cache_ttl)),
            config.bitcoin.source_timeout,
        );

        Ok(Self {
            proxy: Arc::new(
                TimestampProxy::new(&config.ots).map_err(|e| ServerError::Config(e.to_string()))?,
            ),
            tracker: Arc::new(tracker),
            health_cache: Arc::new(TtlCache::new(config.health_cache_ttl)),
            environment: config.environment,
            min_confirmations: config.min_confirmations,
        })
    }
}
