//! OpenTimestamps upstream configuration

use std::time::Duration;

pub const DEFAULT_POOL_URLS: &[&str] = &[
    "https://a.pool.opentimestamps.org",
    "https://b.pool.opentimestamps.org",
    "https://a.pool.eternitywall.com",
    "https://ots.btc.catallaxy.com",
];

pub const DEFAULT_CALENDAR_URLS: &[&str] = &[
    "https://alice.btc.calendar.opentimestamps.org",
    "https://bob.btc.calendar.opentimestamps.org",
    "https://finney.calendar.eternitywall.com",
    "https://btc.calendar.catallaxy.com",
];

/// OpenTimestamps configuration
#[derive(Debug, Clone)]
pub struct OtsConfig {
    /// Pool servers that accept new digests (`POST /digest`)
    pub pool_urls: Vec<String>,

    /// Calendar servers queried for upgrades (`GET /timestamp/{hex}`)
    pub calendar_urls: Vec<String>,

    /// Successful pool submissions required for a stamp
    pub quorum: usize,

    /// Timeout for each individual upstream call
    pub source_timeout: Duration,

    /// Overall bound on a stamp or upgrade operation
    pub request_timeout: Duration,
}

impl Default for OtsConfig {
    fn default() -> Self {
        Self {
            pool_urls: to_owned(DEFAULT_POOL_URLS),
            calendar_urls: to_owned(DEFAULT_CALENDAR_URLS),
            quorum: 2,
            source_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl OtsConfig {
    /// Create config from environment variables
    ///
    /// Environment variables:
    /// - `MBT_OTS_POOL_URLS`: Comma-separated pool URLs
    /// - `MBT_OTS_CALENDAR_URLS`: Comma-separated calendar URLs
    /// - `MBT_OTS_QUORUM`: Required pool successes (default: 2)
    /// - `MBT_OTS_SOURCE_TIMEOUT_MS`: Per-server timeout (default: 10000)
    /// - `MBT_OTS_REQUEST_TIMEOUT_SECS`: Per-operation timeout (default: 30)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            pool_urls: url_list("MBT_OTS_POOL_URLS").unwrap_or(defaults.pool_urls),
            calendar_urls: url_list("MBT_OTS_CALENDAR_URLS").unwrap_or(defaults.calendar_urls),
            quorum: parse_env("MBT_OTS_QUORUM").unwrap_or(defaults.quorum),
            source_timeout: parse_env("MBT_OTS_SOURCE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.source_timeout),
            request_timeout: parse_env("MBT_OTS_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}

fn to_owned(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|s| (*s).to_string()).collect()
}

/// Comma-separated list; an empty variable is an explicit empty list
pub(crate) fn url_list(var: &str) -> Option<Vec<String>> {
    std::env::var(var).ok().map(|s| {
        s.split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

pub(crate) fn parse_env<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}
