//! Server configuration

use std::str::FromStr;
use std::time::Duration;

use crate::anchoring::bitcoin::BitcoinConfig;
use crate::anchoring::ots::{parse_env, OtsConfig};

/// Deployment environment; production hides upstream error detail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    Production,
    #[default]
    Development,
}

impl Environment {
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(format!(
                "unknown environment '{other}', expected production or development"
            )),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// Pool and calendar upstreams
    pub ots: OtsConfig,
    /// Tip sources and cache
    pub bitcoin: BitcoinConfig,
    /// Confirmations required before a proof is reported as confirmed
    pub min_confirmations: u64,
    /// Lifetime of the cached health response
    pub health_cache_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            environment: Environment::default(),
            ots: OtsConfig::default(),
            bitcoin: BitcoinConfig::default(),
            min_confirmations: 3,
            health_cache_ttl: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Load from environment variables
    ///
    /// - `MBT_ENVIRONMENT`: production | development (default: development)
    /// - `MBT_MIN_CONFIRMATIONS` (default: 3)
    /// - `MBT_HEALTH_CACHE_TTL_SECS` (default: 10)
    ///
    /// plus the variables read by [`OtsConfig::from_env`] and
    /// [`BitcoinConfig::from_env`]. Host and port come from the CLI.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let environment = std::env::var("MBT_ENVIRONMENT")
            .ok()
            .and_then(|s| match s.parse() {
                Ok(env) => Some(env),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring MBT_ENVIRONMENT");
                    None
                }
            })
            .unwrap_or(defaults.environment);

        Self {
            environment,
            ots: OtsConfig::from_env(),
            bitcoin: BitcoinConfig::from_env(),
            min_confirmations: parse_env("MBT_MIN_CONFIRMATIONS")
                .unwrap_or(defaults.min_confirmations),
            health_cache_ttl: parse_env("MBT_HEALTH_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.health_cache_ttl),
            ..defaults
        }
    }

    /// Reject configurations that can never succeed
    pub fn validate(&self) -> Result<(), String> {
        if self.ots.pool_urls.is_empty() {
            return Err("no pool servers configured".into());
        }
        if self.ots.quorum == 0 {
            return Err("quorum must be at least 1".into());
        }
        if self.ots.quorum > self.ots.pool_urls.len() {
            return Err(format!(
                "quorum {} exceeds the {} configured pool servers",
                self.ots.quorum,
                self.ots.pool_urls.len()
            ));
        }
        if self.ots.calendar_urls.is_empty() {
            return Err("no calendar servers configured".into());
        }
        Ok(())
    }
}
