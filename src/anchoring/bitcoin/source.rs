//! Bitcoin tip-height sources

use std::time::Duration;

use async_trait::async_trait;

use crate::anchoring::error::AnchorError;

/// Something that can report the current Bitcoin block height
#[async_trait]
pub trait TipSource: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    async fn tip_height(&self) -> Result<u64, AnchorError>;
}

/// Public API flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    /// blockstream.info, mempool.space: `GET {base}/blocks/tip/height`
    Esplora,
    /// blockchain.info: `GET {base}/q/getblockcount`
    BlockchainInfo,
}

impl ApiKind {
    fn path(self) -> &'static str {
        match self {
            Self::Esplora => "/blocks/tip/height",
            Self::BlockchainInfo => "/q/getblockcount",
        }
    }
}

/// Default public providers
pub const DEFAULT_PROVIDERS: &[(&str, &str, ApiKind)] = &[
    ("blockstream.info", "https://blockstream.info/api", ApiKind::Esplora),
    ("mempool.space", "https://mempool.space/api", ApiKind::Esplora),
    ("blockchain.info", "https://blockchain.info", ApiKind::BlockchainInfo),
];

/// HTTP tip source answering with a plain-text integer
#[derive(Debug, Clone)]
pub struct HttpTipSource {
    name: String,
    base_url: String,
    kind: ApiKind,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTipSource {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        kind: ApiKind,
        timeout: Duration,
    ) -> Result<Self, AnchorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnchorError::Network(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            kind,
            client,
            timeout,
        })
    }

    /// The three public providers, each bounded by `timeout`
    pub fn defaults(timeout: Duration) -> Result<Vec<Self>, AnchorError> {
        DEFAULT_PROVIDERS
            .iter()
            .map(|(name, base, kind)| Self::new(*name, *base, *kind, timeout))
            .collect()
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.kind.path())
    }
}

#[async_trait]
impl TipSource for HttpTipSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn tip_height(&self) -> Result<u64, AnchorError> {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let response = self
            .client
            .get(self.url())
            .send()
            .await
            .map_err(|e| AnchorError::from_reqwest(&e, timeout_ms))?;

        if !response.status().is_success() {
            return Err(AnchorError::ServiceError(format!(
                "{} returned status {}",
                self.name,
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AnchorError::from_reqwest(&e, timeout_ms))?;

        parse_height(&text)
    }
}

fn parse_height(text: &str) -> Result<u64, AnchorError> {
    text.trim()
        .parse::<u64>()
        .map_err(|e| AnchorError::InvalidResponse(format!("tip height {:?}: {e}", text.trim())))
}
