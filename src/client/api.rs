//! Proxy API seam for the polling client

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::dto::{ErrorResponse, StampRequest, StampResponse, UpgradeRequest, UpgradeResponse};

use super::error::ClientError;

/// Operations the polling machine needs from a timestamp proxy
#[async_trait]
pub trait ProxyApi: Send + Sync {
    /// POST /api/stamp
    async fn stamp(&self, merkle_root_hex: &str) -> Result<StampResponse, ClientError>;

    /// POST /api/upgrade
    async fn upgrade(&self, ots_file: &[u8]) -> Result<UpgradeResponse, ClientError>;
}

/// `ProxyApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProxyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ClientError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // Prefer the structured error body; fall back to raw text
            let (code, message) = match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(err) => (err.code, err.error),
                Err(_) => ("HTTP_ERROR".to_string(), text),
            };
            tracing::debug!(url = %url, status = status.as_u16(), code = %code, "Proxy returned error");
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                code,
                message,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ProxyApi for HttpProxyClient {
    async fn stamp(&self, merkle_root_hex: &str) -> Result<StampResponse, ClientError> {
        let request = StampRequest {
            merkle_root_hex: merkle_root_hex.to_string(),
        };
        self.post("/api/stamp", &request).await
    }

    async fn upgrade(&self, ots_file: &[u8]) -> Result<UpgradeResponse, ClientError> {
        let request = UpgradeRequest {
            ots_file: ots_file.to_vec(),
        };
        self.post("/api/upgrade", &request).await
    }
}
