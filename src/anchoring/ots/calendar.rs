//! Pool and calendar server communication

use std::time::Duration;

use crate::anchoring::error::AnchorError;

use super::body::decode_body;

/// HTTP client for OTS pool/calendar servers
#[derive(Debug, Clone)]
pub struct CalendarClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl CalendarClient {
    /// Create a client whose every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, AnchorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnchorError::Network(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Submit a 32-byte digest to a pool server
    ///
    /// Sends POST `{server_url}/digest` with the raw digest as body and returns
    /// the decoded response bytes.
    pub async fn submit(&self, server_url: &str, digest: &[u8; 32]) -> Result<Vec<u8>, AnchorError> {
        tracing::debug!(server = %server_url, "Submitting digest to pool");

        let url = format!("{}/digest", server_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-opentimestamps")
            .header("Accept", "application/vnd.opentimestamps.v1")
            .body(digest.to_vec())
            .send()
            .await
            .map_err(|e| AnchorError::from_reqwest(&e, self.timeout_ms()))?;

        if !response.status().is_success() {
            return Err(AnchorError::ServiceError(format!(
                "pool returned status {}",
                response.status()
            )));
        }

        let bytes = read_body(response, self.timeout_ms()).await?;
        if bytes.is_empty() {
            return Err(AnchorError::InvalidResponse("empty body from pool".into()));
        }

        tracing::info!(server = %server_url, len = bytes.len(), "Digest submitted");
        Ok(bytes)
    }

    /// Ask a calendar for an upgraded timestamp
    ///
    /// Sends GET `{server_url}/timestamp/{hex_commitment}`. `Ok(None)` means the
    /// calendar answered 404: not anchored yet.
    pub async fn upgrade(
        &self,
        server_url: &str,
        commitment: &[u8; 32],
    ) -> Result<Option<Vec<u8>>, AnchorError> {
        let url = format!(
            "{}/timestamp/{}",
            server_url.trim_end_matches('/'),
            hex::encode(commitment)
        );

        tracing::debug!(url = %url, "Fetching timestamp from calendar");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.opentimestamps.v1")
            .send()
            .await
            .map_err(|e| AnchorError::from_reqwest(&e, self.timeout_ms()))?;

        // 404 = timestamp not yet available
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(server = %server_url, "Timestamp not yet available at calendar");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(AnchorError::ServiceError(format!(
                "calendar returned status {}",
                response.status()
            )));
        }

        let bytes = read_body(response, self.timeout_ms()).await?;

        tracing::info!(server = %server_url, len = bytes.len(), "Calendar returned timestamp");
        Ok(Some(bytes))
    }
}

async fn read_body(response: reqwest::Response, timeout_ms: u64) -> Result<Vec<u8>, AnchorError> {
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let raw = response
        .bytes()
        .await
        .map_err(|e| AnchorError::from_reqwest(&e, timeout_ms))?;

    Ok(decode_body(content_type.as_deref(), &raw))
}
