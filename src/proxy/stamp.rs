//! Quorum submission to pool servers

use serde::{Deserialize, Serialize};

use crate::anchoring::fanout::settle_all;
use crate::anchoring::ots::{validate, Attestation, OtsProof, MAGIC};
use crate::anchoring::AnchorError;
use crate::error::{ServerError, ServerResult};

use super::TimestampProxy;

/// A freshly stamped proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampResult {
    pub ots_proof: Vec<u8>,
    /// First pool to answer successfully
    pub server: String,
    /// Every pool that answered successfully, in arrival order
    pub servers: Vec<String>,
}

/// Exactly 64 hex characters to 32 bytes
pub fn parse_digest(digest_hex: &str) -> ServerResult<[u8; 32]> {
    if digest_hex.len() != 64 {
        return Err(ServerError::InvalidHash(format!(
            "expected 64 hex characters, got {}",
            digest_hex.len()
        )));
    }
    let mut digest = [0u8; 32];
    hex::decode_to_slice(digest_hex, &mut digest)?;
    Ok(digest)
}

/// Attestations a pool response stands for
///
/// A complete proof contributes its own attestations; any other non-empty body
/// means the pool holds the digest, recorded as a calendar attestation.
fn pool_attestations(
    pool_url: &str,
    digest: &[u8; 32],
    body: &[u8],
) -> Result<Vec<Attestation>, AnchorError> {
    if body.starts_with(&MAGIC) {
        let proof = OtsProof::from_bytes(body)?;
        if !proof.is_empty() {
            return Ok(proof.attestations().to_vec());
        }
    }
    Ok(vec![Attestation::Calendar {
        url: pool_url.to_string(),
        commitment: *digest,
    }])
}

/// Serialize a proof built here; failure is ours, not the caller's
fn assemble(proof: &OtsProof) -> ServerResult<Vec<u8>> {
    let bytes = proof
        .to_bytes()
        .map_err(|e| ServerError::Internal(format!("cannot serialize stamped proof: {e}")))?;
    validate(&bytes, true)
        .map_err(|e| ServerError::Internal(format!("stamped proof failed validation: {e}")))?;
    Ok(bytes)
}

impl TimestampProxy {
    pub(super) async fn stamp_digest(&self, digest: &[u8; 32]) -> ServerResult<StampResult> {
        let client = &self.client;
        let calls = self
            .pool_urls
            .iter()
            .map(|url| {
                let fut = async move {
                    let body = client.submit(url, digest).await?;
                    pool_attestations(url, digest, &body)
                };
                (url.clone(), fut)
            })
            .collect();

        let settled = settle_all(calls, self.source_timeout).await;
        let attempted = settled.len();

        let mut successes: Vec<(String, Vec<Attestation>)> = Vec::new();
        let mut timeouts = 0usize;
        for s in settled {
            match s.result {
                Ok(atts) => successes.push((s.source, atts)),
                Err(AnchorError::Timeout(_)) => timeouts += 1,
                Err(_) => {}
            }
        }

        if successes.len() < self.quorum {
            tracing::warn!(
                digest = %hex::encode(digest),
                succeeded = successes.len(),
                timed_out = timeouts,
                attempted,
                quorum = self.quorum,
                "Stamp quorum not reached"
            );
            if timeouts > 0 && successes.len() + timeouts == attempted {
                let ms = u64::try_from(self.source_timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(ServerError::UpstreamTimeout(ms));
            }
            return Err(ServerError::UpstreamUnavailable(format!(
                "{} of {} pool servers succeeded, {} required",
                successes.len(),
                attempted,
                self.quorum
            )));
        }

        let proof = successes
            .iter()
            .fold(OtsProof::default(), |acc, (_, atts)| {
                acc.merge(&OtsProof::new(atts.clone()))
            });
        let ots_proof = assemble(&proof)?;

        let servers: Vec<String> = successes.into_iter().map(|(url, _)| url).collect();
        let server = servers
            .first()
            .cloned()
            .ok_or_else(|| ServerError::UpstreamUnavailable("no pool server succeeded".into()))?;

        tracing::info!(
            digest = %hex::encode(digest),
            server = %server,
            servers = servers.len(),
            attestations = proof.attestations().len(),
            "Digest stamped"
        );

        Ok(StampResult {
            ots_proof,
            server,
            servers,
        })
    }
}
