//! Calendar upgrade of pending proofs

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::anchoring::fanout::first_preferred;
use crate::anchoring::ots::{
    has_bitcoin_attestation, validate, OtsError, OtsProof, MAGIC,
};
use crate::anchoring::AnchorError;
use crate::error::{ServerError, ServerResult};

use super::TimestampProxy;

/// Largest proof accepted for upgrade
pub const MAX_PROOF_BYTES: usize = 1024 * 1024;

/// Outcome of an upgrade attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeResult {
    /// The input proof, or a richer replacement
    pub ots_proof: Vec<u8>,
    /// A Bitcoin attestation is present
    pub upgraded: bool,
    pub block_height: Option<u64>,
    /// New attestations were merged in during this call
    pub changed: bool,
    /// Calendar whose answer advanced the proof, a Bitcoin-anchored one first
    pub calendar_server: Option<String>,
}

pub(super) fn check_size(proof: &[u8]) -> ServerResult<()> {
    if proof.is_empty() {
        return Err(ServerError::InvalidArgument("OTS proof is empty".into()));
    }
    if proof.len() > MAX_PROOF_BYTES {
        return Err(ServerError::InvalidArgument(format!(
            "OTS proof is {} bytes, limit is {MAX_PROOF_BYTES}",
            proof.len()
        )));
    }
    Ok(())
}

/// Parse a calendar's 200 body: a full proof or a bare attestation stream
fn parse_calendar_body(body: &[u8]) -> Result<OtsProof, AnchorError> {
    let proof = if body.starts_with(&MAGIC) {
        OtsProof::from_bytes(body)?
    } else {
        OtsProof::from_stream(body)?
    };
    if proof.is_empty() {
        return Err(AnchorError::InvalidResponse(
            "calendar body carries no attestations".into(),
        ));
    }
    Ok(proof)
}

impl TimestampProxy {
    pub(super) async fn upgrade_proof(&self, input: &[u8]) -> ServerResult<UpgradeResult> {
        let proof = match OtsProof::from_bytes(input) {
            Ok(p) => p,
            Err(e @ (OtsError::TooShort { .. }
            | OtsError::BadMagicPrefix(_)
            | OtsError::BadMagic
            | OtsError::UnsupportedVersion(_))) => {
                tracing::warn!(error = %e, "Unrecognised proof header, returning proof unchanged");
                return unchanged(input);
            }
            Err(e) => return Err(e.into()),
        };

        if proof.bitcoin_height().is_some() {
            tracing::debug!("Proof already anchored, skipping calendar queries");
            return unchanged(input);
        }

        let pending = proof.pending_commitments();
        if pending.is_empty() {
            return unchanged(input);
        }

        let races = pending.iter().map(|commitment| self.race_calendars(commitment));
        let outcomes = join_all(races).await;

        let mut updated = proof.clone();
        let mut any_answer = false;
        let mut transport_errors = Vec::new();
        let mut calendar_server: Option<(String, bool)> = None;

        for (commitment, outcome) in pending.iter().zip(outcomes) {
            match outcome {
                Ok((server, found)) => {
                    tracing::info!(
                        commitment = %hex::encode(commitment),
                        server = %server,
                        attestations = found.attestations().len(),
                        "Calendar returned upgrade"
                    );
                    any_answer = true;
                    let anchored = found.bitcoin_height().is_some();
                    if calendar_server.as_ref().map_or(true, |(_, a)| anchored && !a) {
                        calendar_server = Some((server, anchored));
                    }
                    updated = updated.merge(&found);
                }
                Err(errors) => {
                    for (server, e) in errors {
                        if e.is_transport() {
                            transport_errors.push(format!("{server}: {e}"));
                        } else {
                            // A 404 or malformed body is still an answer
                            any_answer = true;
                        }
                    }
                }
            }
        }

        if !any_answer && !transport_errors.is_empty() {
            tracing::warn!(errors = ?transport_errors, "All calendar queries failed");
            return Err(ServerError::UpstreamUnavailable(format!(
                "no calendar server reachable ({} failures)",
                transport_errors.len()
            )));
        }

        if updated == proof {
            return unchanged(input);
        }

        let bytes = updated.to_bytes()?;
        validate(&bytes, true)?;
        let info = has_bitcoin_attestation(&bytes);

        tracing::info!(
            upgraded = info.has_attestation,
            block_height = ?info.block_height,
            "Proof upgraded"
        );

        Ok(UpgradeResult {
            ots_proof: bytes,
            upgraded: info.has_attestation,
            block_height: info.block_height,
            changed: true,
            calendar_server: calendar_server.map(|(server, _)| server),
        })
    }

    async fn race_calendars(
        &self,
        commitment: &[u8; 32],
    ) -> Result<(String, OtsProof), Vec<(String, AnchorError)>> {
        let client = &self.client;
        let calls = self
            .calendar_urls
            .iter()
            .map(|url| {
                let fut = async move {
                    match client.upgrade(url, commitment).await? {
                        Some(body) => parse_calendar_body(&body),
                        None => Err(AnchorError::Pending),
                    }
                };
                (url.clone(), fut)
            })
            .collect();

        // A calendar that already holds the Bitcoin attestation beats a faster
        // one that only repeats the pending record
        first_preferred(calls, self.source_timeout, |proof: &OtsProof| {
            proof.bitcoin_height().is_some()
        })
        .await
    }
}

/// Pass the input through with lenient validation
fn unchanged(input: &[u8]) -> ServerResult<UpgradeResult> {
    validate(input, false)?;
    let info = has_bitcoin_attestation(input);
    Ok(UpgradeResult {
        ots_proof: input.to_vec(),
        upgraded: info.has_attestation,
        block_height: info.block_height,
        changed: false,
        calendar_server: None,
    })
}
