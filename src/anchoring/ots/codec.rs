//! OTS proof header, validation and the `OtsProof` value type

use serde::Serialize;

use super::attestation::{parse_stream, scan_for_bitcoin, Attestation};
use super::error::OtsError;

/// `0x00` followed by ASCII "OpenTimestamps"
pub const MAGIC: [u8; 15] = *b"\x00OpenTimestamps";

/// Current proof format version
pub const VERSION: u8 = 0x01;

/// Magic plus version byte
pub const HEADER_LEN: usize = MAGIC.len() + 1;

/// Check magic and version
///
/// # Errors
///
/// `TooShort`, `BadMagicPrefix`, `BadMagic` or `UnsupportedVersion`.
pub fn check_header(bytes: &[u8]) -> Result<(), OtsError> {
    if bytes.len() < HEADER_LEN {
        return Err(OtsError::TooShort {
            len: bytes.len(),
            needed: HEADER_LEN,
        });
    }
    if bytes[0] != MAGIC[0] {
        return Err(OtsError::BadMagicPrefix(bytes[0]));
    }
    if bytes[1..MAGIC.len()] != MAGIC[1..] {
        return Err(OtsError::BadMagic);
    }
    if bytes[MAGIC.len()] != VERSION {
        return Err(OtsError::UnsupportedVersion(bytes[MAGIC.len()]));
    }
    Ok(())
}

/// Validate a proof header
///
/// Strict mode returns the header error. Lenient mode logs it and returns `Ok`;
/// it is used when a proof is passed through unchanged.
pub fn validate(bytes: &[u8], strict: bool) -> Result<(), OtsError> {
    match check_header(bytes) {
        Ok(()) => Ok(()),
        Err(e) if strict => {
            tracing::warn!(error = %e, len = bytes.len(), "OTS proof failed strict validation");
            Err(e)
        }
        Err(e) => {
            tracing::warn!(error = %e, len = bytes.len(), "OTS proof header invalid, passing through");
            Ok(())
        }
    }
}

/// Outcome of scanning for a Bitcoin attestation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BitcoinAttestationInfo {
    pub has_attestation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
}

/// Find the first Bitcoin block attestation in a proof
///
/// Never fails: a missing header or a corrupt stream simply yields
/// `has_attestation: false`.
#[must_use]
pub fn has_bitcoin_attestation(bytes: &[u8]) -> BitcoinAttestationInfo {
    if check_header(bytes).is_err() {
        return BitcoinAttestationInfo::default();
    }
    match scan_for_bitcoin(&bytes[HEADER_LEN..]) {
        Some(height) => BitcoinAttestationInfo {
            has_attestation: true,
            block_height: Some(height),
        },
        None => BitcoinAttestationInfo::default(),
    }
}

/// A parsed OTS proof
///
/// Immutable in spirit: `merge` returns a new proof rather than editing this
/// one. Bytes following an unknown tag are carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtsProof {
    attestations: Vec<Attestation>,
    trailing: Vec<u8>,
}

impl OtsProof {
    #[must_use]
    pub fn new(attestations: Vec<Attestation>) -> Self {
        Self {
            attestations,
            trailing: Vec::new(),
        }
    }

    /// Parse a complete proof file (strict header)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OtsError> {
        check_header(bytes)?;
        let stream = parse_stream(&bytes[HEADER_LEN..])?;
        Ok(Self {
            attestations: stream.attestations,
            trailing: stream.trailing,
        })
    }

    /// Parse a bare attestation stream with no header
    pub fn from_stream(stream: &[u8]) -> Result<Self, OtsError> {
        let parsed = parse_stream(stream)?;
        Ok(Self {
            attestations: parsed.attestations,
            trailing: parsed.trailing,
        })
    }

    /// Canonical serialization: header, attestations in order, trailing bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, OtsError> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.attestations.len() * 72);
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        for att in &self.attestations {
            att.write(&mut out)?;
        }
        out.extend_from_slice(&self.trailing);
        Ok(out)
    }

    #[must_use]
    pub fn attestations(&self) -> &[Attestation] {
        &self.attestations
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attestations.is_empty()
    }

    /// Distinct calendar commitments still awaiting an anchor, in order
    #[must_use]
    pub fn pending_commitments(&self) -> Vec<[u8; 32]> {
        let mut out: Vec<[u8; 32]> = Vec::new();
        for att in &self.attestations {
            if let Attestation::Calendar { commitment, .. } = att {
                if !out.contains(commitment) {
                    out.push(*commitment);
                }
            }
        }
        out
    }

    /// Height of the first Bitcoin attestation
    #[must_use]
    pub fn bitcoin_height(&self) -> Option<u64> {
        self.attestations.iter().find_map(|att| match att {
            Attestation::BitcoinBlock { height, .. } => Some(*height),
            Attestation::Calendar { .. } => None,
        })
    }

    /// A new proof holding this proof's attestations plus any from `other`
    /// not already present
    #[must_use]
    pub fn merge(&self, other: &OtsProof) -> OtsProof {
        let mut attestations = self.attestations.clone();
        for att in &other.attestations {
            if !attestations.contains(att) {
                attestations.push(att.clone());
            }
        }
        OtsProof {
            attestations,
            trailing: self.trailing.clone(),
        }
    }
}
