//! Test fixtures for OTS proofs and calendar responses

use super::attestation::Attestation;
use super::codec::OtsProof;

/// SHA-256 of "test fixture data"
pub const TEST_DIGEST: [u8; 32] = [
    0xab, 0xd2, 0x05, 0x55, 0x5c, 0x18, 0x6f, 0x83, 0x3a, 0x60, 0xc9, 0x82, 0xff, 0xc1, 0x7c, 0x45,
    0xcc, 0xa2, 0xee, 0x0a, 0x30, 0xf5, 0xb0, 0xa4, 0xe7, 0x33, 0x97, 0x83, 0xd0, 0x24, 0x21, 0x4e,
];

/// Generate a test hash from arbitrary data
pub fn test_hash(data: &[u8]) -> [u8; 32] {
    use sha2::Digest;
    sha2::Sha256::digest(data).into()
}

/// Complete proof with a single pending calendar attestation
pub fn pending_proof(calendar_url: &str, commitment: &[u8; 32]) -> Vec<u8> {
    OtsProof::new(vec![Attestation::Calendar {
        url: calendar_url.to_string(),
        commitment: *commitment,
    }])
    .to_bytes()
    .unwrap()
}

/// Bare attestation stream a calendar returns once the commitment is anchored
pub fn bitcoin_stream(height: u64) -> Vec<u8> {
    let mut out = Vec::new();
    Attestation::BitcoinBlock {
        height,
        merkle_root: test_hash(&height.to_le_bytes()),
    }
    .write(&mut out)
    .unwrap();
    out
}

/// Complete proof with a pending attestation followed by a Bitcoin one
pub fn anchored_proof(calendar_url: &str, commitment: &[u8; 32], height: u64) -> Vec<u8> {
    let mut bytes = pending_proof(calendar_url, commitment);
    bytes.extend_from_slice(&bitcoin_stream(height));
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchoring::ots::has_bitcoin_attestation;

    #[test]
    fn test_test_digest_matches_data() {
        assert_eq!(test_hash(b"test fixture data"), TEST_DIGEST);
    }

    #[test]
    fn test_pending_proof_has_no_bitcoin() {
        let bytes = pending_proof("https://a.cal", &TEST_DIGEST);
        assert!(!has_bitcoin_attestation(&bytes).has_attestation);
    }

    #[test]
    fn test_anchored_proof_has_bitcoin() {
        let bytes = anchored_proof("https://a.cal", &TEST_DIGEST, 800_000);
        assert_eq!(has_bitcoin_attestation(&bytes).block_height, Some(800_000));
    }
}
