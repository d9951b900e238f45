//! SHA-256 hash primitives with domain separation

use sha2::{Digest, Sha256};

/// 32-byte SHA-256 digest
pub type Hash = [u8; 32];

/// Prefix for leaf hashes
pub const LEAF_TAG: &[u8] = b"leaf\0";

/// Prefix for internal node hashes
pub const NODE_TAG: &[u8] = b"node\0";

/// SHA-256 of raw file bytes
#[must_use]
pub fn content_hash(bytes: &[u8]) -> Hash {
    Sha256::digest(bytes).into()
}

/// Leaf hash = SHA-256("leaf\0" || content_hash)
#[must_use]
pub fn leaf_hash(content_hash: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(LEAF_TAG);
    hasher.update(content_hash);
    hasher.finalize().into()
}

/// Node hash = SHA-256("node\0" || left || right)
#[must_use]
pub fn node_hash(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(NODE_TAG);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
