//! Inclusion proofs

use serde::{Deserialize, Serialize};

use super::hash::{node_hash, Hash};
use super::MerkleError;

/// Side of the running hash a sibling sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

/// One step of an inclusion proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub position: Position,
    #[serde(with = "hex::serde")]
    pub hash: Hash,
}

/// Build the inclusion proof for `leaf_index`
///
/// Walks every level below the root. The sibling of `idx` is `idx ^ 1`; when
/// that is past the end of the level the node pairs with itself, mirroring the
/// duplicate-last rule used during construction.
///
/// # Errors
///
/// Returns `MerkleError::LeafIndexOutOfBounds` if the index does not address a
/// leaf, or if `levels` is shorter than the index walk requires.
pub fn build_proof(levels: &[Vec<Hash>], leaf_index: usize) -> Result<Vec<ProofStep>, MerkleError> {
    let leaf_count = levels.first().map_or(0, Vec::len);
    if leaf_index >= leaf_count {
        return Err(MerkleError::LeafIndexOutOfBounds {
            index: leaf_index,
            leaf_count,
        });
    }

    let mut idx = leaf_index;
    let mut proof = Vec::with_capacity(levels.len() - 1);

    for level in &levels[..levels.len() - 1] {
        let own = level.get(idx).ok_or(MerkleError::LeafIndexOutOfBounds {
            index: idx,
            leaf_count: level.len(),
        })?;

        let sibling_idx = idx ^ 1;
        let sibling = level.get(sibling_idx).unwrap_or(own);
        let position = if sibling_idx < idx {
            Position::Left
        } else {
            Position::Right
        };

        proof.push(ProofStep {
            position,
            hash: *sibling,
        });
        idx /= 2;
    }

    Ok(proof)
}

/// Fold a proof from `leaf_hash` and compare with `expected_root`
#[must_use]
pub fn verify_proof(leaf_hash: &Hash, proof: &[ProofStep], expected_root: &Hash) -> bool {
    let computed = proof.iter().fold(*leaf_hash, |running, step| match step.position {
        Position::Left => node_hash(&step.hash, &running),
        Position::Right => node_hash(&running, &step.hash),
    });
    &computed == expected_root
}
