//! Canonical Merkle tree over file contents
//!
//! Leaves commit to file bytes only. Names and paths never enter a hash, so a
//! root can be re-derived from renamed or moved files. Leaf and internal-node
//! hashes use distinct tags and are never confusable.

mod hash;
mod proof;
mod tree;

pub use hash::{content_hash, leaf_hash, node_hash, Hash, LEAF_TAG, NODE_TAG};
pub use proof::{build_proof, verify_proof, Position, ProofStep};
pub use tree::{build_tree, MerkleTree};

use thiserror::Error;

/// Merkle engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    /// No leaves were supplied
    #[error("cannot build a tree from an empty leaf set")]
    EmptyInput,

    /// Proof requested for a leaf that does not exist
    #[error("leaf index {index} out of bounds for {leaf_count} leaves")]
    LeafIndexOutOfBounds { index: usize, leaf_count: usize },
}
