//! Tree construction with the duplicate-last pairing rule

use std::collections::BTreeSet;

use super::hash::{node_hash, Hash};
use super::proof::{build_proof, ProofStep};
use super::MerkleError;

/// A fully materialised Merkle tree
///
/// `levels[0]` holds the distinct leaf hashes in ascending order; each following
/// level is half the size of the one below (rounded up). The last level holds
/// only the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    root: Hash,
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Root hash
    #[must_use]
    pub fn root(&self) -> &Hash {
        &self.root
    }

    /// All levels, leaves first
    #[must_use]
    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }

    /// Sorted, de-duplicated leaf hashes
    #[must_use]
    pub fn leaves(&self) -> &[Hash] {
        &self.levels[0]
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Canonical index of a leaf hash in level 0
    #[must_use]
    pub fn position_of(&self, leaf: &Hash) -> Option<usize> {
        self.levels[0].binary_search(leaf).ok()
    }

    /// Inclusion proof for the leaf at `leaf_index`
    pub fn proof(&self, leaf_index: usize) -> Result<Vec<ProofStep>, MerkleError> {
        build_proof(&self.levels, leaf_index)
    }

    #[must_use]
    pub fn into_parts(self) -> (Hash, Vec<Vec<Hash>>) {
        (self.root, self.levels)
    }
}

/// Build a tree over a set of leaf hashes
///
/// Input order and duplicates do not matter: leaves are de-duplicated and
/// sorted ascending. Byte order equals lowercase-hex order, so this is the
/// same ordering as sorting the hex strings.
///
/// # Errors
///
/// Returns `MerkleError::EmptyInput` if no leaves are supplied.
pub fn build_tree<I>(leaf_hashes: I) -> Result<MerkleTree, MerkleError>
where
    I: IntoIterator<Item = Hash>,
{
    let mut level: Vec<Hash> = leaf_hashes
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if level.is_empty() {
        return Err(MerkleError::EmptyInput);
    }

    let mut levels = vec![level.clone()];

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                // Odd count: the last node pairs with itself
                let right = pair.get(1).unwrap_or(left);
                node_hash(left, right)
            })
            .collect();
        levels.push(level.clone());
    }

    Ok(MerkleTree {
        root: level[0],
        levels,
    })
}
