//! Generate, encode, decode and verify commitment artifacts

use chrono::Utc;
use serde::Serialize;

use super::artifact::{CommitmentArtifact, FileInput, HexHash, LeafRecord, Summary, TreeSection, SCHEMA};
use super::CommitmentError;
use crate::merkle::{self, build_tree, Hash, MerkleTree, ProofStep};

/// Result of checking a single file against an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInclusion {
    pub leaf_hash: HexHash,
    pub leaf_index: usize,
    /// Recorded paths whose content matches (may be several for duplicates)
    pub recorded_paths: Vec<String>,
    pub proof: Vec<ProofStep>,
}

/// Build an artifact from enumerated files
///
/// Every file appears in `leaves`, including byte-identical duplicates; the
/// tree itself is built over the distinct leaf hashes only.
///
/// # Errors
///
/// Returns `CommitmentError::Merkle(EmptyInput)` when `files` is empty.
pub fn generate(
    files: &[FileInput],
    folder_policy: serde_json::Value,
) -> Result<CommitmentArtifact, CommitmentError> {
    let mut leaves: Vec<LeafRecord> = files
        .iter()
        .map(|f| {
            let content = merkle::content_hash(&f.bytes);
            LeafRecord {
                path: f.path.clone(),
                size: f.bytes.len() as u64,
                content_hash: content.into(),
                leaf_hash: merkle::leaf_hash(&content).into(),
            }
        })
        .collect();
    leaves.sort_by(|a, b| (a.leaf_hash, &a.path).cmp(&(b.leaf_hash, &b.path)));

    let tree = build_tree(leaves.iter().map(|l| l.leaf_hash.0))?;
    let summary = summarize(&leaves, &tree);

    tracing::debug!(
        files = leaves.len(),
        unique = tree.leaf_count(),
        root = %hex::encode(tree.root()),
        "Commitment generated"
    );

    let (root, levels) = tree.into_parts();

    Ok(CommitmentArtifact {
        schema: SCHEMA.to_string(),
        root: root.into(),
        leaves,
        tree: TreeSection {
            levels: to_hex_levels(levels),
        },
        folder_policy,
        summary,
    })
}

/// Canonical pretty-printed JSON
pub fn encode(artifact: &CommitmentArtifact) -> Result<String, CommitmentError> {
    Ok(serde_json::to_string_pretty(artifact)?)
}

/// Parse an artifact and check its schema tag
pub fn decode(json: &[u8]) -> Result<CommitmentArtifact, CommitmentError> {
    let artifact: CommitmentArtifact = serde_json::from_slice(json)?;
    if artifact.schema != SCHEMA {
        return Err(CommitmentError::UnsupportedSchema(artifact.schema));
    }
    Ok(artifact)
}

/// Recompute the tree from `leaves[].leafHash` and compare with the record
///
/// # Errors
///
/// The first inconsistency found: schema, per-leaf hash, levels, root, then
/// summary counts.
pub fn verify(artifact: &CommitmentArtifact) -> Result<MerkleTree, CommitmentError> {
    if artifact.schema != SCHEMA {
        return Err(CommitmentError::UnsupportedSchema(artifact.schema.clone()));
    }

    for leaf in &artifact.leaves {
        if merkle::leaf_hash(leaf.content_hash.as_bytes()) != leaf.leaf_hash.0 {
            return Err(CommitmentError::LeafMismatch {
                path: leaf.path.clone(),
            });
        }
    }

    let tree = build_tree(artifact.leaves.iter().map(|l| l.leaf_hash.0))?;

    if to_hex_levels(tree.levels().to_vec()) != artifact.tree.levels {
        return Err(CommitmentError::LevelsMismatch);
    }

    if tree.root() != artifact.root.as_bytes() {
        return Err(CommitmentError::RootMismatch {
            recorded: artifact.root.to_hex(),
            computed: hex::encode(tree.root()),
        });
    }

    let expected = summarize(&artifact.leaves, &tree);
    let s = &artifact.summary;
    if s.file_count != expected.file_count {
        return Err(CommitmentError::SummaryMismatch(format!(
            "fileCount {} != {}",
            s.file_count, expected.file_count
        )));
    }
    if s.total_bytes != expected.total_bytes {
        return Err(CommitmentError::SummaryMismatch(format!(
            "totalBytes {} != {}",
            s.total_bytes, expected.total_bytes
        )));
    }
    if s.unique_leaf_count != expected.unique_leaf_count {
        return Err(CommitmentError::SummaryMismatch(format!(
            "uniqueLeafCount {} != {}",
            s.unique_leaf_count, expected.unique_leaf_count
        )));
    }
    if s.level_count != expected.level_count {
        return Err(CommitmentError::SummaryMismatch(format!(
            "levelCount {} != {}",
            s.level_count, expected.level_count
        )));
    }

    Ok(tree)
}

/// Check that `bytes` is committed to by the artifact, wherever the file lives
///
/// Returns `Ok(None)` when the content is not among the leaves.
pub fn verify_file(
    artifact: &CommitmentArtifact,
    bytes: &[u8],
) -> Result<Option<FileInclusion>, CommitmentError> {
    let tree = verify(artifact)?;
    let leaf: Hash = merkle::leaf_hash(&merkle::content_hash(bytes));

    let Some(leaf_index) = tree.position_of(&leaf) else {
        return Ok(None);
    };

    let proof = tree.proof(leaf_index)?;
    let recorded_paths = artifact
        .leaves
        .iter()
        .filter(|l| l.leaf_hash.0 == leaf)
        .map(|l| l.path.clone())
        .collect();

    Ok(Some(FileInclusion {
        leaf_hash: leaf.into(),
        leaf_index,
        recorded_paths,
        proof,
    }))
}

fn summarize(leaves: &[LeafRecord], tree: &MerkleTree) -> Summary {
    Summary {
        file_count: leaves.len(),
        total_bytes: leaves.iter().map(|l| l.size).sum(),
        unique_leaf_count: tree.leaf_count(),
        level_count: tree.levels().len(),
        generated_at: Utc::now(),
    }
}

fn to_hex_levels(levels: Vec<Vec<Hash>>) -> Vec<Vec<HexHash>> {
    levels
        .into_iter()
        .map(|level| level.into_iter().map(HexHash).collect())
        .collect()
}
