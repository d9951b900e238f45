//! Commitment artifact (schema `merkle-bytes-tree@1`)
//!
//! The artifact is the portable record of a commitment: the root, every input
//! file's hashes, the full tree levels, an opaque folder policy, and a summary.
//! It is read-only once generated; verification recomputes everything from
//! `leaves[].leafHash` and never mutates the artifact.

mod artifact;
mod codec;

pub use artifact::{
    CommitmentArtifact, FileInput, HexHash, LeafRecord, Summary, TreeSection, SCHEMA,
};
pub use codec::{decode, encode, generate, verify, verify_file, FileInclusion};

use thiserror::Error;

use crate::merkle::MerkleError;

/// Commitment artifact errors
#[derive(Debug, Error)]
pub enum CommitmentError {
    /// Artifact declares a schema this codec does not understand
    #[error("unsupported schema: {0}")]
    UnsupportedSchema(String),

    /// JSON is malformed or missing fields
    #[error("malformed artifact: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A leaf's recorded hashes disagree with each other
    #[error("leaf {path}: leafHash does not match contentHash")]
    LeafMismatch { path: String },

    /// Recomputed levels differ from the recorded ones
    #[error("tree levels do not match leaves")]
    LevelsMismatch,

    /// Recomputed root differs from the recorded one
    #[error("root mismatch: recorded {recorded}, computed {computed}")]
    RootMismatch { recorded: String, computed: String },

    /// Summary counts disagree with the leaves
    #[error("summary mismatch: {0}")]
    SummaryMismatch(String),

    /// Tree engine failure (e.g. no leaves)
    #[error(transparent)]
    Merkle(#[from] MerkleError),
}
