//! merkle-stamp library exports
//!
//! Deterministic Merkle commitments over file contents, anchored to Bitcoin
//! through OpenTimestamps pool and calendar servers.

pub mod anchoring;
pub mod api;
pub mod cache;
pub mod client;
pub mod commitment;
pub mod config;
pub mod error;
pub mod merkle;
pub mod proxy;

// Re-exports
pub use commitment::{CommitmentArtifact, CommitmentError};
pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use merkle::{build_tree, MerkleError, MerkleTree};
