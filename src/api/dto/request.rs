//! Request DTOs

use serde::{Deserialize, Serialize};

/// Request body for POST /api/stamp
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampRequest {
    /// Merkle root as 64 hex characters
    pub merkle_root_hex: String,
}

/// Request body for POST /api/upgrade
///
/// The server validates `otsFile` element by element rather than through
/// serde, so out-of-range bytes are reported precisely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    /// Proof bytes as a JSON array of integers 0..=255
    pub ots_file: Vec<u8>,
}
