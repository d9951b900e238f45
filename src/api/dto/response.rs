//! Response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response for POST /api/stamp
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampResponse {
    /// Proof bytes as a JSON array of integers
    pub ots_file: Vec<u8>,

    /// First pool server to accept the digest
    pub server: String,

    /// All pool servers that accepted the digest
    pub servers: Vec<String>,
}

/// Anchoring stage reported by the proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofStatus {
    Pending,
    Anchored,
    Confirmed,
}

/// Response for POST /api/upgrade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeResponse {
    pub ots_file: Vec<u8>,

    /// A Bitcoin attestation is present
    pub upgraded: bool,

    pub status: ProofStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,

    /// Absent when no tip source answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip_height: Option<u64>,

    /// Calendar server whose answer advanced the proof in this call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_server: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// API error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Machine-readable error code
    pub code: String,

    /// Whether the error is recoverable (client can retry)
    pub recoverable: bool,
}
