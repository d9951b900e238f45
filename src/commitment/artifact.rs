//! Artifact data types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::merkle::Hash;

/// Schema identifier written into every artifact
pub const SCHEMA: &str = "merkle-bytes-tree@1";

/// A 32-byte hash that serializes as 64 lowercase hex characters
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexHash(pub Hash);

impl HexHash {
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<Hash> for HexHash {
    fn from(h: Hash) -> Self {
        Self(h)
    }
}

impl fmt::Debug for HexHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexHash({})", self.to_hex())
    }
}

impl fmt::Display for HexHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for HexHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HexHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(&s, &mut out).map_err(serde::de::Error::custom)?;
        Ok(Self(out))
    }
}

/// A file supplied by the enumeration layer
#[derive(Debug, Clone)]
pub struct FileInput {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl FileInput {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// One input file's record. `path` is metadata and never hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafRecord {
    pub path: String,
    pub size: u64,
    pub content_hash: HexHash,
    pub leaf_hash: HexHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSection {
    pub levels: Vec<Vec<HexHash>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub file_count: usize,
    pub total_bytes: u64,
    pub unique_leaf_count: usize,
    pub level_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// The full commitment artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentArtifact {
    pub schema: String,
    pub root: HexHash,
    pub leaves: Vec<LeafRecord>,
    pub tree: TreeSection,
    #[serde(default)]
    pub folder_policy: serde_json::Value,
    pub summary: Summary,
}
