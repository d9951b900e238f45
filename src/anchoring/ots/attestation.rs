//! Attestation records

use serde::{Deserialize, Serialize};

use super::error::OtsError;
use super::reader::{write_varint, ByteReader};

/// Tag for a pending calendar attestation
pub const TAG_CALENDAR: u8 = 0x00;

/// Tag for a Bitcoin block attestation
pub const TAG_BITCOIN: u8 = 0x05;

/// Longest URL a one-byte length prefix can carry
pub const MAX_URL_LEN: usize = u8::MAX as usize;

/// A claim about where a commitment is (or will be) anchored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attestation {
    /// Pending: a calendar holds the commitment and will anchor it later
    Calendar {
        url: String,
        #[serde(with = "hex::serde")]
        commitment: [u8; 32],
    },

    /// Anchored in a Bitcoin block
    BitcoinBlock {
        height: u64,
        #[serde(with = "hex::serde")]
        merkle_root: [u8; 32],
    },
}

impl Attestation {
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Self::Calendar { .. } => TAG_CALENDAR,
            Self::BitcoinBlock { .. } => TAG_BITCOIN,
        }
    }

    /// Read one record. `Ok(None)` on an unknown tag; the tag byte is consumed.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Option<Self>, OtsError> {
        match reader.read_u8()? {
            TAG_CALENDAR => {
                let len = usize::from(reader.read_u8()?);
                let url_offset = reader.position();
                let url_bytes = reader.read_bytes(len)?;
                let url = std::str::from_utf8(url_bytes)
                    .map_err(|_| OtsError::InvalidUrl { offset: url_offset })?
                    .to_string();
                let commitment = reader.read_array()?;
                Ok(Some(Self::Calendar { url, commitment }))
            }
            TAG_BITCOIN => {
                let height = reader.read_varint()?;
                let merkle_root = reader.read_array()?;
                Ok(Some(Self::BitcoinBlock {
                    height,
                    merkle_root,
                }))
            }
            _ => Ok(None),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), OtsError> {
        out.push(self.tag());
        match self {
            Self::Calendar { url, commitment } => {
                let len = u8::try_from(url.len()).map_err(|_| OtsError::UrlTooLong(url.len()))?;
                out.push(len);
                out.extend_from_slice(url.as_bytes());
                out.extend_from_slice(commitment);
            }
            Self::BitcoinBlock {
                height,
                merkle_root,
            } => {
                write_varint(out, *height);
                out.extend_from_slice(merkle_root);
            }
        }
        Ok(())
    }
}

/// Parsed attestation stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttestationStream {
    pub attestations: Vec<Attestation>,
    /// Bytes from the first unknown tag onward, kept verbatim
    pub trailing: Vec<u8>,
}

/// Parse records until the stream ends or an unknown tag appears
///
/// An unknown tag stops parsing; it and everything after it land in
/// `trailing`. A truncated record is an error.
pub fn parse_stream(stream: &[u8]) -> Result<AttestationStream, OtsError> {
    let mut reader = ByteReader::new(stream);
    let mut attestations = Vec::new();

    while !reader.is_empty() {
        let record_start = reader.position();
        match Attestation::read(&mut reader)? {
            Some(att) => attestations.push(att),
            None => {
                tracing::debug!(
                    offset = record_start,
                    tag = stream[record_start],
                    "Unknown attestation tag, stopping parse"
                );
                return Ok(AttestationStream {
                    attestations,
                    trailing: stream[record_start..].to_vec(),
                });
            }
        }
    }

    Ok(AttestationStream {
        attestations,
        trailing: Vec::new(),
    })
}

/// First Bitcoin attestation in a stream, tolerating corruption after it
///
/// Scans record by record and stops on an unknown tag or the first read error;
/// whatever was found before that point counts.
#[must_use]
pub fn scan_for_bitcoin(stream: &[u8]) -> Option<u64> {
    let mut reader = ByteReader::new(stream);
    while !reader.is_empty() {
        match Attestation::read(&mut reader) {
            Ok(Some(Attestation::BitcoinBlock { height, .. })) => return Some(height),
            Ok(Some(Attestation::Calendar { .. })) => continue,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(error = %e, "Attestation scan stopped early");
                return None;
            }
        }
    }
    None
}
