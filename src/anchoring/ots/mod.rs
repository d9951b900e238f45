//! OpenTimestamps proof format and calendar protocol
//!
//! A proof is a 15-byte magic header, a version byte, and a stream of
//! attestation records. Pending records point at a calendar and the commitment
//! it holds; Bitcoin records carry the block height the commitment landed in.

mod attestation;
mod body;
mod calendar;
mod codec;
mod config;
mod error;
mod reader;

#[cfg(test)]
pub(crate) mod fixtures;

pub use attestation::{
    parse_stream, scan_for_bitcoin, Attestation, AttestationStream, MAX_URL_LEN, TAG_BITCOIN,
    TAG_CALENDAR,
};
pub use body::decode_body;
pub use calendar::CalendarClient;
pub use codec::{
    check_header, has_bitcoin_attestation, validate, BitcoinAttestationInfo, OtsProof, HEADER_LEN,
    MAGIC, VERSION,
};
pub use config::{OtsConfig, DEFAULT_CALENDAR_URLS, DEFAULT_POOL_URLS};
pub(crate) use config::{parse_env, url_list};
pub use error::OtsError;
pub use reader::{write_varint, ByteReader, MAX_VARINT_LEN};
