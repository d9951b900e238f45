//! Decoding of pool/calendar response bodies
//!
//! Servers answer with raw proof bytes, hex text or base64 text. Detection
//! order: binary content type or magic prefix, then hex, then base64, else the
//! body is taken as-is.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::codec::MAGIC;

const BINARY_CONTENT_TYPES: &[&str] = &[
    "application/octet-stream",
    "application/vnd.opentimestamps.v1",
    "application/x-opentimestamps",
];

/// Turn a response body into proof bytes
#[must_use]
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Vec<u8> {
    if is_binary_content_type(content_type) || body.starts_with(&MAGIC) {
        return body.to_vec();
    }

    let Ok(text) = std::str::from_utf8(body) else {
        return body.to_vec();
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return body.to_vec();
    }

    if trimmed.len() % 2 == 0 && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
        if let Ok(bytes) = hex::decode(trimmed) {
            tracing::trace!(len = bytes.len(), "Decoded hex response body");
            return bytes;
        }
    }

    if let Ok(bytes) = STANDARD.decode(trimmed) {
        tracing::trace!(len = bytes.len(), "Decoded base64 response body");
        return bytes;
    }

    body.to_vec()
}

fn is_binary_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .is_some_and(|ct| BINARY_CONTENT_TYPES.contains(&ct.as_str()))
}
