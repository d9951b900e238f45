//! OTS codec errors

use thiserror::Error;

/// Structural errors in an OTS proof blob
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtsError {
    /// Fewer bytes than the header requires
    #[error("proof too short: {len} bytes, header needs {needed}")]
    TooShort { len: usize, needed: usize },

    /// First byte is not 0x00
    #[error("bad magic prefix byte: 0x{0:02x}")]
    BadMagicPrefix(u8),

    /// Bytes 1..15 are not "OpenTimestamps"
    #[error("bad magic header")]
    BadMagic,

    #[error("unsupported proof version: {0}")]
    UnsupportedVersion(u8),

    /// A read ran past the end of the buffer
    #[error("truncated at offset {offset}: needed {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    /// Varint does not fit in 64 bits
    #[error("varint overflow at offset {offset}")]
    VarintOverflow { offset: usize },

    /// Calendar URL longer than a one-byte length prefix allows
    #[error("calendar URL too long: {0} bytes (max 255)")]
    UrlTooLong(usize),

    /// Calendar URL bytes are not UTF-8
    #[error("calendar URL at offset {offset} is not valid UTF-8")]
    InvalidUrl { offset: usize },
}
