//! Bounded cursor over an untrusted byte slice
//!
//! Every read checks the remaining length first and reports the failing offset.
//! Nothing in here can index past the end of the buffer.

use super::error::OtsError;

/// Maximum encoded length of a u64 varint (ceil(64 / 7))
pub const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread tail of the buffer
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn read_u8(&mut self) -> Result<u8, OtsError> {
        let b = *self.buf.get(self.pos).ok_or(OtsError::Truncated {
            offset: self.pos,
            needed: 1,
        })?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], OtsError> {
        if n > self.remaining() {
            return Err(OtsError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], OtsError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Little-endian base-128 varint: 7 data bits per byte, high bit continues
    pub fn read_varint(&mut self) -> Result<u64, OtsError> {
        let start = self.pos;
        let mut value: u64 = 0;

        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            let data = u64::from(byte & 0x7f);
            let shift = 7 * i as u32;

            // The tenth byte may only carry the single remaining bit
            if i == MAX_VARINT_LEN - 1 && data > 1 {
                return Err(OtsError::VarintOverflow { offset: start });
            }
            value |= data << shift;

            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(OtsError::VarintOverflow { offset: start })
    }
}

/// Append `value` as a little-endian base-128 varint
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
