// TLS specific helpers for parsing binary packets.

use bytes::Bytes;

use crate::error::{Error, Result};

pub const U8_LIMIT: usize = u8::max_value() as usize;
pub const U16_LIMIT: usize = u16::max_value() as usize;
pub const U24_LIMIT: usize = 1 << 24;

/// Sequential reader over an immutable byte buffer. All multi-byte integers
/// are big-endian (network order).
pub struct Reader {
    buf: Bytes,
}

impl Reader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn next_u8(&mut self) -> Result<u8> {
        let b = self.take(1)?;
        Ok(b[0])
    }

    pub fn next_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn next_u24(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn take(&mut self, n: usize) -> Result<Bytes> {
        if self.buf.len() < n {
            return Err(Error::UnexpectedMessage("truncated message"));
        }
        Ok(self.buf.split_to(n))
    }

    /// Reads a variable length vector of bytes. The limits determine how
    /// large the length prefix is: TLS uses the minimum number of octets able
    /// to represent the maximum length.
    pub fn varlen_vector(&mut self, min_bytes: usize, max_bytes: usize) -> Result<Bytes> {
        let len = if max_bytes <= U8_LIMIT {
            self.next_u8()? as usize
        } else if max_bytes <= U16_LIMIT {
            self.next_u16()? as usize
        } else if max_bytes <= U24_LIMIT {
            self.next_u24()? as usize
        } else {
            panic!("Maximum length not supported");
        };

        if len < min_bytes || len > max_bytes {
            return Err(Error::UnexpectedMessage("length out of allowed range"));
        }

        self.take(len)
    }

    pub fn expect_empty(&self) -> Result<()> {
        if !self.buf.is_empty() {
            return Err(Error::UnexpectedMessage("trailing bytes after message"));
        }
        Ok(())
    }
}

/// Encodes a byte vector using the length prefixed wire format defined by TLS.
pub fn serialize_varlen_vector<F: FnMut(&mut Vec<u8>)>(
    min_bytes: usize,
    max_bytes: usize,
    out: &mut Vec<u8>,
    mut f: F,
) {
    let i = out.len();
    let n = if max_bytes <= U8_LIMIT {
        1
    } else if max_bytes <= U16_LIMIT {
        2
    } else if max_bytes <= U24_LIMIT {
        3
    } else {
        panic!("Maximum length not supported");
    };

    out.resize(i + n, 0);

    f(out);

    let size = out.len() - (i + n);
    assert!(size >= min_bytes && size <= max_bytes);

    match n {
        1 => {
            out[i] = size as u8;
        }
        2 => {
            out[i..i + 2].copy_from_slice(&(size as u16).to_be_bytes());
        }
        3 => {
            let b = (size as u32).to_be_bytes();
            out[i..i + 3].copy_from_slice(&b[1..]);
        }
        _ => panic!("Should not happen"),
    };
}
