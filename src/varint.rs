//! Variable-length integer encoding (LEB128)
//!
//! Unsigned base-128 varints, 7 data bits per byte, low group first, high bit
//! set on every byte except the last. Byte-identical to protobuf varints.
//! Used for both the outer chunk length and the inner key length.

use alloc::vec::Vec;

use crate::error::{Error, Result};

/// Maximum bytes needed for a u64 varint (10 bytes)
pub const MAX_VARINT_U64_SIZE: usize = 10;

/// Number of bytes `value` occupies once encoded
#[inline]
pub const fn encoded_len(value: u64) -> usize {
    // ceil(significant bits / 7), with zero taking one byte
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Encode a u64 as varint into the given buffer
///
/// Returns the number of bytes written, or Error::ShortBuffer if insufficient space.
#[inline]
pub fn encode_u64(value: u64, buf: &mut [u8]) -> Result<usize> {
    let mut value = value;
    let mut pos = 0;

    loop {
        if pos >= buf.len() {
            return Err(Error::ShortBuffer);
        }

        if value < 0x80 {
            buf[pos] = value as u8;
            return Ok(pos + 1);
        }

        buf[pos] = (value as u8) | 0x80;
        value >>= 7;
        pos += 1;
    }
}

/// Append the varint encoding of `value` to `out`
#[inline]
pub fn encode_u64_vec(value: u64, out: &mut Vec<u8>) {
    let mut scratch = [0u8; MAX_VARINT_U64_SIZE];
    // Ten bytes always hold a u64
    let n = encode_u64(value, &mut scratch).unwrap_or(0);
    out.extend_from_slice(&scratch[..n]);
}

/// Decode a u64 varint from the given buffer
///
/// Returns (value, bytes_consumed) or an error. A varint longer than ten
/// bytes, or a tenth byte carrying bits past bit 63, is `Error::Overflow`.
#[inline]
pub fn decode_u64(buf: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0;
    let mut pos = 0;

    loop {
        if pos >= buf.len() {
            return Err(Error::UnexpectedEof);
        }

        let byte = buf[pos];
        pos += 1;

        if pos == MAX_VARINT_U64_SIZE && byte > 1 {
            return Err(Error::Overflow);
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            return Ok((result, pos));
        }

        shift += 7;
    }
}
