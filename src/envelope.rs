//! Inner envelope: splitting and joining a chunk payload
//!
//! ```text
//! chunk_payload := <key_len:varint><key_bytes><value_bytes>
//! ```
//!
//! `key_len` counts only the key bytes. The value has no length of its own
//! and runs to the end of the payload, so its boundary comes from the outer
//! chunk length.

use alloc::vec::Vec;
use core::ops::Range;

use crate::error::{Error, Result};
use crate::varint;

/// Location of the key and value inside a chunk payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvSpan {
    /// Byte range of the key
    pub key: Range<usize>,
    /// Byte range of the value
    pub value: Range<usize>,
}

impl KvSpan {
    /// Borrow the key and value out of the payload this span was located in
    ///
    /// # Panics
    ///
    /// If `payload` is shorter than the one the span was computed for.
    #[inline]
    pub fn slice<'a>(&self, payload: &'a [u8]) -> (&'a [u8], &'a [u8]) {
        (&payload[self.key.clone()], &payload[self.value.clone()])
    }
}

/// Locate key and value in a chunk payload without copying
///
/// Fails with `Error::UnexpectedEof` / `Error::Overflow` for a malformed key
/// length prefix and `Error::KeyOverrun` when the declared key length runs
/// past the end of the payload.
#[inline]
pub fn locate(payload: &[u8]) -> Result<KvSpan> {
    let (key_len, prefix) = varint::decode_u64(payload)?;
    let available = payload.len() - prefix;

    let key_len = match usize::try_from(key_len) {
        Ok(n) if n <= available => n,
        _ => {
            return Err(Error::KeyOverrun {
                declared: key_len,
                available,
            })
        }
    };

    let key_end = prefix + key_len;
    Ok(KvSpan {
        key: prefix..key_end,
        value: key_end..payload.len(),
    })
}

/// Split a chunk payload into `(key, value)` slices
#[inline]
pub fn split(payload: &[u8]) -> Result<(&[u8], &[u8])> {
    let span = locate(payload)?;
    Ok(span.slice(payload))
}

/// Size of the payload `join` produces for the given key and value lengths
#[inline]
pub fn joined_len(key_len: usize, value_len: usize) -> usize {
    varint::encoded_len(key_len as u64) + key_len + value_len
}

/// Join a key and value into a chunk payload: `<varint(len(key))><key><value>`
pub fn join(key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(joined_len(key.len(), value.len()));
    varint::encode_u64_vec(key.len() as u64, &mut out);
    out.extend_from_slice(key);
    out.extend_from_slice(value);
    out
}
