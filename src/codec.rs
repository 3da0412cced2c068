//! Keyed record codecs
//!
//! A codec splits a chunk payload into key and value bytes, joins them back,
//! and (un)marshals the value. The value type is fixed by the codec's type,
//! so a value of the wrong type cannot reach `marshal_val`.

use alloc::vec::Vec;

use crate::envelope::{self, KvSpan};
use crate::error::Result;
use crate::marshal::{Marshaler, RawBytes};
#[cfg(feature = "protobuf")]
use crate::marshal::Protobuf;

/// Translates between chunk payloads and typed `(key, value)` pairs
///
/// The provided methods implement the standard envelope,
/// `<key_len:varint><key><value>`. Override `locate_kv` and `join_kv`
/// together for a different layout.
pub trait KeyedRecordCodec: Clone {
    /// The value type carried in every record
    type Value;

    /// Find the key and value inside a chunk payload
    #[inline]
    fn locate_kv(&self, payload: &[u8]) -> Result<KvSpan> {
        envelope::locate(payload)
    }

    /// Split a chunk payload into key and value bytes, borrowing from it
    #[inline]
    fn split_kv<'a>(&self, payload: &'a [u8]) -> Result<(&'a [u8], &'a [u8])> {
        let span = self.locate_kv(payload)?;
        Ok(span.slice(payload))
    }

    /// Build a chunk payload from key and value bytes
    #[inline]
    fn join_kv(&self, key: &[u8], value: &[u8]) -> Vec<u8> {
        envelope::join(key, value)
    }

    /// Deserialize value bytes into a fresh value
    fn unmarshal_val(&self, bytes: &[u8]) -> Result<Self::Value>;

    /// Serialize a value
    fn marshal_val(&self, value: &Self::Value) -> Result<Vec<u8>>;

    /// Whether raw value bytes read with this codec may be written back
    /// verbatim by a writer using the same codec, skipping
    /// `unmarshal_val`/`marshal_val` for unmodified records
    #[inline]
    fn supports_passthrough(&self) -> bool {
        false
    }
}

/// The standard keyed record codec: envelope framing around a `Marshaler`
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyedCodec<M> {
    marshaler: M,
    no_passthrough: bool,
}

impl<M: Marshaler> KeyedCodec<M> {
    /// Codec around the given marshaler
    #[inline]
    pub fn new(marshaler: M) -> Self {
        Self {
            marshaler,
            no_passthrough: false,
        }
    }

    /// Always re-encode values on write, even when the raw bytes could be
    /// copied through unchanged
    #[inline]
    pub fn without_passthrough(mut self) -> Self {
        self.no_passthrough = true;
        self
    }

    /// The wrapped marshaler
    #[inline]
    pub fn marshaler(&self) -> &M {
        &self.marshaler
    }
}

impl KeyedCodec<RawBytes> {
    /// Codec whose values are plain byte vectors
    #[inline]
    pub fn raw() -> Self {
        Self::new(RawBytes)
    }
}

#[cfg(feature = "protobuf")]
impl<T> KeyedCodec<Protobuf<T>>
where
    T: prost::Message + Default,
{
    /// Codec for protobuf message values of type `T`
    #[inline]
    pub fn protobuf() -> Self {
        Self::new(Protobuf::new())
    }
}

impl<M: Marshaler> KeyedRecordCodec for KeyedCodec<M> {
    type Value = M::Value;

    #[inline]
    fn unmarshal_val(&self, bytes: &[u8]) -> Result<M::Value> {
        self.marshaler.unmarshal(bytes)
    }

    #[inline]
    fn marshal_val(&self, value: &M::Value) -> Result<Vec<u8>> {
        self.marshaler.marshal(value)
    }

    #[inline]
    fn supports_passthrough(&self) -> bool {
        !self.no_passthrough
    }
}
