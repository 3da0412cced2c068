//! Value marshalers
//!
//! A marshaler turns one statically known value type into bytes and back. It
//! knows nothing about keys or framing; `KeyedCodec` pairs it with the
//! envelope layout.

use alloc::vec::Vec;
#[cfg(any(feature = "protobuf", feature = "serde"))]
use core::{fmt, marker::PhantomData};

use crate::error::Result;
#[cfg(any(feature = "protobuf", feature = "serde", feature = "lz4"))]
use crate::error::Error;
#[cfg(any(feature = "protobuf", feature = "serde", feature = "lz4"))]
use alloc::string::ToString;

/// Serializes and deserializes a single value type
pub trait Marshaler: Clone {
    /// The value type this marshaler is bound to
    type Value;

    /// Serialize `value`
    fn marshal(&self, value: &Self::Value) -> Result<Vec<u8>>;

    /// Deserialize a fresh value from `bytes`
    fn unmarshal(&self, bytes: &[u8]) -> Result<Self::Value>;
}

/// Identity marshaler: the value is the payload bytes themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytes;

impl Marshaler for RawBytes {
    type Value = Vec<u8>;

    #[inline]
    fn marshal(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    #[inline]
    fn unmarshal(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// Protocol buffer values via `prost`
#[cfg(feature = "protobuf")]
pub struct Protobuf<M>(PhantomData<fn() -> M>);

#[cfg(feature = "protobuf")]
impl<M> Protobuf<M> {
    /// Marshaler for the message type `M`
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

#[cfg(feature = "protobuf")]
impl<M> Default for Protobuf<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "protobuf")]
impl<M> Clone for Protobuf<M> {
    fn clone(&self) -> Self {
        *self
    }
}

#[cfg(feature = "protobuf")]
impl<M> Copy for Protobuf<M> {}

#[cfg(feature = "protobuf")]
impl<M> fmt::Debug for Protobuf<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Protobuf<{}>", core::any::type_name::<M>())
    }
}

#[cfg(feature = "protobuf")]
impl<M> Marshaler for Protobuf<M>
where
    M: prost::Message + Default,
{
    type Value = M;

    #[inline]
    fn marshal(&self, value: &M) -> Result<Vec<u8>> {
        Ok(value.encode_to_vec())
    }

    #[inline]
    fn unmarshal(&self, bytes: &[u8]) -> Result<M> {
        M::decode(bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Serde values in the `postcard` wire format
#[cfg(feature = "serde")]
pub struct Postcard<T>(PhantomData<fn() -> T>);

#[cfg(feature = "serde")]
impl<T> Postcard<T> {
    /// Marshaler for the serde type `T`
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

#[cfg(feature = "serde")]
impl<T> Default for Postcard<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "serde")]
impl<T> Clone for Postcard<T> {
    fn clone(&self) -> Self {
        *self
    }
}

#[cfg(feature = "serde")]
impl<T> Copy for Postcard<T> {}

#[cfg(feature = "serde")]
impl<T> fmt::Debug for Postcard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Postcard<{}>", core::any::type_name::<T>())
    }
}

#[cfg(feature = "serde")]
impl<T> Marshaler for Postcard<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    type Value = T;

    fn marshal(&self, value: &T) -> Result<Vec<u8>> {
        postcard::to_allocvec(value).map_err(|e| Error::Encode(e.to_string()))
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<T> {
        postcard::from_bytes(bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// LZ4 block compression around another marshaler
///
/// The stored value is the inner marshaler's output compressed with a
/// little-endian `u32` uncompressed size in front.
#[cfg(feature = "lz4")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4<M>(pub M);

#[cfg(feature = "lz4")]
impl<M: Marshaler> Marshaler for Lz4<M> {
    type Value = M::Value;

    fn marshal(&self, value: &M::Value) -> Result<Vec<u8>> {
        let plain = self.0.marshal(value)?;
        Ok(lz4_flex::block::compress_prepend_size(&plain))
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<M::Value> {
        let plain = lz4_flex::block::decompress_size_prepended(bytes)
            .map_err(|e| Error::Decode(e.to_string()))?;
        self.0.unmarshal(&plain)
    }
}
