//! Keyed records with deferred decoding
//!
//! A record read off a stream starts out as its raw chunk payload plus the
//! codec that can interpret it. The key and value are located and decoded
//! the first time they are asked for, and the result is kept on the record.
//! A record that is never modified can be written back out byte for byte.

use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt;

use crate::codec::KeyedRecordCodec;
use crate::envelope::KvSpan;
use crate::error::{Error, Result};

/// A key and a value of the codec's value type
pub struct KeyedRecord<C: KeyedRecordCodec> {
    state: State<C>,
}

enum State<C: KeyedRecordCodec> {
    Raw(Raw<C>),
    Owned { key: Vec<u8>, value: C::Value },
}

struct Raw<C: KeyedRecordCodec> {
    wire: Vec<u8>,
    codec: C,
    span: Option<KvSpan>,
    value: Option<C::Value>,
    modified: bool,
}

impl<C: KeyedRecordCodec> Raw<C> {
    fn span(&mut self) -> Result<KvSpan> {
        if let Some(span) = &self.span {
            return Ok(span.clone());
        }
        let span = self.codec.locate_kv(&self.wire)?;
        self.span = Some(span.clone());
        Ok(span)
    }

    /// Key bytes and the decoded value, decoding on first use
    fn parts(&mut self) -> Result<(&[u8], &mut C::Value)> {
        let span = self.span()?;
        let value = match self.value.take() {
            Some(value) => value,
            None => self.codec.unmarshal_val(&self.wire[span.value.clone()])?,
        };
        let value = self.value.insert(value);
        Ok((&self.wire[span.key], value))
    }

    /// Re-encode without touching the caches
    fn encode_with<E>(&self, encoder: &E) -> Result<Vec<u8>>
    where
        E: KeyedRecordCodec<Value = C::Value>,
    {
        let span = match &self.span {
            Some(span) => span.clone(),
            None => self.codec.locate_kv(&self.wire)?,
        };

        let decoded;
        let value = match &self.value {
            Some(value) => value,
            None => {
                decoded = self.codec.unmarshal_val(&self.wire[span.value.clone()])?;
                &decoded
            }
        };

        let value_bytes = encoder.marshal_val(value)?;
        Ok(encoder.join_kv(&self.wire[span.key], &value_bytes))
    }
}

impl<C: KeyedRecordCodec> KeyedRecord<C> {
    /// Record over a raw chunk payload, decoded lazily with `codec`
    #[inline]
    pub fn from_wire(wire: Vec<u8>, codec: C) -> Self {
        Self {
            state: State::Raw(Raw {
                wire,
                codec,
                span: None,
                value: None,
                modified: false,
            }),
        }
    }

    /// Record built from a key and an already decoded value
    #[inline]
    pub fn new(key: impl Into<Vec<u8>>, value: C::Value) -> Self {
        Self {
            state: State::Owned {
                key: key.into(),
                value,
            },
        }
    }

    /// True while the record still carries the payload it was read from
    #[inline]
    pub fn is_raw(&self) -> bool {
        matches!(self.state, State::Raw(_))
    }

    /// True once the value of a raw record has been handed out mutably or
    /// replaced. Modified records are always re-encoded on write.
    #[inline]
    pub fn is_modified(&self) -> bool {
        match &self.state {
            State::Raw(raw) => raw.modified,
            State::Owned { .. } => false,
        }
    }

    /// The chunk payload this record was read from, if any
    #[inline]
    pub fn wire_bytes(&self) -> Option<&[u8]> {
        match &self.state {
            State::Raw(raw) => Some(raw.wire.as_slice()),
            State::Owned { .. } => None,
        }
    }

    /// The key bytes
    pub fn key(&mut self) -> Result<&[u8]> {
        match &mut self.state {
            State::Raw(raw) => {
                let span = raw.span()?;
                Ok(&raw.wire[span.key])
            }
            State::Owned { key, .. } => Ok(key.as_slice()),
        }
    }

    /// The key as UTF-8
    pub fn key_str(&mut self) -> Result<&str> {
        core::str::from_utf8(self.key()?).map_err(|_| Error::InvalidUtf8)
    }

    /// The decoded value. The value is unmarshaled at most once.
    pub fn value(&mut self) -> Result<&C::Value> {
        match &mut self.state {
            State::Raw(raw) => raw.parts().map(|(_, value)| &*value),
            State::Owned { value, .. } => Ok(&*value),
        }
    }

    /// Key and decoded value together
    pub fn key_value(&mut self) -> Result<(&[u8], &C::Value)> {
        match &mut self.state {
            State::Raw(raw) => raw.parts().map(|(key, value)| (key, &*value)),
            State::Owned { key, value } => Ok((key.as_slice(), &*value)),
        }
    }

    /// Mutable access to the decoded value. Marks a raw record modified.
    pub fn value_mut(&mut self) -> Result<&mut C::Value> {
        match &mut self.state {
            State::Raw(raw) => {
                raw.parts()?;
                raw.modified = true;
                raw.parts().map(|(_, value)| value)
            }
            State::Owned { value, .. } => Ok(value),
        }
    }

    /// Replace the value, keeping the key
    pub fn set_value(&mut self, value: C::Value) -> Result<()> {
        match &mut self.state {
            State::Raw(raw) => {
                raw.span()?;
                raw.value = Some(value);
                raw.modified = true;
            }
            State::Owned { value: slot, .. } => *slot = value,
        }
        Ok(())
    }

    /// Replace the key. A raw record is decoded and becomes an owned one.
    pub fn set_key(&mut self, key: impl Into<Vec<u8>>) -> Result<()> {
        let key = key.into();
        match &mut self.state {
            State::Owned { key: slot, .. } => *slot = key,
            State::Raw(raw) => {
                raw.parts()?;
                if let Some(value) = raw.value.take() {
                    self.state = State::Owned { key, value };
                }
            }
        }
        Ok(())
    }

    /// Consume the record, returning the owned key and value
    pub fn into_parts(self) -> Result<(Vec<u8>, C::Value)> {
        match self.state {
            State::Owned { key, value } => Ok((key, value)),
            State::Raw(mut raw) => {
                let span = raw.span()?;
                let value = match raw.value.take() {
                    Some(value) => value,
                    None => raw.codec.unmarshal_val(&raw.wire[span.value])?,
                };
                Ok((raw.wire[span.key].to_vec(), value))
            }
        }
    }

    /// Chunk payload to write for this record with `encoder`
    ///
    /// Raw, unmodified records are returned as-is when both the record's
    /// codec and `encoder` support passthrough. Everything else goes
    /// through `marshal_val` and `join_kv`.
    pub fn bytes_out(&self, encoder: &C) -> Result<Cow<'_, [u8]>> {
        match &self.state {
            State::Raw(raw)
                if !raw.modified
                    && raw.codec.supports_passthrough()
                    && encoder.supports_passthrough() =>
            {
                Ok(Cow::Borrowed(raw.wire.as_slice()))
            }
            _ => self.encode_with(encoder).map(Cow::Owned),
        }
    }

    /// Chunk payload for this record re-encoded with any codec sharing the
    /// value type. Never passes raw bytes through.
    pub fn encode_with<E>(&self, encoder: &E) -> Result<Vec<u8>>
    where
        E: KeyedRecordCodec<Value = C::Value>,
    {
        match &self.state {
            State::Raw(raw) => raw.encode_with(encoder),
            State::Owned { key, value } => {
                let value_bytes = encoder.marshal_val(value)?;
                Ok(encoder.join_kv(key, &value_bytes))
            }
        }
    }
}

impl<C> Clone for KeyedRecord<C>
where
    C: KeyedRecordCodec,
    C::Value: Clone,
{
    fn clone(&self) -> Self {
        let state = match &self.state {
            State::Raw(raw) => State::Raw(Raw {
                wire: raw.wire.clone(),
                codec: raw.codec.clone(),
                span: raw.span.clone(),
                value: raw.value.clone(),
                modified: raw.modified,
            }),
            State::Owned { key, value } => State::Owned {
                key: key.clone(),
                value: value.clone(),
            },
        };
        Self { state }
    }
}

impl<C> fmt::Debug for KeyedRecord<C>
where
    C: KeyedRecordCodec,
    C::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Raw(raw) => f
                .debug_struct("KeyedRecord::Raw")
                .field("wire_len", &raw.wire.len())
                .field("value", &raw.value)
                .field("modified", &raw.modified)
                .finish(),
            State::Owned { key, value } => f
                .debug_struct("KeyedRecord::Owned")
                .field("key", key)
                .field("value", value)
                .finish(),
        }
    }
}
