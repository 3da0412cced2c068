//! Keyed record writer

use std::borrow::Cow;
use std::io::Write;

use tracing::trace;

use crate::chunk::ChunkWriter;
use crate::codec::KeyedRecordCodec;
use crate::error::Result;
use crate::record::KeyedRecord;

/// Writes keyed records as length-prefixed chunks
///
/// Raw records read with the same codec type are copied through without
/// re-encoding as long as they were not modified and the codec allows it.
pub struct KeyedRecordWriter<W, C> {
    chunks: ChunkWriter<W>,
    codec: C,
    passthrough: u64,
}

impl<W: Write, C: KeyedRecordCodec> KeyedRecordWriter<W, C> {
    /// Writer over `writer` encoding records with `codec`
    pub fn new(writer: W, codec: C) -> Self {
        Self {
            chunks: ChunkWriter::new(writer),
            codec,
            passthrough: 0,
        }
    }

    /// Write one record. Returns the bytes put on the wire.
    ///
    /// Split, decode and encode errors from the record are returned as-is,
    /// as are I/O errors from the underlying writer.
    pub fn write(&mut self, record: &KeyedRecord<C>) -> Result<usize> {
        let payload = record.bytes_out(&self.codec)?;
        let written = self.chunks.write(&payload)?;
        if matches!(payload, Cow::Borrowed(_)) {
            self.passthrough += 1;
            trace!(len = payload.len(), "raw record passed through");
        }
        Ok(written)
    }

    /// Encode and write a key and value
    pub fn write_kv(&mut self, key: &[u8], value: &C::Value) -> Result<usize> {
        let value_bytes = self.codec.marshal_val(value)?;
        let payload = self.codec.join_kv(key, &value_bytes);
        self.chunks.write(&payload)
    }

    /// Write a record read with a different codec for the same value type.
    /// The value is always re-encoded with this writer's codec.
    pub fn write_from<D>(&mut self, record: &KeyedRecord<D>) -> Result<usize>
    where
        D: KeyedRecordCodec<Value = C::Value>,
    {
        let payload = record.encode_with(&self.codec)?;
        self.chunks.write(&payload)
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.chunks.flush()
    }

    /// Number of records written so far
    #[inline]
    pub fn records_written(&self) -> u64 {
        self.chunks.chunks_written()
    }

    /// Number of records written without re-encoding
    #[inline]
    pub fn passthrough_count(&self) -> u64 {
        self.passthrough
    }

    /// The codec records are encoded with
    #[inline]
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Borrow the underlying writer
    #[inline]
    pub fn get_ref(&self) -> &W {
        self.chunks.get_ref()
    }

    /// Return the underlying writer
    pub fn into_inner(self) -> W {
        self.chunks.into_inner()
    }
}
