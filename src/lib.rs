//! keyrec: streams of varint length-prefixed keyed records
//!
//! Each record is a key and a value carried in one self-delimiting chunk. The
//! value encoding is pluggable: protobuf via `prost` out of the box, serde via
//! `postcard`, raw bytes, or anything implementing [`Marshaler`].
//!
//! # Wire Format
//!
//! ```text
//! stream        := chunk*
//! chunk         := <chunk_len:varint><chunk_payload>
//! chunk_payload := <key_len:varint><key_bytes><value_bytes>
//! ```
//!
//! `chunk_len` counts the payload bytes, `key_len` counts the key bytes, and
//! the value runs to the end of the payload. Varints are unsigned LEB128,
//! byte-identical to protobuf varints.
//!
//! # Features
//!
//! - Lazy records: key and value are split and decoded on first access and
//!   cached on the record
//! - Passthrough: unmodified records are written back without re-encoding
//! - Records own their bytes, independent of the scanner's read buffer
//! - `no_std` core with `alloc`; streaming I/O behind the `std` feature
//!
//! # Example
//!
//! ```rust
//! use keyrec::{KeyedCodec, KeyedRecordScanner, KeyedRecordWriter};
//!
//! // Write two records
//! let mut writer = KeyedRecordWriter::new(Vec::new(), KeyedCodec::raw());
//! writer.write_kv(b"user:1", &b"alice".to_vec())?;
//! writer.write_kv(b"user:2", &b"bob".to_vec())?;
//! let stream = writer.into_inner();
//!
//! // Copy them to a new stream without decoding the values
//! let mut scanner = KeyedRecordScanner::new(&stream[..], KeyedCodec::raw());
//! let mut copy = KeyedRecordWriter::new(Vec::new(), KeyedCodec::raw());
//! while scanner.advance() {
//!     copy.write(scanner.record()?)?;
//! }
//! assert!(scanner.err().is_none());
//! assert_eq!(copy.passthrough_count(), 2);
//! assert_eq!(copy.into_inner(), stream);
//! # Ok::<(), keyrec::Error>(())
//! ```

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod codec;
pub mod envelope;
pub mod error;
pub mod marshal;
pub mod record;
pub mod varint;

#[cfg(feature = "std")]
pub mod chunk;
#[cfg(feature = "std")]
pub mod scanner;
#[cfg(feature = "std")]
pub mod writer;

// Re-export main types
pub use codec::{KeyedCodec, KeyedRecordCodec};
pub use envelope::KvSpan;
pub use error::{Error, ErrorClass, Result};
pub use marshal::{Marshaler, RawBytes};
pub use record::KeyedRecord;

#[cfg(feature = "protobuf")]
pub use marshal::Protobuf;

#[cfg(feature = "serde")]
pub use marshal::Postcard;

#[cfg(feature = "lz4")]
pub use marshal::Lz4;

#[cfg(feature = "std")]
pub use chunk::{ChunkScanner, ChunkWriter, ScanConfig};
#[cfg(feature = "std")]
pub use scanner::{KeyedRecordScanner, Records};
#[cfg(feature = "std")]
pub use writer::KeyedRecordWriter;

/// Largest chunk payload a scanner accepts by default (16MB)
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Initial scan buffer capacity (64KB)
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;
