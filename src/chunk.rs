//! Outer envelope: varint length-prefixed chunks over `std::io`
//!
//! ```text
//! stream := chunk*
//! chunk  := <len:varint><payload: len bytes>
//! ```
//!
//! End of input exactly on a chunk boundary ends the scan cleanly. End of
//! input inside a length prefix or a payload is `Error::Truncated`.

use std::io::{self, Read, Write};
use std::vec::Vec;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::varint::{self, MAX_VARINT_U64_SIZE};
use crate::{DEFAULT_BUFFER_CAPACITY, MAX_CHUNK_SIZE};

/// Limits applied while scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Largest chunk payload accepted; longer declared lengths are
    /// `Error::ChunkTooLarge`
    pub max_chunk_len: usize,
    /// Capacity the scan buffer starts with
    pub buffer_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: MAX_CHUNK_SIZE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ScanConfig {
    /// Set the largest accepted chunk payload
    pub fn max_chunk_len(mut self, max: usize) -> Self {
        self.max_chunk_len = max;
        self
    }

    /// Set the initial scan buffer capacity
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }
}

/// Reads one length-prefixed chunk at a time
///
/// The chunk buffer is reused between calls to `advance`; copy out anything
/// that must outlive the next call.
pub struct ChunkScanner<R> {
    reader: R,
    config: ScanConfig,
    buf: Vec<u8>,
    has_chunk: bool,
    done: bool,
    err: Option<Error>,
    chunks_read: u64,
}

/// Result of reading the length prefix
enum Prefix {
    Len(u64),
    Eof,
}

impl<R: Read> ChunkScanner<R> {
    /// Scanner over `reader` with default limits
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ScanConfig::default())
    }

    /// Scanner over `reader` with the given limits
    pub fn with_config(reader: R, config: ScanConfig) -> Self {
        Self {
            reader,
            config,
            buf: Vec::with_capacity(config.buffer_capacity),
            has_chunk: false,
            done: false,
            err: None,
            chunks_read: 0,
        }
    }

    /// Move to the next chunk
    ///
    /// Returns false at end of input or on the first error, and keeps
    /// returning false afterwards. Check `err()` to tell the two apart.
    pub fn advance(&mut self) -> bool {
        self.has_chunk = false;
        if self.done {
            return false;
        }

        match self.next_chunk() {
            Ok(true) => {
                self.has_chunk = true;
                self.chunks_read += 1;
                trace!(len = self.buf.len(), index = self.chunks_read, "chunk read");
                true
            }
            Ok(false) => {
                debug!(chunks = self.chunks_read, "end of chunk stream");
                self.done = true;
                false
            }
            Err(err) => {
                warn!(error = %err, chunks = self.chunks_read, "chunk scan failed");
                self.done = true;
                self.err = Some(err);
                false
            }
        }
    }

    /// Payload of the current chunk; empty when there is none
    #[inline]
    pub fn chunk(&self) -> &[u8] {
        if self.has_chunk {
            &self.buf
        } else {
            &[]
        }
    }

    /// True while `chunk()` refers to a chunk read by the last `advance()`
    #[inline]
    pub fn has_chunk(&self) -> bool {
        self.has_chunk
    }

    /// The first error hit, if the scan stopped on one
    #[inline]
    pub fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Take ownership of the error the scan stopped on
    #[inline]
    pub fn take_err(&mut self) -> Option<Error> {
        self.err.take()
    }

    /// Number of chunks read so far
    #[inline]
    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }

    /// Return the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn next_chunk(&mut self) -> Result<bool> {
        let len = match self.read_prefix()? {
            Prefix::Eof => return Ok(false),
            Prefix::Len(len) => len,
        };

        let len = match usize::try_from(len) {
            Ok(n) if n <= self.config.max_chunk_len => n,
            _ => {
                return Err(Error::ChunkTooLarge {
                    len,
                    max: self.config.max_chunk_len,
                })
            }
        };

        // Grow with the data actually read, not with the declared length
        self.buf.clear();
        let read = (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut self.buf)?;
        if read < len {
            return Err(Error::Truncated);
        }
        Ok(true)
    }

    /// Read the varint length one byte at a time; wrap the reader in a
    /// `BufReader` when it is unbuffered
    fn read_prefix(&mut self) -> Result<Prefix> {
        let mut prefix = [0u8; MAX_VARINT_U64_SIZE];
        let mut pos = 0;

        loop {
            let mut byte = [0u8; 1];
            if read_some(&mut self.reader, &mut byte)? == 0 {
                return if pos == 0 {
                    Ok(Prefix::Eof)
                } else {
                    Err(Error::Truncated)
                };
            }

            prefix[pos] = byte[0];
            pos += 1;

            if byte[0] & 0x80 == 0 || pos == MAX_VARINT_U64_SIZE {
                let (len, _) = varint::decode_u64(&prefix[..pos])?;
                return Ok(Prefix::Len(len));
            }
        }
    }
}

#[inline]
fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
}

/// Writes chunks, each prefixed with its varint length
pub struct ChunkWriter<W> {
    writer: W,
    frame: Vec<u8>,
    chunks_written: u64,
}

impl<W: Write> ChunkWriter<W> {
    /// Chunk writer over `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frame: Vec::new(),
            chunks_written: 0,
        }
    }

    /// Write one chunk. Returns the bytes put on the wire, prefix included.
    ///
    /// Prefix and payload are handed to the sink in a single `write_all`.
    /// A sink that fails part way through may still have taken some of the
    /// chunk; the stream is not usable past a failed write.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize> {
        self.frame.clear();
        self.frame
            .reserve(varint::encoded_len(payload.len() as u64) + payload.len());
        varint::encode_u64_vec(payload.len() as u64, &mut self.frame);
        self.frame.extend_from_slice(payload);

        self.writer.write_all(&self.frame)?;
        self.chunks_written += 1;

        trace!(len = payload.len(), index = self.chunks_written, "chunk written");
        Ok(self.frame.len())
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of chunks written so far
    #[inline]
    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }

    /// Borrow the underlying writer
    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Mutably borrow the underlying writer
    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}
