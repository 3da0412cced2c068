//! Keyed record scanner

use std::io::Read;

use tracing::debug;

use crate::chunk::{ChunkScanner, ScanConfig};
use crate::codec::KeyedRecordCodec;
use crate::error::{Error, Result};
use crate::record::KeyedRecord;

/// Reads keyed records from a stream of length-prefixed chunks
///
/// Each successful `advance()` copies the chunk into a buffer owned by the
/// current record, so records stay valid while the scanner reuses its read
/// buffer. Records are decoded lazily with the scanner's codec.
///
/// ```
/// use keyrec::{KeyedCodec, KeyedRecordScanner};
///
/// let stream = [0x04, 0x01, b'k', b'v', b'1'];
/// let mut scanner = KeyedRecordScanner::new(&stream[..], KeyedCodec::raw());
///
/// while scanner.advance() {
///     let record = scanner.record()?;
///     assert_eq!(record.key()?, b"k");
///     assert_eq!(record.value()?, b"v1");
/// }
/// assert!(scanner.err().is_none());
/// # Ok::<(), keyrec::Error>(())
/// ```
pub struct KeyedRecordScanner<R, C: KeyedRecordCodec> {
    chunks: ChunkScanner<R>,
    codec: C,
    current: Option<KeyedRecord<C>>,
}

impl<R: Read, C: KeyedRecordCodec> KeyedRecordScanner<R, C> {
    /// Scanner over `reader` decoding records with `codec`
    pub fn new(reader: R, codec: C) -> Self {
        Self::with_config(reader, codec, ScanConfig::default())
    }

    /// Scanner with explicit chunk limits
    pub fn with_config(reader: R, codec: C, config: ScanConfig) -> Self {
        Self {
            chunks: ChunkScanner::with_config(reader, config),
            codec,
            current: None,
        }
    }

    /// Move to the next record
    ///
    /// Returns false at end of input or on the first framing or I/O error;
    /// once false it stays false. Value decode errors do not stop the scan.
    pub fn advance(&mut self) -> bool {
        self.current = None;
        if !self.chunks.advance() {
            return false;
        }

        let wire = self.chunks.chunk().to_vec();
        self.current = Some(KeyedRecord::from_wire(wire, self.codec.clone()));
        true
    }

    /// The current record
    ///
    /// Fails with `Error::NoRecord` before the first successful `advance()`,
    /// after the scan ended, or after the record was taken.
    pub fn record(&mut self) -> Result<&mut KeyedRecord<C>> {
        self.current.as_mut().ok_or(Error::NoRecord)
    }

    /// Move the current record out of the scanner
    pub fn take_record(&mut self) -> Result<KeyedRecord<C>> {
        self.current.take().ok_or(Error::NoRecord)
    }

    /// The first non-EOF error the scan stopped on
    #[inline]
    pub fn err(&self) -> Option<&Error> {
        self.chunks.err()
    }

    /// Number of records read so far
    #[inline]
    pub fn records_read(&self) -> u64 {
        self.chunks.chunks_read()
    }

    /// The codec records are decoded with
    #[inline]
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Iterate over the remaining records
    ///
    /// Yields each record, then the terminal error once if the scan stopped
    /// on one. The error is moved out, so `err()` is empty afterwards.
    pub fn records(&mut self) -> Records<'_, R, C> {
        Records { scanner: self }
    }

    /// Return the underlying reader
    pub fn into_inner(self) -> R {
        self.chunks.into_inner()
    }
}

/// Iterator over the records of a `KeyedRecordScanner`
pub struct Records<'s, R, C: KeyedRecordCodec> {
    scanner: &'s mut KeyedRecordScanner<R, C>,
}

impl<R: Read, C: KeyedRecordCodec> Iterator for Records<'_, R, C> {
    type Item = Result<KeyedRecord<C>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.scanner.advance() {
            return self.scanner.take_record().ok().map(Ok);
        }
        let err = self.scanner.chunks.take_err()?;
        debug!(error = %err, "record iteration stopped on error");
        Some(Err(err))
    }
}
