//! Error types for keyed record streams

use alloc::string::String;
use core::fmt;

/// Broad error classes, used to decide whether a scan can continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed varint or a length that does not fit the available bytes.
    /// The stream is unreliable past this point.
    Framing,
    /// The value marshaler rejected a payload. Local to one record.
    Decode,
    /// Record accessed in the wrong scanner state
    State,
    /// Underlying reader or writer failed
    Io,
}

/// Errors that can occur while framing, splitting or (un)marshaling records
#[derive(Debug)]
pub enum Error {
    /// Buffer too small for the operation
    ShortBuffer,
    /// Unexpected end of data inside a varint
    UnexpectedEof,
    /// Varint does not fit in 64 bits
    Overflow,
    /// Declared key length runs past the end of the chunk payload
    KeyOverrun {
        /// Key length read from the inner varint prefix
        declared: u64,
        /// Bytes left after the prefix
        available: usize,
    },
    /// Stream ended in the middle of a chunk
    Truncated,
    /// Declared chunk length exceeds the configured maximum
    ChunkTooLarge {
        /// Length read from the outer varint prefix
        len: u64,
        /// Configured limit
        max: usize,
    },
    /// Value bytes are not a valid encoding for the bound value type
    Decode(String),
    /// Value could not be serialized
    Encode(String),
    /// Key is not valid UTF-8
    InvalidUtf8,
    /// No current record: `advance()` has not succeeded, or the scan is over
    NoRecord,
    /// I/O error from the underlying stream, passed through untouched
    #[cfg(feature = "std")]
    Io(std::io::Error),
}

impl Error {
    /// Returns the class this error belongs to
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::ShortBuffer
            | Error::UnexpectedEof
            | Error::Overflow
            | Error::KeyOverrun { .. }
            | Error::Truncated
            | Error::ChunkTooLarge { .. } => ErrorClass::Framing,
            Error::Decode(_) | Error::Encode(_) | Error::InvalidUtf8 => ErrorClass::Decode,
            Error::NoRecord => ErrorClass::State,
            #[cfg(feature = "std")]
            Error::Io(_) => ErrorClass::Io,
        }
    }

    /// True for malformed framing (varint or length errors)
    #[inline]
    pub fn is_framing(&self) -> bool {
        self.class() == ErrorClass::Framing
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ShortBuffer => f.write_str("buffer too small for operation"),
            Error::UnexpectedEof => f.write_str("unexpected end of data in varint"),
            Error::Overflow => f.write_str("varint overflows 64 bits"),
            Error::KeyOverrun {
                declared,
                available,
            } => write!(
                f,
                "declared key length {declared} exceeds {available} available bytes"
            ),
            Error::Truncated => f.write_str("stream ended inside a chunk"),
            Error::ChunkTooLarge { len, max } => {
                write!(f, "chunk length {len} exceeds maximum {max}")
            }
            Error::Decode(msg) => write!(f, "value decode failed: {msg}"),
            Error::Encode(msg) => write!(f, "value encode failed: {msg}"),
            Error::InvalidUtf8 => f.write_str("key is not valid UTF-8"),
            Error::NoRecord => f.write_str("no current record"),
            #[cfg(feature = "std")]
            Error::Io(err) => write!(f, "io: {err}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Result type alias for keyrec operations
pub type Result<T> = core::result::Result<T, Error>;
