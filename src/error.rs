//! Error types for record framing and reading.
//!
//! This module provides the [`MseedError`] type which covers every fatal
//! condition met while locating, reading or decoding records.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Source | [`Open`], [`Io`] | The byte source could not be opened or read |
//! | Framing | [`ShortRead`], [`PackInfo`] | Input ended mid-record or mid-envelope |
//! | Detection | [`LengthUndetected`], [`LengthOutOfRange`] | No usable record length |
//! | Records | [`InvalidHeader`], [`Decode`] | Record bytes rejected by a parser |
//!
//! End of stream is not an error: readers return `Ok(None)` for it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mseed_stream::{MseedError, RecordReader};
//!
//! match reader.read_raw() {
//!     Ok(Some(raw)) => println!("record at {}", raw.offset),
//!     Ok(None) => println!("end of stream"),
//!     Err(MseedError::LengthUndetected { offset, .. }) => eprintln!("not SEED at {offset}"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```
//!
//! [`Open`]: MseedError::Open
//! [`Io`]: MseedError::Io
//! [`ShortRead`]: MseedError::ShortRead
//! [`PackInfo`]: MseedError::PackInfo
//! [`LengthUndetected`]: MseedError::LengthUndetected
//! [`LengthOutOfRange`]: MseedError::LengthOutOfRange
//! [`InvalidHeader`]: MseedError::InvalidHeader
//! [`Decode`]: MseedError::Decode

use std::fmt;
use std::io;

/// Error type for record reading operations.
///
/// Every variant is fatal for the read that produced it. Readers release
/// their byte source and buffer before handing one of these back.
#[derive(Debug)]
pub enum MseedError {
    /// The byte source named by `identity` could not be opened.
    Open {
        identity: String,
        source: io::Error,
    },

    /// An I/O error occurred while reading an open source.
    Io(io::Error),

    /// The stream ended part way through a record.
    ///
    /// Either this is a partial record or the input is not record data.
    ShortRead {
        /// Stream offset of the first byte of the incomplete record.
        offset: u64,
        /// Number of bytes the record needed.
        needed: usize,
        /// Number of bytes actually available.
        got: usize,
    },

    /// No record length could be confirmed within the probe ceiling.
    LengthUndetected {
        /// Stream offset where detection started.
        offset: u64,
        /// Number of bytes probed when detection gave up.
        probed: usize,
    },

    /// A record length was found but lies outside the valid bounds.
    LengthOutOfRange {
        offset: u64,
        length: usize,
    },

    /// A packed container group could not be read or its size parsed.
    PackInfo {
        offset: u64,
        reason: String,
    },

    /// A fixed header or blockette is malformed.
    InvalidHeader(String),

    /// The record decoder rejected the framed bytes.
    Decode {
        offset: u64,
        reason: String,
    },

    /// The provided buffer is too small.
    BufferTooSmall {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        have: usize,
    },

    /// A requested record length that cannot be used.
    InvalidLength(i64),
}

impl fmt::Display for MseedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { identity, source } => {
                write!(f, "Error opening {}: {}", identity, source)
            }
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::ShortRead { offset, needed, got } => write!(
                f,
                "Premature end of input at offset {}: only read {} of {} bytes",
                offset, got, needed
            ),
            Self::LengthUndetected { offset, probed } => write!(
                f,
                "Cannot detect record length at offset {} (probed {} bytes)",
                offset, probed
            ),
            Self::LengthOutOfRange { offset, length } => write!(
                f,
                "Detected record length is out of range at offset {}: {}",
                offset, length
            ),
            Self::PackInfo { offset, reason } => {
                write!(f, "Invalid packed file info at offset {}: {}", offset, reason)
            }
            Self::InvalidHeader(reason) => write!(f, "Invalid header: {}", reason),
            Self::Decode { offset, reason } => {
                write!(f, "Cannot decode record at offset {}: {}", offset, reason)
            }
            Self::BufferTooSmall { needed, have } => {
                write!(f, "Buffer too small: need {} bytes, have {}", needed, have)
            }
            Self::InvalidLength(len) => write!(f, "Invalid record length: {}", len),
        }
    }
}

impl std::error::Error for MseedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MseedError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, MseedError>;
