//! Read options.

use crate::error::{MseedError, Result};
use crate::formats::MAX_FIXED_RECORD_LEN;

/// How record lengths are established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthMode {
    /// Detect the first record's length, expect it for every record after.
    #[default]
    Detect,
    /// Detect the length of every record.
    DetectEach,
    /// Use this length without detection.
    Fixed(usize),
}

impl LengthMode {
    /// Map the signed convention: 0 detects once, negative detects every
    /// record, positive forces the length.
    ///
    /// Forced lengths above [`MAX_FIXED_RECORD_LEN`] are rejected.
    pub fn from_requested(requested: i64) -> Result<Self> {
        match requested {
            0 => Ok(Self::Detect),
            r if r < 0 => Ok(Self::DetectEach),
            r => usize::try_from(r)
                .ok()
                .filter(|len| *len <= MAX_FIXED_RECORD_LEN)
                .map(Self::Fixed)
                .ok_or(MseedError::InvalidLength(requested)),
        }
    }

    /// Check a mode built directly rather than through `from_requested`.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Fixed(len) if len == 0 || len > MAX_FIXED_RECORD_LEN => {
                Err(MseedError::InvalidLength(self.as_requested()))
            }
            _ => Ok(()),
        }
    }

    pub fn as_requested(&self) -> i64 {
        match self {
            Self::Detect => 0,
            Self::DetectEach => -1,
            Self::Fixed(len) => i64::try_from(*len).unwrap_or(i64::MAX),
        }
    }
}

/// Options for reading a record stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadOptions {
    pub length: LengthMode,
    /// Skip chunks that do not carry a data record marker.
    pub skip_non_data: bool,
    /// Ask the decoder for the data payload as well as the header.
    pub unpack_data: bool,
}

impl ReadOptions {
    pub fn new(length: LengthMode) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }

    /// Options from the signed length convention.
    pub fn from_requested(requested: i64) -> Result<Self> {
        LengthMode::from_requested(requested).map(Self::new)
    }

    pub fn skip_non_data(mut self, skip: bool) -> Self {
        self.skip_non_data = skip;
        self
    }

    pub fn unpack_data(mut self, unpack: bool) -> Self {
        self.unpack_data = unpack;
        self
    }
}
