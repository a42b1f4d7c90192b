//! Packed container header parser.
//!
//! Some archives wrap the record stream in an older "packed" container:
//!
//! ```text
//!   ID    INFO     DATA    CHKSUM    INFO     DATA    CHKSUM
//! |----|--------|--....--|--------|--------|--....--|--------| ...
//!
//!      |_________ repeats ________|
//! ```
//!
//! The 10 byte identifier starts with a 3 byte tag naming the variant.
//! Each INFO section is fixed width ASCII and ends with an 8 byte decimal
//! field giving the size of the DATA section that follows.

use crate::error::{MseedError, Result};

/// Length of the container identifier at the start of the file.
pub const PACK_ID_LEN: usize = 10;

/// Length of the checksum that follows every data section.
pub const PACK_CHECKSUM_LEN: usize = 8;

/// Length of the ASCII size field at the end of every info section.
pub const PACK_SIZE_FIELD_LEN: usize = 8;

/// Known packed container variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackKind {
    Ped,
    Psd,
    Plc,
    Pqi,
}

impl PackKind {
    pub const PED: &[u8; 3] = b"PED";
    pub const PSD: &[u8; 3] = b"PSD";
    pub const PLC: &[u8; 3] = b"PLC";
    pub const PQI: &[u8; 3] = b"PQI";

    /// Width of the info section for this variant.
    pub fn info_len(&self) -> usize {
        match self {
            Self::Ped => 8,
            Self::Psd => 11,
            Self::Plc => 13,
            Self::Pqi => 15,
        }
    }

    /// Legacy numeric pack type.
    pub fn type_code(&self) -> u8 {
        match self {
            Self::Ped => 1,
            Self::Psd => 2,
            Self::Plc => 6,
            Self::Pqi => 7,
        }
    }

    pub fn tag(&self) -> &'static [u8; 3] {
        match self {
            Self::Ped => Self::PED,
            Self::Psd => Self::PSD,
            Self::Plc => Self::PLC,
            Self::Pqi => Self::PQI,
        }
    }

    pub fn from_signature(data: &[u8]) -> Option<Self> {
        if data.starts_with(Self::PED) {
            Some(Self::Ped)
        } else if data.starts_with(Self::PSD) {
            Some(Self::Psd)
        } else if data.starts_with(Self::PLC) {
            Some(Self::Plc)
        } else if data.starts_with(Self::PQI) {
            Some(Self::Pqi)
        } else {
            None
        }
    }

    /// Bytes taken by the identifier plus the first info section.
    pub fn first_header_len(&self) -> usize {
        PACK_ID_LEN + self.info_len()
    }
}

/// The leading identifier and first info section of a packed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackHeader {
    pub kind: PackKind,
    /// Size of the first data section.
    pub data_size: u64,
}

pub struct PackHeaderParser;

impl PackHeaderParser {
    /// Parse the identifier and first info section at the start of a file.
    pub fn parse(buffer: &[u8]) -> Result<PackHeader> {
        let kind = PackKind::from_signature(buffer)
            .ok_or_else(|| MseedError::InvalidHeader("unknown packed file signature".into()))?;

        let needed = kind.first_header_len();
        if buffer.len() < needed {
            return Err(MseedError::BufferTooSmall {
                needed,
                have: buffer.len(),
            });
        }

        let data_size = Self::parse_data_size(&buffer[PACK_ID_LEN..needed])?;
        Ok(PackHeader { kind, data_size })
    }

    /// Parse the data size from the trailing field of an info section.
    ///
    /// The field is right aligned ASCII decimal, padded with spaces.
    pub fn parse_data_size(info: &[u8]) -> Result<u64> {
        if info.len() < PACK_SIZE_FIELD_LEN {
            return Err(MseedError::BufferTooSmall {
                needed: PACK_SIZE_FIELD_LEN,
                have: info.len(),
            });
        }

        let field = &info[info.len() - PACK_SIZE_FIELD_LEN..];
        let digits: Vec<u8> = field
            .iter()
            .copied()
            .skip_while(|b| *b == b' ')
            .take_while(u8::is_ascii_digit)
            .collect();

        if digits.is_empty() {
            return Err(MseedError::InvalidHeader(format!(
                "packed data size field is not numeric: {:?}",
                String::from_utf8_lossy(field)
            )));
        }

        // At most 8 digits, always fits.
        Ok(digits
            .iter()
            .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0')))
    }
}
