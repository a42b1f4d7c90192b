//! Fixed section of data header parser.
//!
//! Every data record starts with a 48 byte fixed header:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0  | 6 | Sequence number (ASCII) |
//! | 6  | 1 | Data quality indicator (`D`, `R`, `Q`, `M`) |
//! | 7  | 1 | Reserved (space) |
//! | 8  | 5 | Station |
//! | 13 | 2 | Location |
//! | 15 | 3 | Channel |
//! | 18 | 2 | Network |
//! | 20 | 10 | Start time (BTIME) |
//! | 30 | 2 | Number of samples |
//! | 32 | 2 | Sample rate factor |
//! | 34 | 2 | Sample rate multiplier |
//! | 36 | 3 | Activity, I/O and data quality flags |
//! | 39 | 1 | Number of blockettes that follow |
//! | 40 | 4 | Time correction |
//! | 44 | 2 | Beginning of data |
//! | 46 | 2 | First blockette offset |
//!
//! Binary fields may be in either byte order; the start time year is used
//! to tell which.

use crate::error::{MseedError, Result};

/// Offset of the data quality indicator, also the record type marker.
pub const QUALITY_OFFSET: usize = 6;

/// True for the record type markers of data records.
pub fn is_data_indicator(byte: u8) -> bool {
    matches!(byte, b'D' | b'R' | b'Q' | b'M')
}

/// Byte order of the binary header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// Guess from the start time year, big endian unless only little
    /// endian gives a sane year.
    pub fn detect(header: &[u8]) -> Self {
        let be = u16::from_be_bytes([header[20], header[21]]);
        let le = u16::from_le_bytes([header[20], header[21]]);
        if !(1900..=2100).contains(&be) && (1900..=2100).contains(&le) {
            Self::Little
        } else {
            Self::Big
        }
    }

    #[inline]
    pub fn u16(self, bytes: &[u8]) -> u16 {
        match self {
            Self::Big => u16::from_be_bytes([bytes[0], bytes[1]]),
            Self::Little => u16::from_le_bytes([bytes[0], bytes[1]]),
        }
    }

    #[inline]
    pub fn i16(self, bytes: &[u8]) -> i16 {
        self.u16(bytes) as i16
    }

    #[inline]
    pub fn i32(self, bytes: &[u8]) -> i32 {
        let b = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            Self::Big => i32::from_be_bytes(b),
            Self::Little => i32::from_le_bytes(b),
        }
    }
}

/// Check the fields that identify a data header.
///
/// Accepts a truncated buffer: only the bytes present are checked, so a
/// short prefix of a valid header passes.
pub fn is_valid_header_prefix(buffer: &[u8]) -> bool {
    for (i, &b) in buffer.iter().take(27).enumerate() {
        let ok = match i {
            0..=5 => b.is_ascii_digit() || b == b' ' || b == 0,
            QUALITY_OFFSET => is_data_indicator(b),
            7 => b == b' ' || b == 0,
            24 => b <= 23,
            25 => b <= 59,
            26 => b <= 60,
            _ => true,
        };
        if !ok {
            return false;
        }
    }
    true
}

/// Start time as stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BTime {
    pub year: u16,
    pub day: u16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Ten-thousandths of a second.
    pub fract: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedHeader {
    pub sequence_number: String,
    pub quality: u8,
    pub station: String,
    pub location: String,
    pub channel: String,
    pub network: String,
    pub start: BTime,
    pub sample_count: u16,
    pub sample_rate_factor: i16,
    pub sample_rate_multiplier: i16,
    pub activity_flags: u8,
    pub io_flags: u8,
    pub quality_flags: u8,
    pub blockette_count: u8,
    pub time_correction: i32,
    pub data_offset: u16,
    pub blockette_offset: u16,
    pub byte_order: ByteOrder,
}

impl FixedHeader {
    /// Nominal sample rate in Hz from factor and multiplier.
    pub fn sample_rate(&self) -> f64 {
        let factor = f64::from(self.sample_rate_factor);
        let multiplier = f64::from(self.sample_rate_multiplier);

        let mut rate = if self.sample_rate_factor > 0 {
            factor
        } else if self.sample_rate_factor < 0 {
            -1.0 / factor
        } else {
            return 0.0;
        };

        if self.sample_rate_multiplier > 0 {
            rate *= multiplier;
        } else if self.sample_rate_multiplier < 0 {
            rate = -(rate / multiplier);
        }
        rate
    }
}

fn ascii_field(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c == ' ' || c == '\0')
        .to_string()
}

pub struct FixedHeaderParser;

impl FixedHeaderParser {
    pub const HEADER_SIZE: usize = 48;

    pub fn parse(buffer: &[u8]) -> Result<FixedHeader> {
        if buffer.len() < Self::HEADER_SIZE {
            return Err(MseedError::BufferTooSmall {
                needed: Self::HEADER_SIZE,
                have: buffer.len(),
            });
        }

        if !is_valid_header_prefix(buffer) {
            return Err(MseedError::InvalidHeader(format!(
                "not a data record header (indicator {:?})",
                char::from(buffer[QUALITY_OFFSET])
            )));
        }

        let order = ByteOrder::detect(buffer);

        Ok(FixedHeader {
            sequence_number: ascii_field(&buffer[0..6]),
            quality: buffer[QUALITY_OFFSET],
            station: ascii_field(&buffer[8..13]),
            location: ascii_field(&buffer[13..15]),
            channel: ascii_field(&buffer[15..18]),
            network: ascii_field(&buffer[18..20]),
            start: BTime {
                year: order.u16(&buffer[20..22]),
                day: order.u16(&buffer[22..24]),
                hour: buffer[24],
                minute: buffer[25],
                second: buffer[26],
                fract: order.u16(&buffer[28..30]),
            },
            sample_count: order.u16(&buffer[30..32]),
            sample_rate_factor: order.i16(&buffer[32..34]),
            sample_rate_multiplier: order.i16(&buffer[34..36]),
            activity_flags: buffer[36],
            io_flags: buffer[37],
            quality_flags: buffer[38],
            blockette_count: buffer[39],
            time_correction: order.i32(&buffer[40..44]),
            data_offset: order.u16(&buffer[44..46]),
            blockette_offset: order.u16(&buffer[46..48]),
            byte_order: order,
        })
    }
}
