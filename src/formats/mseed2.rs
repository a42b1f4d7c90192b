//! Mini-SEED 2 record format.
//!
//! Record length comes from blockette 1000. Records without one can still
//! be framed when the next record's header is visible inside the probe
//! window.

use super::{Probe, RecordFormat, MIN_RECORD_LEN};
use crate::error::{MseedError, Result};
use crate::parsing::blockette::{find_blockette_1000, ChainScan};
use crate::parsing::fixed_header::{
    is_data_indicator, is_valid_header_prefix, BTime, ByteOrder, FixedHeaderParser,
    QUALITY_OFFSET,
};
use crate::record::{DecodedRecord, RecordDecoder};

/// Mini-SEED 2 framing rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiniSeed2;

impl MiniSeed2 {
    /// Look for a header at power-of-two offsets inside the window.
    fn next_header_length(buffer: &[u8]) -> Option<usize> {
        let mut len = MIN_RECORD_LEN;
        while len + FixedHeaderParser::HEADER_SIZE <= buffer.len() {
            if is_valid_header_prefix(&buffer[len..len + FixedHeaderParser::HEADER_SIZE]) {
                return Some(len);
            }
            len *= 2;
        }
        None
    }
}

impl RecordFormat for MiniSeed2 {
    fn probe_length(&self, buffer: &[u8]) -> Probe {
        if !is_valid_header_prefix(buffer) {
            return Probe::NotRecord;
        }
        if buffer.len() < FixedHeaderParser::HEADER_SIZE {
            return Probe::NeedMore;
        }

        let order = ByteOrder::detect(buffer);
        let first = order.u16(&buffer[46..48]);

        match find_blockette_1000(buffer, order, first) {
            ChainScan::Found(b1000) => Probe::Length(b1000.record_length()),
            ChainScan::Truncated => Probe::NeedMore,
            ChainScan::Absent => match Self::next_header_length(buffer) {
                Some(len) => Probe::Length(len),
                None => Probe::NeedMore,
            },
        }
    }

    fn is_data_record(&self, record: &[u8]) -> bool {
        record
            .get(QUALITY_OFFSET)
            .is_some_and(|b| is_data_indicator(*b))
    }
}

/// Header level view of a decoded record.
#[derive(Debug, Clone, PartialEq)]
pub struct MseedRecord {
    pub sequence_number: String,
    pub quality: u8,
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    pub start: BTime,
    pub sample_count: u32,
    pub sample_rate: f64,
    /// Data encoding from blockette 1000, if present.
    pub encoding: Option<u8>,
    pub byte_order: ByteOrder,
    /// Record length declared by the record, 0 when it declares none.
    pub record_length: usize,
    pub data_offset: usize,
    /// Raw data section, only kept when unpacking was requested.
    pub payload: Option<Vec<u8>>,
}

impl MseedRecord {
    /// `NET_STA_LOC_CHAN`
    pub fn source_name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.network, self.station, self.location, self.channel
        )
    }
}

impl DecodedRecord for MseedRecord {
    fn record_length(&self) -> usize {
        self.record_length
    }

    fn set_record_length(&mut self, length: usize) {
        self.record_length = length;
    }
}

/// Decodes the fixed header and blockette 1000 of Mini-SEED 2 records.
///
/// Sample decompression is not done here; with unpacking requested the
/// raw data section is attached instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiniSeed2Decoder;

impl RecordDecoder for MiniSeed2Decoder {
    type Output = MseedRecord;

    fn decode(&mut self, raw: &[u8], unpack_data: bool) -> Result<MseedRecord> {
        let header = FixedHeaderParser::parse(raw)?;

        let b1000 = match find_blockette_1000(raw, header.byte_order, header.blockette_offset) {
            ChainScan::Found(b) => Some(b),
            ChainScan::Truncated => {
                return Err(MseedError::InvalidHeader(
                    "blockette chain runs past the end of the record".into(),
                ))
            }
            ChainScan::Absent => None,
        };

        let data_offset = usize::from(header.data_offset);
        let payload = if unpack_data && header.sample_count > 0 {
            if data_offset < FixedHeaderParser::HEADER_SIZE || data_offset > raw.len() {
                return Err(MseedError::InvalidHeader(format!(
                    "data offset {} outside record of {} bytes",
                    data_offset,
                    raw.len()
                )));
            }
            Some(raw[data_offset..].to_vec())
        } else {
            None
        };

        Ok(MseedRecord {
            sample_rate: header.sample_rate(),
            sequence_number: header.sequence_number,
            quality: header.quality,
            network: header.network,
            station: header.station,
            location: header.location,
            channel: header.channel,
            start: header.start,
            sample_count: u32::from(header.sample_count),
            encoding: b1000.map(|b| b.encoding),
            byte_order: header.byte_order,
            record_length: b1000.map_or(0, |b| b.record_length()),
            data_offset,
            payload,
        })
    }
}
