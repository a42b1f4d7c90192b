//! Framed and decoded records.

use crate::error::Result;

/// One framed record, borrowed from the reader's buffer.
///
/// Only valid until the next read on the same reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub data: &'a [u8],
    /// Stream offset of the record's first byte.
    pub offset: u64,
    /// True when no bytes follow this record.
    pub is_last: bool,
}

impl RawRecord<'_> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A decoded record together with its framing information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<T> {
    pub record: T,
    pub offset: u64,
    pub is_last: bool,
}

/// What the reader needs to know about a decoder's output.
pub trait DecodedRecord {
    /// Record length declared by the record itself, 0 if unknown.
    fn record_length(&self) -> usize;

    fn set_record_length(&mut self, length: usize);
}

/// Turns framed record bytes into a structured record.
pub trait RecordDecoder {
    type Output: DecodedRecord;

    fn decode(&mut self, raw: &[u8], unpack_data: bool) -> Result<Self::Output>;
}

impl<D: RecordDecoder + ?Sized> RecordDecoder for &mut D {
    type Output = D::Output;

    fn decode(&mut self, raw: &[u8], unpack_data: bool) -> Result<Self::Output> {
        (**self).decode(raw, unpack_data)
    }
}
