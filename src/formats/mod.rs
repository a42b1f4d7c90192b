//! Record format seam: length detection and record type checks.
//!
//! The reader never interprets record contents itself. It asks a
//! [`RecordFormat`] two questions: how long is the record starting here,
//! and is this fixed-length chunk a data record. [`mseed2::MiniSeed2`] is
//! the built-in implementation.

pub mod mseed2;

pub use mseed2::{MiniSeed2, MiniSeed2Decoder, MseedRecord};

/// Smallest record length accepted from detection.
pub const MIN_RECORD_LEN: usize = 128;

/// Largest record length accepted from detection, also the probe ceiling.
pub const MAX_RECORD_LEN: usize = 8192;

/// Largest record length a caller may force.
pub const MAX_FIXED_RECORD_LEN: usize = 1 << 20;

/// Answer of a format when asked for the length of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The buffer starts a record of this many bytes.
    Length(usize),
    /// The buffer cannot start a record.
    NotRecord,
    /// The buffer may start a record, but more bytes are needed.
    NeedMore,
}

/// Format specific knowledge used for record framing.
pub trait RecordFormat {
    /// Inspect the start of a candidate record.
    ///
    /// `buffer` holds every byte probed so far, starting at the candidate's
    /// first byte. It may be shorter than the record.
    fn probe_length(&self, buffer: &[u8]) -> Probe;

    /// True if a fixed-length chunk carries a data record type marker.
    fn is_data_record(&self, record: &[u8]) -> bool;
}

impl<F: RecordFormat + ?Sized> RecordFormat for &F {
    fn probe_length(&self, buffer: &[u8]) -> Probe {
        (**self).probe_length(buffer)
    }

    fn is_data_record(&self, record: &[u8]) -> bool {
        (**self).is_data_record(record)
    }
}
