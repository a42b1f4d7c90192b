//! Sequential record reader.
//!
//! [`RecordReader`] is a cursor over one byte stream. Each call hands back
//! the next record in stream order:
//!
//! ```text
//! read_raw / next_record
//!       ↓
//! ┌─────────────────┐   first record (Detect) or every record (DetectEach)
//! │ LengthDetector  │ ← doubling probe, packed header, skip resync
//! └─────────────────┘
//!       ↓ otherwise
//! ┌─────────────────┐
//! │ fixed-length    │ ← read exactly record_length bytes, optional skip
//! └─────────────────┘
//!       ↓
//! ┌─────────────────┐
//! │ PackedSource    │ ← container groups consumed at predicted offsets
//! └─────────────────┘
//! ```
//!
//! Any error closes the reader: the source is dropped and the buffer
//! released. End of stream is `Ok(None)`, and stays so.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mseed_stream::{MiniSeed2Decoder, ReadOptions, RecordReader};
//!
//! let mut reader = RecordReader::open("data.mseed", ReadOptions::default())?;
//! for record in reader.records(MiniSeed2Decoder) {
//!     let record = record?;
//!     println!("{:>10} {}", record.offset, record.record.source_name());
//! }
//! reader.close();
//! # Ok::<(), mseed_stream::MseedError>(())
//! ```

use crate::buffer::RecordBuffer;
use crate::byte_source::{ByteSource, DynRead};
use crate::detect::LengthDetector;
use crate::envelope::PackedSource;
use crate::error::{MseedError, Result};
use crate::formats::{MiniSeed2, RecordFormat, MAX_FIXED_RECORD_LEN};
use crate::options::{LengthMode, ReadOptions};
use crate::record::{DecodedRecord, RawRecord, Record, RecordDecoder};
use std::io::Read;

/// Counters for the non-fatal events of a reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Records handed out.
    pub records: u64,
    /// Fixed-length chunks dropped for lacking a data record marker.
    pub skipped_records: u64,
    /// Bytes dropped while resynchronising during detection.
    pub skipped_bytes: u64,
    /// Records whose declared length differed from the framed length.
    pub length_mismatches: u64,
    /// Packed container groups seen, the first one included.
    pub envelope_groups: u64,
}

/// Where the record just framed sits in the buffer and the stream.
#[derive(Debug, Clone, Copy)]
struct Framed {
    offset: u64,
    is_last: bool,
}

/// Cursor over the records of one byte stream.
pub struct RecordReader<R, F = MiniSeed2> {
    stream: Option<PackedSource<R>>,
    name: String,
    format: F,
    options: ReadOptions,
    record_length: Option<usize>,
    detector: LengthDetector,
    buffer: RecordBuffer,
    stats: ReaderStats,
    last_offset: u64,
}

impl RecordReader<DynRead> {
    /// Open a file, or standard input for `"-"`.
    pub fn open(identity: &str, options: ReadOptions) -> Result<Self> {
        Self::open_with_format(identity, MiniSeed2, options)
    }
}

impl<F: RecordFormat> RecordReader<DynRead, F> {
    pub fn open_with_format(identity: &str, format: F, options: ReadOptions) -> Result<Self> {
        let source = ByteSource::open(identity)?;
        Ok(Self::from_source(source, format, options))
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R, options: ReadOptions) -> Self {
        Self::with_format(inner, MiniSeed2, options)
    }
}

#[cfg(feature = "async")]
impl RecordReader<std::io::Cursor<Vec<u8>>> {
    /// Read a whole file with tokio and serve its records from memory.
    pub async fn open_async(
        path: impl AsRef<std::path::Path>,
        options: ReadOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let identity = path.display().to_string();
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| MseedError::Open {
                identity: identity.clone(),
                source,
            })?;
        let source = ByteSource::new(std::io::Cursor::new(data), &identity);
        Ok(Self::from_source(source, MiniSeed2, options))
    }
}

impl<R: Read, F: RecordFormat> RecordReader<R, F> {
    pub fn with_format(inner: R, format: F, options: ReadOptions) -> Self {
        Self::from_source(ByteSource::new(inner, "stream"), format, options)
    }

    pub fn from_source(source: ByteSource<R>, format: F, options: ReadOptions) -> Self {
        let (record_length, buffer) = match options.length {
            LengthMode::Fixed(length) => (
                Some(length),
                RecordBuffer::with_capacity(length.min(MAX_FIXED_RECORD_LEN)),
            ),
            _ => (None, RecordBuffer::new()),
        };

        Self {
            name: source.name().to_string(),
            stream: Some(PackedSource::new(source)),
            format,
            options,
            record_length,
            detector: LengthDetector::new(),
            buffer,
            stats: ReaderStats::default(),
            last_offset: 0,
        }
    }

    /// Name of the source this reader was created for.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Update the per-call flags; the length mode is fixed at creation.
    pub(crate) fn set_flags(&mut self, skip_non_data: bool, unpack_data: bool) {
        self.options.skip_non_data = skip_non_data;
        self.options.unpack_data = unpack_data;
    }

    /// Record length in use, once known.
    pub fn record_length(&self) -> Option<usize> {
        self.record_length
    }

    /// Stream offset of the last record handed out.
    pub fn offset(&self) -> u64 {
        self.last_offset
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// True while the source is held.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Frame the next record.
    ///
    /// The returned bytes live in the reader's buffer and are replaced by
    /// the next call.
    pub fn read_raw(&mut self) -> Result<Option<RawRecord<'_>>> {
        match self.advance() {
            Ok(Some(framed)) => Ok(Some(RawRecord {
                data: self.buffer.delivered(),
                offset: framed.offset,
                is_last: framed.is_last,
            })),
            Ok(None) => {
                self.finish();
                Ok(None)
            }
            Err(e) => {
                log::debug!("Closing {} after error: {}", self.name, e);
                self.close();
                Err(e)
            }
        }
    }

    /// Frame and decode the next record.
    ///
    /// A decoder that reports no record length gets the framed length
    /// filled in. A different non-zero length is logged and counted, and
    /// the record is still returned.
    pub fn next_record<D: RecordDecoder>(
        &mut self,
        decoder: &mut D,
    ) -> Result<Option<Record<D::Output>>> {
        let unpack = self.options.unpack_data;

        let (offset, is_last, length, decoded) = match self.read_raw()? {
            Some(raw) => (
                raw.offset,
                raw.is_last,
                raw.len(),
                decoder.decode(raw.data, unpack),
            ),
            None => return Ok(None),
        };

        let mut record = match decoded {
            Ok(record) => record,
            Err(e) => {
                self.close();
                return Err(match e {
                    MseedError::InvalidHeader(reason) => MseedError::Decode { offset, reason },
                    other => other,
                });
            }
        };

        match record.record_length() {
            0 => record.set_record_length(length),
            declared if declared != length => {
                log::warn!(
                    "Detected record length ({}) != read length ({}) at offset {}",
                    declared,
                    length,
                    offset
                );
                self.stats.length_mismatches += 1;
            }
            _ => {}
        }

        Ok(Some(Record {
            record,
            offset,
            is_last,
        }))
    }

    /// Iterate decoded records. Iteration stops after the first error.
    pub fn records<D: RecordDecoder>(&mut self, decoder: D) -> Records<'_, R, F, D> {
        Records {
            reader: self,
            decoder,
        }
    }

    /// Release the source and buffer and return to the initial state.
    ///
    /// Safe to call any number of times.
    pub fn close(&mut self) {
        self.finish();
        self.record_length = match self.options.length {
            LengthMode::Fixed(length) => Some(length),
            _ => None,
        };
        self.detector.reset();
        self.last_offset = 0;
    }

    fn finish(&mut self) {
        self.stream = None;
        self.buffer.release();
    }

    fn advance(&mut self) -> Result<Option<Framed>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        self.buffer.release_delivered();

        self.options.length.validate()?;

        let skip = self.options.skip_non_data;
        let length = match (self.options.length, self.record_length) {
            (LengthMode::Fixed(length), _) | (LengthMode::Detect, Some(length)) => fill_fixed(
                stream,
                &mut self.buffer,
                length,
                &self.format,
                skip,
                &mut self.stats,
            )?,
            (LengthMode::Detect, None) | (LengthMode::DetectEach, _) => self.detector.detect(
                stream,
                &mut self.buffer,
                &self.format,
                skip,
                &mut self.stats,
            )?,
        };
        self.stats.envelope_groups = stream.pack().map_or(0, |pack| pack.groups());

        let Some(length) = length else {
            return Ok(None);
        };

        if self.options.length == LengthMode::Detect && self.record_length.is_none() {
            log::debug!("Detected record length of {} bytes", length);
            self.record_length = Some(length);
        }

        self.buffer.mark_delivered(length);
        let offset = self.buffer.window_offset();
        let is_last = self.buffer.window_len() == length && stream.at_eof()?;

        self.last_offset = offset;
        self.stats.records += 1;
        Ok(Some(Framed { offset, is_last }))
    }
}

/// Fill the window with one `length` byte record, dropping chunks that do
/// not carry a data record marker when `skip` is set.
fn fill_fixed<R: Read, F: RecordFormat>(
    stream: &mut PackedSource<R>,
    buffer: &mut RecordBuffer,
    length: usize,
    format: &F,
    skip: bool,
    stats: &mut ReaderStats,
) -> Result<Option<usize>> {
    loop {
        let want = length.saturating_sub(buffer.window_len());
        if stream.fill(buffer, want)? < want {
            let offset = buffer.window_offset();
            let got = buffer.window_len();
            if got == 0 {
                return Ok(None);
            }
            if skip && !format.is_data_record(buffer.window()) {
                log::warn!(
                    "Discarding {} trailing non-data bytes at byte offset {}",
                    got,
                    offset
                );
                stats.skipped_bytes += got as u64;
                buffer.clear();
                return Ok(None);
            }
            return Err(MseedError::ShortRead {
                offset,
                needed: length,
                got,
            });
        }

        if skip && !format.is_data_record(&buffer.window()[..length]) {
            log::trace!(
                "Skipped non-data record at byte offset {}",
                buffer.window_offset()
            );
            stats.skipped_records += 1;
            buffer.consume(length);
            continue;
        }

        return Ok(Some(length));
    }
}

/// Iterator over decoded records, see [`RecordReader::records`].
pub struct Records<'a, R, F, D> {
    reader: &'a mut RecordReader<R, F>,
    decoder: D,
}

impl<R: Read, F: RecordFormat, D: RecordDecoder> Iterator for Records<'_, R, F, D> {
    type Item = Result<Record<D::Output>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record(&mut self.decoder).transpose()
    }
}
