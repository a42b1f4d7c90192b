//! Record length detection.
//!
//! The probe window starts at [`MIN_RECORD_LEN`] bytes and doubles each
//! time the format cannot decide, up to [`MAX_RECORD_LEN`]. Bytes already
//! probed are kept, so each step only reads the new half.

use crate::buffer::RecordBuffer;
use crate::envelope::{PackState, PackedSource};
use crate::error::{MseedError, Result};
use crate::formats::{Probe, RecordFormat, MAX_RECORD_LEN, MIN_RECORD_LEN};
use crate::parsing::pack_header::{PackHeaderParser, PackKind};
use crate::reader::ReaderStats;
use std::io::Read;

/// Doubling probe state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthDetector {
    probe_len: usize,
    exponent: u32,
}

impl Default for LengthDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LengthDetector {
    pub fn new() -> Self {
        Self {
            probe_len: MIN_RECORD_LEN,
            exponent: MIN_RECORD_LEN.trailing_zeros(),
        }
    }

    /// Current probe window size.
    pub fn probe_len(&self) -> usize {
        self.probe_len
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn grow(&mut self) {
        self.exponent += 1;
        self.probe_len = 1 << self.exponent;
    }

    /// Locate the next record and fill `buf` with at least all of it.
    ///
    /// Returns the confirmed record length, or `None` when the stream
    /// ends cleanly before a record starts.
    pub(crate) fn detect<R: Read, F: RecordFormat>(
        &mut self,
        stream: &mut PackedSource<R>,
        buf: &mut RecordBuffer,
        format: &F,
        skip_non_data: bool,
        stats: &mut ReaderStats,
    ) -> Result<Option<usize>> {
        self.reset();

        let length = loop {
            if self.probe_len > MAX_RECORD_LEN {
                return Err(MseedError::LengthUndetected {
                    offset: buf.window_offset(),
                    probed: buf.window_len(),
                });
            }

            let want = self.probe_len.saturating_sub(buf.window_len());
            if stream.fill(buf, want)? < want {
                match self.end_of_input(buf, format, skip_non_data, stats)? {
                    Some(length) => break length,
                    None => return Ok(None),
                }
            }

            let offset = buf.window_offset();
            match format.probe_length(buf.window()) {
                Probe::Length(length) => break length,
                Probe::NotRecord => {
                    if offset == 0 && stream.pack().is_none() {
                        if let Some(kind) = PackKind::from_signature(buf.window()) {
                            Self::enter_pack(stream, buf, kind)?;
                            continue;
                        }
                    }

                    if skip_non_data {
                        let shift = resync_shift(buf.window(), format);
                        log::trace!(
                            "Skipped {} non-data bytes at byte offset {}",
                            shift,
                            offset
                        );
                        stats.skipped_bytes += shift as u64;
                        buf.consume(shift);
                        continue;
                    }
                }
                Probe::NeedMore => {}
            }

            self.grow();
        };

        let offset = buf.window_offset();
        if !(MIN_RECORD_LEN..=MAX_RECORD_LEN).contains(&length) {
            return Err(MseedError::LengthOutOfRange { offset, length });
        }

        // Read the rest of the record.
        let have = buf.window_len();
        if have < length && stream.fill(buf, length - have)? < length - have {
            return Err(MseedError::ShortRead {
                offset,
                needed: length,
                got: buf.window_len(),
            });
        }

        Ok(Some(length))
    }

    /// Recognise a packed file at offset 0 and strip its header.
    fn enter_pack<R: Read>(
        stream: &mut PackedSource<R>,
        buf: &mut RecordBuffer,
        kind: PackKind,
    ) -> Result<()> {
        let header = PackHeaderParser::parse(buf.window()).map_err(|e| MseedError::PackInfo {
            offset: 0,
            reason: e.to_string(),
        })?;

        log::debug!(
            "Detected packed file ({}: type {})",
            String::from_utf8_lossy(kind.tag()),
            kind.type_code()
        );
        log::debug!(
            "Read packed file info at beginning of file ({} bytes follow)",
            header.data_size
        );

        stream.set_pack(PackState::from_header(&header));
        buf.consume(kind.first_header_len());
        // A short first data section ends inside the probed bytes.
        stream.absorb_buffered_groups(buf)
    }

    /// The stream ended inside the probe window.
    fn end_of_input<F: RecordFormat>(
        &self,
        buf: &mut RecordBuffer,
        format: &F,
        skip_non_data: bool,
        stats: &mut ReaderStats,
    ) -> Result<Option<usize>> {
        let offset = buf.window_offset();
        let got = buf.window_len();
        if got == 0 {
            return Ok(None);
        }

        match format.probe_length(buf.window()) {
            // Whatever is left may still frame a complete record.
            Probe::Length(length) => Ok(Some(length)),
            Probe::NotRecord if skip_non_data => {
                log::warn!(
                    "Discarding {} trailing non-data bytes at byte offset {}",
                    got,
                    offset
                );
                stats.skipped_bytes += got as u64;
                buf.clear();
                Ok(None)
            }
            Probe::NotRecord => Err(MseedError::LengthUndetected {
                offset,
                probed: got,
            }),
            Probe::NeedMore => Err(MseedError::ShortRead {
                offset,
                needed: self.probe_len,
                got,
            }),
        }
    }
}

/// Bytes to drop from the front of a window that cannot start a record:
/// up to the first position the format does not rule out.
fn resync_shift<F: RecordFormat>(window: &[u8], format: &F) -> usize {
    (1..window.len())
        .find(|&i| format.probe_length(&window[i..]) != Probe::NotRecord)
        .unwrap_or(window.len())
}
