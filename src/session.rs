//! Read records from a named source across calls.
//!
//! [`StreamSession`] keeps one [`RecordReader`] alive between calls that
//! name the same source, so a caller can pull records one at a time by
//! identity alone. Naming a different source closes the current reader
//! first. Any error closes it too, and the next call starts over.

use crate::byte_source::DynRead;
use crate::error::Result;
use crate::formats::{MiniSeed2, RecordFormat};
use crate::options::ReadOptions;
use crate::reader::RecordReader;
use crate::record::{Record, RecordDecoder};

/// Reader state kept between calls.
pub struct StreamSession<F = MiniSeed2> {
    format: F,
    active: Option<RecordReader<DynRead, F>>,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSession {
    pub fn new() -> Self {
        Self::with_format(MiniSeed2)
    }
}

impl<F: RecordFormat + Clone> StreamSession<F> {
    pub fn with_format(format: F) -> Self {
        Self {
            format,
            active: None,
        }
    }

    /// Identity of the open source, if any.
    pub fn identity(&self) -> Option<&str> {
        self.active.as_ref().map(RecordReader::name)
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Stream offset of the last record read, 0 when nothing is open.
    pub fn offset(&self) -> u64 {
        self.active.as_ref().map_or(0, RecordReader::offset)
    }

    /// Read the next record of `identity`.
    ///
    /// `Ok(None)` marks the end of the stream; the session stays on that
    /// source until [`close`](Self::close) or a call for another one.
    pub fn read_next<D: RecordDecoder>(
        &mut self,
        identity: &str,
        options: &ReadOptions,
        decoder: &mut D,
    ) -> Result<Option<Record<D::Output>>> {
        let reader = self.open_or_resume(identity, options)?;
        let result = reader.next_record(decoder);
        if result.is_err() {
            self.active = None;
        }
        result
    }

    /// Release the open source. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(mut reader) = self.active.take() {
            log::debug!("Closing {}", reader.name());
            reader.close();
        }
    }

    fn open_or_resume(
        &mut self,
        identity: &str,
        options: &ReadOptions,
    ) -> Result<&mut RecordReader<DynRead, F>> {
        let reader = match self.active.take() {
            Some(mut reader) if reader.name() == identity => {
                reader.set_flags(options.skip_non_data, options.unpack_data);
                reader
            }
            previous => {
                if let Some(mut previous) = previous {
                    log::warn!(
                        "Switching from {} to {}, closing the previous source",
                        previous.name(),
                        identity
                    );
                    previous.close();
                }
                RecordReader::open_with_format(identity, self.format.clone(), *options)?
            }
        };
        Ok(self.active.insert(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MseedError;
    use crate::formats::MiniSeed2Decoder;
    use crate::test_util::record_stream;
    use std::path::PathBuf;

    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str, data: &[u8]) -> Self {
            let path = std::env::temp_dir().join(format!(
                "mseed-stream-{}-{}",
                std::process::id(),
                name
            ));
            std::fs::write(&path, data).unwrap();
            Self(path)
        }

        fn identity(&self) -> &str {
            self.0.to_str().unwrap()
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_reads_through_calls() {
        let file = TempFile::new("through.mseed", &record_stream(512, 3));
        let options = ReadOptions::default();
        let mut session = StreamSession::new();

        let mut offsets = Vec::new();
        while let Some(record) = session
            .read_next(file.identity(), &options, &mut MiniSeed2Decoder)
            .unwrap()
        {
            offsets.push(record.offset);
            assert_eq!(session.identity(), Some(file.identity()));
        }
        assert_eq!(offsets, vec![0, 512, 1024]);

        // Finished but still on this source.
        assert!(session.is_open());
        assert!(session
            .read_next(file.identity(), &options, &mut MiniSeed2Decoder)
            .unwrap()
            .is_none());

        session.close();
        session.close();
        assert!(!session.is_open());
        assert_eq!(session.offset(), 0);
    }

    #[test]
    fn test_reopens_after_close() {
        let file = TempFile::new("reopen.mseed", &record_stream(256, 2));
        let options = ReadOptions::default();
        let mut session = StreamSession::new();

        session
            .read_next(file.identity(), &options, &mut MiniSeed2Decoder)
            .unwrap();
        session.read_next(file.identity(), &options, &mut MiniSeed2Decoder).unwrap();
        assert_eq!(session.offset(), 256);

        session.close();
        let record = session
            .read_next(file.identity(), &options, &mut MiniSeed2Decoder)
            .unwrap()
            .unwrap();
        assert_eq!(record.offset, 0);
    }

    #[test]
    fn test_switching_identity_restarts() {
        let first = TempFile::new("first.mseed", &record_stream(512, 2));
        let second = TempFile::new("second.mseed", &record_stream(256, 2));
        let options = ReadOptions::default();
        let mut session = StreamSession::new();

        let record = session
            .read_next(first.identity(), &options, &mut MiniSeed2Decoder)
            .unwrap()
            .unwrap();
        assert_eq!(record.record.record_length, 512);

        let record = session
            .read_next(second.identity(), &options, &mut MiniSeed2Decoder)
            .unwrap()
            .unwrap();
        assert_eq!(record.offset, 0);
        assert_eq!(record.record.record_length, 256);
        assert_eq!(session.identity(), Some(second.identity()));
    }

    #[test]
    fn test_missing_file() {
        let mut session = StreamSession::new();
        let err = session
            .read_next(
                "/nonexistent/mseed-stream/missing.mseed",
                &ReadOptions::default(),
                &mut MiniSeed2Decoder,
            )
            .unwrap_err();
        assert!(matches!(err, MseedError::Open { .. }));
        assert!(!session.is_open());
    }

    #[test]
    fn test_error_closes_session() {
        let mut data = record_stream(512, 1);
        data.extend_from_slice(&[b'x'; 100]);
        let file = TempFile::new("truncated.mseed", &data);
        let options = ReadOptions::default();
        let mut session = StreamSession::new();

        assert!(session
            .read_next(file.identity(), &options, &mut MiniSeed2Decoder)
            .unwrap()
            .is_some());
        let err = session
            .read_next(file.identity(), &options, &mut MiniSeed2Decoder)
            .unwrap_err();
        assert!(matches!(err, MseedError::ShortRead { offset: 512, .. }));
        assert!(!session.is_open());

        // The next call starts from the beginning again.
        let record = session
            .read_next(file.identity(), &options, &mut MiniSeed2Decoder)
            .unwrap()
            .unwrap();
        assert_eq!(record.offset, 0);
    }
}
