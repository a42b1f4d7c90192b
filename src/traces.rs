//! Whole-stream reading.
//!
//! [`read_traces`] drains one source into a [`RecordSink`]; with the
//! `parallel` feature, [`read_traces_parallel`] does the same for many
//! sources at once, one reader per source.

use crate::error::Result;
use crate::formats::RecordFormat;
use crate::options::ReadOptions;
use crate::reader::RecordReader;
use crate::record::{Record, RecordDecoder};
use std::io::Read;

/// Receives records in stream order.
pub trait RecordSink<T> {
    fn accept(&mut self, record: Record<T>);
}

impl<T> RecordSink<T> for Vec<Record<T>> {
    fn accept(&mut self, record: Record<T>) {
        self.push(record);
    }
}

/// Read every record of `identity` into `sink`.
///
/// Returns the number of records delivered. The source is closed on
/// every path.
pub fn read_traces<D, S>(
    identity: &str,
    options: ReadOptions,
    mut decoder: D,
    sink: &mut S,
) -> Result<usize>
where
    D: RecordDecoder,
    S: RecordSink<D::Output>,
{
    let mut reader = RecordReader::open(identity, options)?;
    let result = read_traces_from(&mut reader, &mut decoder, sink);
    reader.close();

    if let Ok(count) = result {
        log::debug!("Read {} records from {}", count, identity);
    }
    result
}

/// Drain an already open reader into `sink`.
pub fn read_traces_from<R, F, D, S>(
    reader: &mut RecordReader<R, F>,
    decoder: &mut D,
    sink: &mut S,
) -> Result<usize>
where
    R: Read,
    F: RecordFormat,
    D: RecordDecoder,
    S: RecordSink<D::Output>,
{
    let mut count = 0;
    while let Some(record) = reader.next_record(decoder)? {
        sink.accept(record);
        count += 1;
    }
    Ok(count)
}

/// Read many sources concurrently.
///
/// Each source gets its own reader, decoder and sink. Results come back in
/// the order of `identities`; one failing source does not stop the others.
#[cfg(feature = "parallel")]
pub fn read_traces_parallel<P, D, S, MD, MS>(
    identities: &[P],
    options: ReadOptions,
    make_decoder: MD,
    make_sink: MS,
) -> Vec<Result<S>>
where
    P: AsRef<str> + Sync,
    D: RecordDecoder,
    S: RecordSink<D::Output> + Send,
    MD: Fn() -> D + Sync,
    MS: Fn() -> S + Sync,
{
    use rayon::prelude::*;

    identities
        .par_iter()
        .map(|identity| -> Result<S> {
            let mut sink = make_sink();
            read_traces(identity.as_ref(), options, make_decoder(), &mut sink)?;
            Ok(sink)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MseedError;
    use crate::formats::{MiniSeed2Decoder, MseedRecord};
    use crate::test_util::record_stream;
    use std::io::Cursor;

    /// Keeps only the stream offsets.
    #[derive(Default)]
    struct Offsets(Vec<u64>);

    impl RecordSink<MseedRecord> for Offsets {
        fn accept(&mut self, record: Record<MseedRecord>) {
            self.0.push(record.offset);
        }
    }

    fn temp_file(name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "mseed-stream-traces-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_read_traces_into_vec() {
        let path = temp_file("vec.mseed", &record_stream(1024, 4));
        let mut records: Vec<Record<MseedRecord>> = Vec::new();

        let count = read_traces(
            path.to_str().unwrap(),
            ReadOptions::default(),
            MiniSeed2Decoder,
            &mut records,
        )
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(count, 4);
        assert_eq!(records.len(), 4);
        assert!(records[3].is_last);
        assert_eq!(records[2].record.sequence_number, "000003");
    }

    #[test]
    fn test_read_traces_from_reader() {
        let mut reader = RecordReader::new(
            Cursor::new(record_stream(256, 3)),
            ReadOptions::default(),
        );
        let mut sink = Offsets::default();
        let count = read_traces_from(&mut reader, &mut MiniSeed2Decoder, &mut sink).unwrap();
        assert_eq!(count, 3);
        assert_eq!(sink.0, vec![0, 256, 512]);
    }

    #[test]
    fn test_read_traces_error_keeps_delivered() {
        let mut data = record_stream(256, 2);
        data.truncate(400);
        let mut reader = RecordReader::new(Cursor::new(data), ReadOptions::default());
        let mut sink = Offsets::default();

        let err = read_traces_from(&mut reader, &mut MiniSeed2Decoder, &mut sink).unwrap_err();
        assert!(matches!(err, MseedError::ShortRead { offset: 256, .. }));
        assert_eq!(sink.0, vec![0]);
        assert!(!reader.is_open());
    }

    #[test]
    fn test_read_traces_missing_file() {
        let mut records: Vec<Record<MseedRecord>> = Vec::new();
        let err = read_traces(
            "/nonexistent/mseed-stream/none.mseed",
            ReadOptions::default(),
            MiniSeed2Decoder,
            &mut records,
        )
        .unwrap_err();
        assert!(matches!(err, MseedError::Open { .. }));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_read_traces_parallel() {
        let a = temp_file("par-a.mseed", &record_stream(512, 2));
        let b = temp_file("par-b.mseed", &record_stream(256, 5));
        let identities = vec![
            a.to_str().unwrap().to_string(),
            "/nonexistent/mseed-stream/none.mseed".to_string(),
            b.to_str().unwrap().to_string(),
        ];

        let results = read_traces_parallel(
            &identities,
            ReadOptions::default(),
            || MiniSeed2Decoder,
            Offsets::default,
        );
        std::fs::remove_file(&a).unwrap();
        std::fs::remove_file(&b).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().0, vec![0, 512]);
        assert!(matches!(results[1], Err(MseedError::Open { .. })));
        assert_eq!(results[2].as_ref().unwrap().0.len(), 5);
    }
}
