//! Sequential Mini-SEED record reader.
//!
//! Reads data records one after another from a file or standard input,
//! detecting the record length from the first record, optionally skipping
//! non-data chunks, and unwrapping packed (PED/PSD/PLC/PQI) containers on
//! the fly. Every record comes with its exact byte offset in the stream.
//!
//! ## Features
//! - Core library depends on `log` only
//! - `async` - Open files with tokio
//! - `parallel` - Read many streams concurrently with rayon
//!
//! ## Example
//!
//! ```rust,no_run
//! use mseed_stream::{MiniSeed2Decoder, ReadOptions, StreamSession};
//!
//! let mut session = StreamSession::new();
//! let options = ReadOptions::default().skip_non_data(true);
//! while let Some(record) = session.read_next("data.mseed", &options, &mut MiniSeed2Decoder)? {
//!     println!("{} at {}", record.record.source_name(), record.offset);
//! }
//! session.close();
//! # Ok::<(), mseed_stream::MseedError>(())
//! ```

mod buffer;
pub mod byte_source;
pub mod detect;
pub mod envelope;
pub mod error;
pub mod formats;
pub mod options;
pub mod parsing;
pub mod reader;
pub mod record;
pub mod session;
pub mod traces;

#[cfg(test)]
mod test_util;

pub use byte_source::{ByteSource, DynRead, STDIN_IDENTITY};
pub use detect::LengthDetector;
pub use envelope::{PackState, PackedSource};
pub use error::{MseedError, Result};
pub use formats::{
    MiniSeed2, MiniSeed2Decoder, MseedRecord, Probe, RecordFormat, MAX_FIXED_RECORD_LEN,
    MAX_RECORD_LEN, MIN_RECORD_LEN,
};
pub use options::{LengthMode, ReadOptions};
pub use reader::{ReaderStats, RecordReader, Records};
pub use record::{DecodedRecord, RawRecord, Record, RecordDecoder};
pub use session::StreamSession;
pub use traces::{read_traces, read_traces_from, RecordSink};

#[cfg(feature = "parallel")]
pub use traces::read_traces_parallel;
