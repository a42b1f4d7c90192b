//! ByteSource - sequential byte source for record reading.

use crate::error::{MseedError, Result};
use std::fmt;
use std::io::{self, BufRead, BufReader, Read};

/// Identity that selects standard input instead of a named file.
pub const STDIN_IDENTITY: &str = "-";

/// Boxed reader used when the source is chosen at runtime.
pub type DynRead = Box<dyn Read + Send>;

/// Buffered reader that tracks its offset from the start of the stream.
///
/// Only forward movement is needed: bytes are either read into a caller
/// buffer or skipped. End of stream is detected by peeking into the
/// internal buffer, so nothing is consumed by the check.
pub struct ByteSource<R> {
    inner: BufReader<R>,
    name: String,
    offset: u64,
}

impl<R> fmt::Debug for ByteSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSource")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl ByteSource<DynRead> {
    /// Open the source named by `identity`.
    ///
    /// [`STDIN_IDENTITY`] reads from standard input, anything else is a
    /// file path.
    pub fn open(identity: &str) -> Result<Self> {
        if identity == STDIN_IDENTITY {
            return Ok(Self::new(Box::new(io::stdin()), identity));
        }

        let file = std::fs::File::open(identity).map_err(|source| MseedError::Open {
            identity: identity.to_string(),
            source,
        })?;
        Ok(Self::new(Box::new(file), identity))
    }
}

impl<R: Read> ByteSource<R> {
    pub fn new(inner: R, name: &str) -> Self {
        Self {
            inner: BufReader::new(inner),
            name: name.to_string(),
            offset: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset of the next byte to be read.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Fill `buf` as far as the stream allows.
    ///
    /// Returns the number of bytes read, which is less than `buf.len()`
    /// only at end of stream.
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    /// Skip `count` bytes without keeping them. Works on pipes too.
    pub fn skip(&mut self, count: u64) -> io::Result<u64> {
        let skipped = io::copy(&mut (&mut self.inner).take(count), &mut io::sink())?;
        self.offset += skipped;
        Ok(skipped)
    }

    /// True when no further bytes are available.
    pub fn at_eof(&mut self) -> io::Result<bool> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.is_empty()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_up_to_tracks_offset() {
        let mut source = ByteSource::new(Cursor::new(vec![7u8; 10]), "mem");
        let mut buf = [0u8; 4];
        assert_eq!(source.read_up_to(&mut buf).unwrap(), 4);
        assert_eq!(source.offset(), 4);

        let mut rest = [0u8; 8];
        assert_eq!(source.read_up_to(&mut rest).unwrap(), 6);
        assert_eq!(source.offset(), 10);
        assert!(source.at_eof().unwrap());
    }

    #[test]
    fn test_at_eof_does_not_consume() {
        let mut source = ByteSource::new(Cursor::new(vec![1u8, 2, 3]), "mem");
        assert!(!source.at_eof().unwrap());
        let mut buf = [0u8; 3];
        assert_eq!(source.read_up_to(&mut buf).unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn test_skip_past_end() {
        let mut source = ByteSource::new(Cursor::new(vec![0u8; 5]), "mem");
        assert_eq!(source.skip(3).unwrap(), 3);
        assert_eq!(source.skip(8).unwrap(), 2);
        assert_eq!(source.offset(), 5);
    }

    #[test]
    fn test_open_missing_file() {
        let err = ByteSource::open("/nonexistent/dir/file.mseed").unwrap_err();
        assert!(matches!(err, MseedError::Open { .. }));
    }

    #[test]
    fn test_debug_skips_reader() {
        let source = ByteSource::<DynRead>::new(Box::new(Cursor::new(vec![0u8; 4])), "mem");
        assert_eq!(format!("{:?}", source), "ByteSource { name: \"mem\", offset: 0, .. }");
    }
}
