//! Record buffer with a logical start offset.
//!
//! Bytes in front of the window (a stripped container header, skipped
//! junk, a record already handed out) are dropped by moving `start`
//! forward. Storage is compacted only between records.

/// Growable record buffer that knows the stream offset of every byte.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    bytes: Vec<u8>,
    start: usize,
    /// Stream offset of `bytes[0]`.
    origin: u64,
    /// `(index, len)`: `len` envelope bytes were skipped right before `bytes[index]`.
    gaps: Vec<(usize, u64)>,
    /// Length of the record last handed out, counted from `start`.
    delivered: usize,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Bytes not yet consumed.
    pub fn window(&self) -> &[u8] {
        &self.bytes[self.start..]
    }

    pub fn window_len(&self) -> usize {
        self.bytes.len() - self.start
    }

    /// Stream offset of the first window byte.
    pub fn window_offset(&self) -> u64 {
        self.offset_of(self.start)
    }

    fn offset_of(&self, index: usize) -> u64 {
        let skipped: u64 = self
            .gaps
            .iter()
            .take_while(|(at, _)| *at <= index)
            .map(|(_, len)| len)
            .sum();
        self.origin + index as u64 + skipped
    }

    /// Window index of the byte at stream offset `offset`.
    ///
    /// `None` when the offset lies before the window, inside a gap, or past
    /// the end of the stored bytes.
    pub fn index_of(&self, offset: u64) -> Option<usize> {
        let mut skipped = 0;
        for &(at, len) in &self.gaps {
            let gap_start = self.origin + at as u64 + skipped;
            if offset < gap_start {
                break;
            }
            if offset < gap_start + len {
                return None;
            }
            skipped += len;
        }

        let index = usize::try_from(offset.checked_sub(self.origin + skipped)?).ok()?;
        (self.start..=self.bytes.len())
            .contains(&index)
            .then(|| index - self.start)
    }

    /// Remove `count` window bytes at `index`, standing for `skipped`
    /// stream bytes that are not record data.
    pub fn excise(&mut self, index: usize, count: usize, skipped: u64) {
        let at = self.start + index;
        let end = (at + count).min(self.bytes.len());
        self.bytes.drain(at..end);

        for (gap_at, _) in &mut self.gaps {
            if *gap_at > at {
                *gap_at -= end - at;
            }
        }
        let pos = self.gaps.partition_point(|(gap_at, _)| *gap_at <= at);
        self.gaps.insert(pos, (at, skipped));
    }

    /// Grow by `count` zeroed bytes and return them for filling.
    ///
    /// `offset` is the stream offset of the first new byte; it anchors the
    /// buffer when nothing is stored yet.
    pub fn spare(&mut self, offset: u64, count: usize) -> &mut [u8] {
        if self.bytes.is_empty() {
            self.origin = offset;
        }
        let old = self.bytes.len();
        self.bytes.resize(old + count, 0);
        &mut self.bytes[old..]
    }

    /// Drop the unfilled tail left by a short read.
    pub fn truncate_spare(&mut self, unfilled: usize) {
        let len = self.bytes.len() - unfilled;
        self.bytes.truncate(len);
    }

    /// Note that `len` stream bytes were skipped before the next appended byte.
    pub fn push_gap(&mut self, len: u64) {
        if self.bytes.is_empty() {
            return;
        }
        self.gaps.push((self.bytes.len(), len));
    }

    /// Drop `count` bytes from the front of the window.
    pub fn consume(&mut self, count: usize) {
        self.start = (self.start + count).min(self.bytes.len());
        if self.start == self.bytes.len() {
            self.clear();
        }
    }

    pub fn mark_delivered(&mut self, len: usize) {
        self.delivered = len;
    }

    /// The record last handed out.
    pub fn delivered(&self) -> &[u8] {
        &self.window()[..self.delivered]
    }

    /// Consume the record last handed out and move carry-over bytes to
    /// the front of storage.
    pub fn release_delivered(&mut self) {
        let delivered = std::mem::take(&mut self.delivered);
        self.consume(delivered);
        self.compact();
    }

    fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        let start = self.start;
        self.origin = self.offset_of(start);
        self.gaps.retain(|(at, _)| *at > start);
        for (at, _) in &mut self.gaps {
            *at -= start;
        }
        self.bytes.drain(..start);
        self.start = 0;
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.gaps.clear();
        self.start = 0;
        self.origin = 0;
        self.delivered = 0;
    }

    /// Clear and give the allocation back.
    pub fn release(&mut self) {
        *self = Self::new();
    }
}
