//! Synthetic records and packed files for tests.

use crate::parsing::pack_header::{PackKind, PACK_CHECKSUM_LEN, PACK_ID_LEN};

/// Builds a data record with a big endian header and blockette 1000.
pub struct RecordBuilder {
    len: usize,
    sequence: u32,
    quality: u8,
    station: String,
    little_endian: bool,
    exponent: Option<u8>,
    with_b1000: bool,
    b1001_first: bool,
}

impl RecordBuilder {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            sequence: 1,
            quality: b'D',
            station: "ANMO".to_string(),
            little_endian: false,
            exponent: None,
            with_b1000: true,
            b1001_first: false,
        }
    }

    pub fn sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn station(mut self, station: &str) -> Self {
        self.station = station.to_string();
        self
    }

    pub fn little_endian(mut self) -> Self {
        self.little_endian = true;
        self
    }

    /// Declare a record length exponent that differs from the real length.
    pub fn exponent(mut self, exponent: u8) -> Self {
        self.exponent = Some(exponent);
        self
    }

    pub fn without_blockette_1000(mut self) -> Self {
        self.with_b1000 = false;
        self
    }

    pub fn blockette_1001_first(mut self) -> Self {
        self.b1001_first = true;
        self
    }

    fn put_u16(&self, buf: &mut [u8], at: usize, v: u16) {
        let bytes = if self.little_endian {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        };
        buf[at..at + 2].copy_from_slice(&bytes);
    }

    pub fn build(self) -> Vec<u8> {
        let mut rec = vec![0u8; self.len];

        rec[0..6].copy_from_slice(format!("{:06}", self.sequence % 1_000_000).as_bytes());
        rec[6] = self.quality;
        rec[7] = b' ';
        rec[8..13].copy_from_slice(format!("{:<5}", self.station).as_bytes());
        rec[13..15].copy_from_slice(b"00");
        rec[15..18].copy_from_slice(b"BHZ");
        rec[18..20].copy_from_slice(b"IU");
        self.put_u16(&mut rec, 20, 2006);
        self.put_u16(&mut rec, 22, 100);
        rec[24] = 1;
        rec[25] = 2;
        rec[26] = 3;
        self.put_u16(&mut rec, 28, 0);
        self.put_u16(&mut rec, 30, 100);
        self.put_u16(&mut rec, 32, 20);
        self.put_u16(&mut rec, 34, 1);
        self.put_u16(&mut rec, 44, 64);

        let exponent = self
            .exponent
            .unwrap_or_else(|| self.len.trailing_zeros() as u8);

        match (self.with_b1000, self.b1001_first) {
            (false, _) => {
                rec[39] = 0;
                self.put_u16(&mut rec, 46, 0);
            }
            (true, false) => {
                rec[39] = 1;
                self.put_u16(&mut rec, 46, 48);
                self.put_b1000(&mut rec, 48, exponent);
            }
            (true, true) => {
                rec[39] = 2;
                self.put_u16(&mut rec, 46, 48);
                self.put_u16(&mut rec, 48, 1001);
                self.put_u16(&mut rec, 50, 56);
                self.put_b1000(&mut rec, 56, exponent);
            }
        }

        for (i, b) in rec.iter_mut().enumerate().skip(64) {
            *b = (i % 251) as u8;
        }
        rec
    }

    fn put_b1000(&self, rec: &mut [u8], at: usize, exponent: u8) {
        self.put_u16(rec, at, 1000);
        self.put_u16(rec, at + 2, 0);
        rec[at + 4] = 11;
        rec[at + 5] = u8::from(!self.little_endian);
        rec[at + 6] = exponent;
    }
}

/// `count` consecutive records of `len` bytes.
pub fn record_stream(len: usize, count: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| RecordBuilder::new(len).sequence(i as u32 + 1).build())
        .collect()
}

/// Wrap data blocks in a packed container of the given kind.
///
/// Each block is preceded by an info section ending in its size and
/// followed by a checksum.
pub fn packed_file(kind: PackKind, blocks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(kind.tag());
    out.resize(out.len() + PACK_ID_LEN - 3, b'0');

    for block in blocks {
        let pad = kind.info_len() - 8;
        out.resize(out.len() + pad, b'X');
        out.extend_from_slice(format!("{:>8}", block.len()).as_bytes());
        out.extend_from_slice(block);
        out.extend_from_slice(&[b'C'; PACK_CHECKSUM_LEN]);
    }
    out
}
