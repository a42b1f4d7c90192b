//! Blockette chain parsing.
//!
//! Blockettes follow the fixed header as a linked list: each one starts
//! with its type and the record offset of the next blockette (0 ends the
//! chain). Blockette 1000 carries the record length as a power of two.

use super::fixed_header::{ByteOrder, FixedHeaderParser};

pub const BLOCKETTE_1000: u16 = 1000;

/// Size of the type + next offset prefix of every blockette.
pub const BLOCKETTE_PREFIX_LEN: usize = 4;

/// Blockette 1000 - data only SEED blockette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blockette1000 {
    /// Offset of the blockette inside the record.
    pub offset: usize,
    pub encoding: u8,
    pub word_order: u8,
    pub length_exponent: u8,
}

impl Blockette1000 {
    pub const SIZE: usize = 8;

    /// Record length declared by the exponent, `usize::MAX` if it overflows.
    pub fn record_length(&self) -> usize {
        1usize
            .checked_shl(u32::from(self.length_exponent))
            .unwrap_or(usize::MAX)
    }
}

/// Outcome of walking the blockette chain over a possibly partial record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainScan {
    Found(Blockette1000),
    /// The chain continues past the end of the buffer.
    Truncated,
    /// The chain ended (or was broken) without a blockette 1000.
    Absent,
}

/// Walk the blockette chain looking for blockette 1000.
///
/// `buffer` starts at the record's first byte and may hold only part of
/// the record.
pub fn find_blockette_1000(buffer: &[u8], order: ByteOrder, first: u16) -> ChainScan {
    let mut next = usize::from(first);

    while next != 0 {
        // Blockettes live after the fixed header; anything else is corrupt.
        if next < FixedHeaderParser::HEADER_SIZE {
            return ChainScan::Absent;
        }
        if next + BLOCKETTE_PREFIX_LEN > buffer.len() {
            return ChainScan::Truncated;
        }

        let kind = order.u16(&buffer[next..next + 2]);
        let following = usize::from(order.u16(&buffer[next + 2..next + 4]));

        if kind == BLOCKETTE_1000 {
            if next + Blockette1000::SIZE > buffer.len() {
                return ChainScan::Truncated;
            }
            return ChainScan::Found(Blockette1000 {
                offset: next,
                encoding: buffer[next + 4],
                word_order: buffer[next + 5],
                length_exponent: buffer[next + 6],
            });
        }

        // Offsets must move forward or the chain would loop.
        if following != 0 && following <= next {
            return ChainScan::Absent;
        }
        next = following;
    }

    ChainScan::Absent
}
