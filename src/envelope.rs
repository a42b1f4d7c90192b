//! Packed container unwrapping.
//!
//! Once a packed file is recognised, the offset of every following
//! checksum + info group is known in advance: it comes right after the
//! data section whose size the previous info section declared. Reads stop
//! at that offset, the group is consumed, and record bytes continue.

use crate::buffer::RecordBuffer;
use crate::byte_source::ByteSource;
use crate::error::{MseedError, Result};
use crate::parsing::pack_header::{PackHeader, PackHeaderParser, PackKind, PACK_CHECKSUM_LEN};
use std::io::Read;

/// Position of the packed container the stream is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackState {
    kind: PackKind,
    next_offset: u64,
    groups: u64,
}

/// Result of reading one checksum + info group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRead {
    Group {
        /// Size of the data section that follows.
        data_size: u64,
        /// Stream bytes taken by checksum and info.
        consumed: u64,
    },
    /// The stream ended where a group was expected.
    End,
}

impl PackState {
    /// State after the identifier and first info section at offset 0.
    pub fn from_header(header: &PackHeader) -> Self {
        Self {
            kind: header.kind,
            next_offset: header.kind.first_header_len() as u64 + header.data_size,
            groups: 1,
        }
    }

    pub fn kind(&self) -> PackKind {
        self.kind
    }

    /// Offset where the next checksum + info group starts.
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Groups parsed so far, the first one included.
    pub fn groups(&self) -> u64 {
        self.groups
    }

    /// Stream bytes taken by one checksum + info group.
    pub fn group_len(&self) -> usize {
        PACK_CHECKSUM_LEN + self.kind.info_len()
    }

    /// Read the group at the source's current offset.
    pub fn read_group<R: Read>(&mut self, source: &mut ByteSource<R>) -> Result<GroupRead> {
        let group_offset = source.offset();
        let mut group = vec![0u8; self.group_len()];
        let got = source.read_up_to(&mut group)?;
        self.parse_group(group_offset, &group[..got])
    }

    /// Parse a group starting at `group_offset` from the bytes available.
    ///
    /// Fewer bytes than a full group means the stream ended there.
    pub fn parse_group(&mut self, group_offset: u64, group: &[u8]) -> Result<GroupRead> {
        let info_len = self.kind.info_len();
        let info = group.get(PACK_CHECKSUM_LEN..).unwrap_or_default();
        if info.is_empty() {
            return Ok(GroupRead::End);
        }
        if info.len() < info_len {
            return Err(MseedError::PackInfo {
                offset: group_offset,
                reason: format!("info section truncated: {} of {} bytes", info.len(), info_len),
            });
        }

        let data_size = PackHeaderParser::parse_data_size(&info[..info_len]).map_err(|e| {
            MseedError::PackInfo {
                offset: group_offset,
                reason: e.to_string(),
            }
        })?;

        let consumed = self.group_len() as u64;
        self.next_offset = group_offset + consumed + data_size;
        self.groups += 1;

        log::debug!(
            "Read packed file info at offset {} ({} bytes follow)",
            group_offset,
            data_size
        );

        Ok(GroupRead::Group {
            data_size,
            consumed,
        })
    }
}

/// Byte source that hides packed container groups from record reads.
#[derive(Debug)]
pub struct PackedSource<R> {
    source: ByteSource<R>,
    pack: Option<PackState>,
}

impl<R: Read> PackedSource<R> {
    pub fn new(source: ByteSource<R>) -> Self {
        Self { source, pack: None }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn offset(&self) -> u64 {
        self.source.offset()
    }

    pub fn pack(&self) -> Option<&PackState> {
        self.pack.as_ref()
    }

    pub fn set_pack(&mut self, pack: PackState) {
        self.pack = Some(pack);
    }

    pub fn at_eof(&mut self) -> Result<bool> {
        Ok(self.source.at_eof()?)
    }

    /// Take out groups that lie inside bytes already buffered.
    ///
    /// Happens when the first data section is shorter than what was read
    /// while probing for the container header. Bytes of a group that were
    /// not buffered yet are read from the source.
    pub(crate) fn absorb_buffered_groups(&mut self, buf: &mut RecordBuffer) -> Result<()> {
        let Some(pack) = self.pack.as_mut() else {
            return Ok(());
        };

        loop {
            let group_offset = pack.next_offset();
            let read_to = self.source.offset();
            if group_offset >= read_to {
                return Ok(());
            }

            let index = buf.index_of(group_offset).ok_or_else(|| MseedError::PackInfo {
                offset: group_offset,
                reason: "group starts before the buffered window".into(),
            })?;

            let group_len = pack.group_len();
            let buffered = buf.window().len().saturating_sub(index).min(group_len);
            let mut group = buf.window()[index..index + buffered].to_vec();
            if buffered < group_len {
                let mut rest = vec![0u8; group_len - buffered];
                let got = self.source.read_up_to(&mut rest)?;
                group.extend_from_slice(&rest[..got]);
            }
            buf.excise(index, buffered, group.len() as u64);

            log::trace!("Group at offset {} was already buffered", group_offset);
            if pack.parse_group(group_offset, &group)? == GroupRead::End {
                return Ok(());
            }
        }
    }

    /// Append up to `count` record bytes to `buf`.
    ///
    /// Returns the number appended; fewer than `count` means the stream
    /// ended, either plainly or where a container group was expected.
    pub(crate) fn fill(&mut self, buf: &mut RecordBuffer, count: usize) -> Result<usize> {
        let mut total = 0;

        while total < count {
            let mut chunk = count - total;

            if let Some(pack) = self.pack.as_mut() {
                // Empty data sections put the next group right here too.
                while self.source.offset() == pack.next_offset() {
                    match pack.read_group(&mut self.source)? {
                        GroupRead::Group { consumed, .. } => buf.push_gap(consumed),
                        GroupRead::End => return Ok(total),
                    }
                }

                let offset = self.source.offset();
                if pack.next_offset() > offset {
                    let until = usize::try_from(pack.next_offset() - offset).unwrap_or(usize::MAX);
                    chunk = chunk.min(until);
                }
            }

            let offset = self.source.offset();
            let spare = buf.spare(offset, chunk);
            let got = self.source.read_up_to(spare)?;
            buf.truncate_spare(chunk - got);
            total += got;

            if got < chunk {
                break;
            }
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::packed_file;
    use std::io::Cursor;

    fn packed_source(data: Vec<u8>) -> PackedSource<Cursor<Vec<u8>>> {
        PackedSource::new(ByteSource::new(Cursor::new(data), "mem"))
    }

    #[test]
    fn test_first_group_offsets() {
        let file = packed_file(PackKind::Ped, &[vec![0xAA; 300]]);
        let header = PackHeaderParser::parse(&file).unwrap();
        let state = PackState::from_header(&header);
        assert_eq!(state.next_offset(), 10 + 8 + 300);
        assert_eq!(state.groups(), 1);
    }

    #[test]
    fn test_fill_skips_groups() {
        let file = packed_file(PackKind::Ped, &[vec![1; 20], vec![2; 20]]);
        let header = PackHeaderParser::parse(&file).unwrap();

        let mut source = packed_source(file);
        let mut skip = RecordBuffer::new();
        assert_eq!(source.fill(&mut skip, 18).unwrap(), 18);
        source.set_pack(PackState::from_header(&header));

        let mut buf = RecordBuffer::new();
        assert_eq!(source.fill(&mut buf, 40).unwrap(), 40);
        assert_eq!(&buf.window()[..20], &[1; 20]);
        assert_eq!(&buf.window()[20..], &[2; 20]);
        assert_eq!(buf.window_offset(), 18);

        buf.consume(20);
        // 18 + 20 data + 8 checksum + 8 info
        assert_eq!(buf.window_offset(), 54);
        assert_eq!(source.pack().unwrap().groups(), 2);

        // Only the trailing checksum is left.
        let mut rest = RecordBuffer::new();
        assert_eq!(source.fill(&mut rest, 10).unwrap(), 0);
    }

    #[test]
    fn test_parse_group_from_bytes() {
        let file = packed_file(PackKind::Ped, &[vec![1; 4]]);
        let mut state = PackState::from_header(&PackHeaderParser::parse(&file).unwrap());

        let group = b"CCCCCCCC     300";
        let read = state.parse_group(22, group).unwrap();
        assert_eq!(
            read,
            GroupRead::Group {
                data_size: 300,
                consumed: 16
            }
        );
        assert_eq!(state.next_offset(), 22 + 16 + 300);
        assert_eq!(state.groups(), 2);

        assert_eq!(state.parse_group(338, b"CCCC").unwrap(), GroupRead::End);
        assert!(matches!(
            state.parse_group(338, b"CCCCCCCC  3"),
            Err(MseedError::PackInfo { offset: 338, .. })
        ));
    }

    #[test]
    fn test_absorb_group_inside_window() {
        let file = packed_file(PackKind::Ped, &[vec![1; 10], vec![2; 100]]);
        let header = PackHeaderParser::parse(&file).unwrap();

        let mut source = packed_source(file);
        let mut buf = RecordBuffer::new();
        assert_eq!(source.fill(&mut buf, 64).unwrap(), 64);
        source.set_pack(PackState::from_header(&header));
        buf.consume(18);

        source.absorb_buffered_groups(&mut buf).unwrap();
        // 18 header + 10 data + 16 group, then 100 data bytes from offset 44.
        assert_eq!(source.pack().unwrap().next_offset(), 144);
        assert_eq!(source.pack().unwrap().groups(), 2);
        assert_eq!(&buf.window()[..10], &[1; 10]);
        assert_eq!(&buf.window()[10..], &[2; 20]);

        assert_eq!(source.fill(&mut buf, 80).unwrap(), 80);
        buf.consume(10);
        assert_eq!(buf.window_offset(), 44);
        assert_eq!(buf.window(), &[2; 100]);
    }

    #[test]
    fn test_absorb_group_straddling_window_end() {
        let file = packed_file(PackKind::Plc, &[vec![7; 30], vec![8; 40]]);
        let header = PackHeaderParser::parse(&file).unwrap();

        let mut source = packed_source(file);
        let mut buf = RecordBuffer::new();
        // PLC: 10 id + 13 info, data ends at 53; read 5 bytes into the next group.
        assert_eq!(source.fill(&mut buf, 58).unwrap(), 58);
        source.set_pack(PackState::from_header(&header));
        buf.consume(23);

        source.absorb_buffered_groups(&mut buf).unwrap();
        assert_eq!(buf.window(), &[7; 30]);
        assert_eq!(source.offset(), 53 + 21);
        assert_eq!(source.pack().unwrap().next_offset(), 53 + 21 + 40);

        assert_eq!(source.fill(&mut buf, 40).unwrap(), 40);
        buf.consume(30);
        assert_eq!(buf.window_offset(), 74);
    }

    #[test]
    fn test_truncated_info_is_error() {
        let mut file = packed_file(PackKind::Psd, &[vec![5; 16]]);
        file.extend_from_slice(b"XXXX");
        let header = PackHeaderParser::parse(&file).unwrap();

        let mut source = packed_source(file);
        let mut skip = RecordBuffer::new();
        source.fill(&mut skip, 21).unwrap();
        source.set_pack(PackState::from_header(&header));

        let mut buf = RecordBuffer::new();
        let err = source.fill(&mut buf, 64).unwrap_err();
        assert!(matches!(err, MseedError::PackInfo { offset: 37, .. }));
    }
}
