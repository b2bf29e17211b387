//! Literals section decoding.
//!
//! The literals section holds the bytes that sequences copy verbatim. It is
//! stored raw, as a single repeated byte, or Huffman-compressed in one or
//! four streams.

use tracing::trace;
use unzst_core::{Error, Result};

use crate::arena::try_reserve;
use crate::bits::low_mask;
use crate::frame::BlockHeader;
use crate::huffman::{read_huffman_table, HuffmanDecoder, HuffmanTable};

/// Literals block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralsBlockType {
    /// Raw literals - uncompressed bytes.
    Raw,
    /// RLE literals - single byte repeated.
    Rle,
    /// Huffman compressed literals with new tree.
    Compressed,
    /// Huffman compressed using previous tree.
    Treeless,
}

impl LiteralsBlockType {
    /// Parse block type from 2-bit field.
    pub fn from_field(field: u8) -> Self {
        match field & 0x03 {
            0 => LiteralsBlockType::Raw,
            1 => LiteralsBlockType::Rle,
            2 => LiteralsBlockType::Compressed,
            _ => LiteralsBlockType::Treeless,
        }
    }

    fn is_huffman(self) -> bool {
        matches!(self, LiteralsBlockType::Compressed | LiteralsBlockType::Treeless)
    }
}

/// Number of Huffman streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCount {
    One,
    Four,
}

/// Parsed literals section header.
///
/// ```text
/// Byte 0:   Bits 0-1 Literals_Block_Type
///           Bits 2-3 Size_Format
/// Raw/RLE:  size in 5, 12 or 20 bits (1, 2 or 3 header bytes)
/// Huffman:  regenerated and compressed sizes in 10, 10, 14 or 18 bits
///           each (3, 3, 4 or 5 header bytes)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralsSection {
    /// Block type.
    pub kind: LiteralsBlockType,
    /// Decoded literals length.
    pub regenerated_size: usize,
    /// Payload length for Huffman kinds, tree description included.
    pub compressed_size: Option<usize>,
    /// Stream layout for Huffman kinds.
    pub stream_count: StreamCount,
    /// Header length in bytes.
    pub header_size: usize,
}

impl LiteralsSection {
    /// Parse the section header.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let byte0 = match data.first() {
            Some(&byte) => byte,
            None => return Err(Error::invalid("empty literals section")),
        };
        let kind = LiteralsBlockType::from_field(byte0);
        let size_format = (byte0 >> 2) & 0x03;

        let section = if kind.is_huffman() {
            let (header_size, field_bits, stream_count) = match size_format {
                0 => (3, 10, StreamCount::One),
                1 => (3, 10, StreamCount::Four),
                2 => (4, 14, StreamCount::Four),
                _ => (5, 18, StreamCount::Four),
            };
            let header = read_header(data, header_size)?;
            Self {
                kind,
                regenerated_size: ((header >> 4) & low_mask(field_bits)) as usize,
                compressed_size: Some(((header >> (4 + field_bits)) & low_mask(field_bits)) as usize),
                stream_count,
                header_size,
            }
        } else {
            let (header_size, regenerated_size) = match size_format {
                0 | 2 => (1, usize::from(byte0 >> 3)),
                1 => (2, (read_header(data, 2)? >> 4) as usize),
                _ => (3, (read_header(data, 3)? >> 4) as usize),
            };
            Self {
                kind,
                regenerated_size,
                compressed_size: None,
                stream_count: StreamCount::One,
                header_size,
            }
        };

        if section.regenerated_size > BlockHeader::MAX_BLOCK_SIZE as usize {
            return Err(Error::invalid(format!(
                "literals size {} exceeds block maximum",
                section.regenerated_size
            )));
        }
        Ok(section)
    }

    /// Bytes of payload after the header.
    pub fn payload_size(&self) -> usize {
        match self.kind {
            LiteralsBlockType::Raw => self.regenerated_size,
            LiteralsBlockType::Rle => 1,
            _ => self.compressed_size.unwrap_or(0),
        }
    }

    /// Total section length, header included.
    pub fn total_size(&self) -> usize {
        self.header_size + self.payload_size()
    }
}

fn read_header(data: &[u8], size: usize) -> Result<u64> {
    if data.len() < size {
        return Err(Error::invalid("literals header truncated"));
    }
    Ok(data[..size]
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (8 * i))))
}

/// Sizes of the first three of four Huffman streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpTable {
    pub sizes: [u16; 3],
}

impl JumpTable {
    /// Jump table size in bytes.
    pub const SIZE: usize = 6;

    /// Parse the 6-byte jump table.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::invalid("literals jump table truncated"));
        }
        Ok(Self {
            sizes: [
                u16::from_le_bytes([data[0], data[1]]),
                u16::from_le_bytes([data[2], data[3]]),
                u16::from_le_bytes([data[4], data[5]]),
            ],
        })
    }

    /// All four stream sizes given the stream payload length (jump table included).
    pub fn stream_sizes(&self, total: usize) -> Result<[usize; 4]> {
        let [a, b, c] = self.sizes.map(usize::from);
        let fourth = total
            .checked_sub(Self::SIZE + a + b + c)
            .filter(|&n| n > 0)
            .ok_or_else(|| Error::invalid("literals jump table exceeds stream payload"))?;
        Ok([a, b, c, fourth])
    }
}

/// Decode a literals section, appending the literals to `out`.
///
/// A `Compressed` section replaces `huffman`; a `Treeless` one reuses it.
/// Returns the number of bytes consumed from `data`.
pub fn decode_literals(
    data: &[u8],
    huffman: &mut Option<HuffmanTable>,
    out: &mut Vec<u8>,
) -> Result<usize> {
    let section = LiteralsSection::parse(data)?;
    let end = section.total_size();
    if data.len() < end {
        return Err(Error::invalid(format!(
            "literals section needs {} bytes, block has {}",
            end,
            data.len()
        )));
    }
    let payload = &data[section.header_size..end];
    try_reserve(out, section.regenerated_size)?;

    match section.kind {
        LiteralsBlockType::Raw => out.extend_from_slice(payload),
        LiteralsBlockType::Rle => out.resize(out.len() + section.regenerated_size, payload[0]),
        LiteralsBlockType::Compressed | LiteralsBlockType::Treeless => {
            let streams = if section.kind == LiteralsBlockType::Compressed {
                let (table, consumed) = read_huffman_table(payload)?;
                *huffman = Some(table);
                &payload[consumed..]
            } else {
                payload
            };
            let table = huffman
                .as_ref()
                .ok_or_else(|| Error::invalid("treeless literals without a previous Huffman table"))?;
            let decoder = HuffmanDecoder::new(table);
            match section.stream_count {
                StreamCount::One => decoder.decode_stream(streams, section.regenerated_size, out)?,
                StreamCount::Four => {
                    decode_four_streams(&decoder, streams, section.regenerated_size, out)?
                }
            }
        }
    }

    trace!(
        kind = ?section.kind,
        regenerated = section.regenerated_size,
        consumed = end,
        "literals section"
    );
    Ok(end)
}

fn decode_four_streams(
    decoder: &HuffmanDecoder<'_>,
    streams: &[u8],
    regenerated: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    let jump = JumpTable::parse(streams)?;
    let sizes = jump.stream_sizes(streams.len())?;

    let segment = (regenerated + 3) / 4;
    let last = regenerated
        .checked_sub(3 * segment)
        .ok_or_else(|| Error::invalid("too few literals for four streams"))?;
    let regen = [segment, segment, segment, last];

    let mut start = JumpTable::SIZE;
    for (size, count) in sizes.into_iter().zip(regen) {
        decoder.decode_stream(&streams[start..start + size], count, out)?;
        start += size;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct weights [4, 3, 2, 0, 1] (symbol 5 implied).
    const TREE: [u8; 4] = [0x84, 0x43, 0x20, 0x10];

    #[test]
    fn test_raw_short_header() {
        let data = [5 << 3, b'H', b'e', b'l', b'l', b'o', 0xFF];
        let mut out = Vec::new();
        let consumed = decode_literals(&data, &mut None, &mut out).unwrap();
        assert_eq!(consumed, 6);
        assert_eq!(out, b"Hello");
    }

    #[test]
    fn test_raw_two_byte_header() {
        let mut data = vec![0x44, 0x06];
        data.extend(std::iter::repeat(b'z').take(100));
        let section = LiteralsSection::parse(&data).unwrap();
        assert_eq!(section.regenerated_size, 100);
        assert_eq!(section.header_size, 2);

        let mut out = Vec::new();
        assert_eq!(decode_literals(&data, &mut None, &mut out).unwrap(), 102);
        assert_eq!(out.len(), 100);
    }

    #[test]
    fn test_rle_literals() {
        let data = [(20 << 3) | 1, b'q'];
        let mut out = Vec::new();
        assert_eq!(decode_literals(&data, &mut None, &mut out).unwrap(), 2);
        assert_eq!(out, vec![b'q'; 20]);
    }

    #[test]
    fn test_size_format_two_is_short_header() {
        // Size_Format 0b10 keeps the 5-bit size: bit 2 belongs to the size
        let section = LiteralsSection::parse(&[0b0000_1000]).unwrap();
        assert_eq!(section.header_size, 1);
        assert_eq!(section.regenerated_size, 1);
    }

    #[test]
    fn test_oversized_rle_rejected() {
        // 20-bit size 200000
        let data = [0x0D, 0xD4, 0x30, b'x'];
        assert!(matches!(
            LiteralsSection::parse(&data),
            Err(Error::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_raw_truncated() {
        let data = [10 << 3, 1, 2, 3];
        let mut out = Vec::new();
        assert!(decode_literals(&data, &mut None, &mut out).is_err());
    }

    #[test]
    fn test_compressed_single_stream() {
        let mut data = vec![0x32, 0x40, 0x01];
        data.extend_from_slice(&TREE);
        data.push(0xD0);

        let section = LiteralsSection::parse(&data).unwrap();
        assert_eq!(section.stream_count, StreamCount::One);
        assert_eq!(section.regenerated_size, 3);
        assert_eq!(section.compressed_size, Some(5));

        let mut huffman = None;
        let mut out = Vec::new();
        assert_eq!(decode_literals(&data, &mut huffman, &mut out).unwrap(), 8);
        assert_eq!(out, vec![0, 1, 4]);
        assert!(huffman.is_some());
    }

    #[test]
    fn test_treeless_reuses_table() {
        let mut compressed = vec![0x32, 0x40, 0x01];
        compressed.extend_from_slice(&TREE);
        compressed.push(0xD0);
        let treeless = [0x33, 0x40, 0x00, 0xD0];

        let mut huffman = None;
        let mut out = Vec::new();
        assert!(matches!(
            decode_literals(&treeless, &mut huffman, &mut out),
            Err(Error::InvalidFormat { .. })
        ));

        out.clear();
        decode_literals(&compressed, &mut huffman, &mut out).unwrap();
        decode_literals(&treeless, &mut huffman, &mut out).unwrap();
        assert_eq!(out, vec![0, 1, 4, 0, 1, 4]);
    }

    #[test]
    fn test_compressed_four_streams() {
        let mut data = vec![0x86, 0xC0, 0x03];
        data.extend_from_slice(&TREE);
        data.extend_from_slice(&[1, 0, 1, 0, 2, 0]);
        data.extend_from_slice(&[0x07, 0x29, 0x01, 0x01, 0x0D]);

        let section = LiteralsSection::parse(&data).unwrap();
        assert_eq!(section.stream_count, StreamCount::Four);
        assert_eq!(section.regenerated_size, 8);
        assert_eq!(section.compressed_size, Some(15));

        let mut out = Vec::new();
        decode_literals(&data, &mut None, &mut out).unwrap();
        assert_eq!(out, vec![0, 0, 1, 2, 4, 5, 0, 1]);
    }

    #[test]
    fn test_jump_table_overrun() {
        let jump = JumpTable::parse(&[10, 0, 10, 0, 10, 0]).unwrap();
        assert!(jump.stream_sizes(30).is_err());
        assert!(jump.stream_sizes(36).is_err());
        assert_eq!(jump.stream_sizes(37).unwrap(), [10, 10, 10, 1]);
    }

    #[test]
    fn test_huffman_header_sizes() {
        // Size_Format 2: 4-byte header, 14-bit fields
        let h: u64 = 2 | (2 << 2) | (1000 << 4) | (900 << 18);
        let bytes = h.to_le_bytes();
        let section = LiteralsSection::parse(&bytes[..4]).unwrap();
        assert_eq!(section.header_size, 4);
        assert_eq!(section.regenerated_size, 1000);
        assert_eq!(section.compressed_size, Some(900));

        // Size_Format 3: 5-byte header, 18-bit fields
        let h: u64 = 2 | (3 << 2) | (100_000 << 4) | (70_000 << 22);
        let bytes = h.to_le_bytes();
        let section = LiteralsSection::parse(&bytes[..5]).unwrap();
        assert_eq!(section.header_size, 5);
        assert_eq!(section.regenerated_size, 100_000);
        assert_eq!(section.compressed_size, Some(70_000));
    }
}
