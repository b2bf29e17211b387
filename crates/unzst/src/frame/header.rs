//! Frame header: descriptor byte, window descriptor, dictionary id and
//! content size, in that order after the magic number.
//!
//! Every field is pulled out of the raw bytes with explicit shifts and masks.

use unzst_core::{Error, Result};

/// Longest possible frame header after the magic number.
pub const MAX_FRAME_HEADER_SIZE: usize = 1 + 1 + 4 + 8;

const CHECKSUM_BIT: u8 = 1 << 2;
const RESERVED_BIT: u8 = 1 << 3;
const SINGLE_SEGMENT_BIT: u8 = 1 << 5;

/// The first header byte.
///
/// ```text
/// 7 6 | 5              | 4      | 3        | 2        | 1 0
/// FCS | single segment | unused | reserved | checksum | dictionary id
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    raw: u8,
}

impl FrameDescriptor {
    /// Validate a descriptor byte. The reserved bit must be clear.
    pub fn new(byte: u8) -> Result<Self> {
        if byte & RESERVED_BIT != 0 {
            return Err(Error::invalid("frame descriptor has its reserved bit set"));
        }
        Ok(Self { raw: byte })
    }

    /// Two-bit content size code.
    #[inline]
    pub fn content_size_code(&self) -> u8 {
        self.raw >> 6
    }

    /// Two-bit dictionary id code.
    #[inline]
    pub fn dictionary_id_code(&self) -> u8 {
        self.raw & 0x03
    }

    #[inline]
    pub fn single_segment(&self) -> bool {
        self.raw & SINGLE_SEGMENT_BIT != 0
    }

    #[inline]
    pub fn has_checksum(&self) -> bool {
        self.raw & CHECKSUM_BIT != 0
    }

    /// Width of the content size field. Code 0 means 1 byte in a
    /// single-segment frame and no field otherwise.
    pub fn content_size_width(&self) -> usize {
        match (self.content_size_code(), self.single_segment()) {
            (0, true) => 1,
            (0, false) => 0,
            (1, _) => 2,
            (2, _) => 4,
            _ => 8,
        }
    }

    /// Width of the dictionary id field.
    pub fn dictionary_id_width(&self) -> usize {
        [0, 1, 2, 4][self.dictionary_id_code() as usize]
    }

    /// Single-segment frames omit the window descriptor.
    #[inline]
    pub fn window_descriptor_width(&self) -> usize {
        usize::from(!self.single_segment())
    }

    /// Header length after the magic number, descriptor byte included.
    pub fn header_size(&self) -> usize {
        1 + self.window_descriptor_width() + self.dictionary_id_width() + self.content_size_width()
    }
}

/// A decoded frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub descriptor: FrameDescriptor,
    /// Maximum back-reference distance in bytes.
    pub window_size: u64,
    /// Declared decoded length, when the header carries one.
    pub content_size: Option<u64>,
    /// Whether the window equals the content size.
    pub single_segment: bool,
    /// Whether a content checksum trails the last block.
    pub has_checksum: bool,
    /// Zero when the frame names no dictionary.
    pub dictionary_id: u32,
    /// Header length in bytes, excluding the magic number.
    pub header_size: usize,
}

impl FrameHeader {
    /// Decode a header from `data`, which starts at the descriptor byte.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let descriptor = match data.first() {
            Some(&byte) => FrameDescriptor::new(byte)?,
            None => return Err(Error::unexpected_eof(0)),
        };
        let header_size = descriptor.header_size();
        if data.len() < header_size {
            return Err(Error::unexpected_eof(data.len() as u64));
        }

        let mut fields = &data[1..header_size];
        let window_field = take_field(&mut fields, descriptor.window_descriptor_width());
        let dictionary_id =
            read_le_uint(take_field(&mut fields, descriptor.dictionary_id_width())) as u32;
        let size_field = take_field(&mut fields, descriptor.content_size_width());

        let content_size = match size_field.len() {
            0 => None,
            // The 2-byte form is offset by 256
            2 => Some(read_le_uint(size_field) + 256),
            _ => Some(read_le_uint(size_field)),
        };

        let single_segment = descriptor.single_segment();
        let window_size = match window_field.first() {
            Some(&byte) => decode_window_size(byte),
            None => content_size.unwrap_or(0),
        };

        Ok(Self {
            descriptor,
            window_size,
            content_size,
            single_segment,
            has_checksum: descriptor.has_checksum(),
            dictionary_id,
            header_size,
        })
    }
}

/// Split the next `width` bytes off the front of `fields`.
fn take_field<'a>(fields: &mut &'a [u8], width: usize) -> &'a [u8] {
    let (field, rest) = fields.split_at(width);
    *fields = rest;
    field
}

/// Window size for a window descriptor byte.
///
/// `base = 1 << (10 + exponent)`, `window = base + mantissa * base / 8`,
/// with the exponent in the top five bits and the mantissa in the low three.
pub fn decode_window_size(byte: u8) -> u64 {
    let exponent = u32::from(byte >> 3);
    let mantissa = u64::from(byte & 0x07);
    let base = 1u64 << (10 + exponent);
    base + (base >> 3) * mantissa
}

/// Little-endian unsigned integer of up to 8 bytes.
pub(crate) fn read_le_uint(data: &[u8]) -> u64 {
    data.iter()
        .rev()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
}
