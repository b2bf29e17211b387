//! Sequences section decoding.
//!
//! Sequences are LZ77-style commands: (literal_length, match_length, offset).
//!
//! ## Repeat Offsets
//!
//! Offset values 1-3 refer to the three most recently used offsets, with a
//! shifted meaning when the sequence carries no literals. Initial repeat
//! offsets are [1, 4, 8] per RFC 8878.
//!
//! ## Symbol Compression Modes
//!
//! Each of LL/OF/ML can use a different mode:
//! - Predefined: hardcoded FSE distributions
//! - RLE: single symbol repeated for all sequences
//! - Compressed: custom FSE table encoded in the stream
//! - Repeat: previous table of the same kind in this frame

use std::borrow::Cow;

use tracing::trace;
use unzst_core::{Error, Result};

use crate::arena::try_reserve;
use crate::bits::BackwardBitReader;
use crate::context::FrameContext;
use crate::fse::{cached_ll_table, cached_ml_table, cached_of_table, FseDecoder, FseTable};

/// Minimum match length; decoded match lengths are stored above it.
pub const MIN_MATCH: u32 = 3;

/// Maximum symbol values for sequence codes (RFC 8878)
pub const MAX_LL_SYMBOL: u8 = 35;
pub const MAX_OF_SYMBOL: u8 = 31;
pub const MAX_ML_SYMBOL: u8 = 52;

const LL_MAX_ACCURACY_LOG: u8 = 9;
const OF_MAX_ACCURACY_LOG: u8 = 8;
const ML_MAX_ACCURACY_LOG: u8 = 9;

/// Tracks the three repeat offsets used for efficient offset encoding.
///
/// Per RFC 8878 Section 3.1.2.5, offset values 1-3 reference recent offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatOffsets {
    offsets: [u32; 3],
}

impl RepeatOffsets {
    /// Create with initial values per RFC 8878.
    pub fn new() -> Self {
        Self { offsets: [1, 4, 8] }
    }

    /// Current history, most recent first.
    pub fn offsets(&self) -> [u32; 3] {
        self.offsets
    }

    /// Resolve an offset value to an actual offset and update the history.
    ///
    /// - value > 3: new offset `value - 3`
    /// - value 1-3: repeat offset `value`, or `value + 1` when
    ///   `literal_length == 0`, where the fourth case means `offset_1 - 1`
    pub fn resolve(&mut self, offset_value: u32, literal_length: u32) -> Result<u32> {
        let [first, second, third] = self.offsets;
        if offset_value > 3 {
            let offset = offset_value - 3;
            self.offsets = [offset, first, second];
            return Ok(offset);
        }
        if offset_value == 0 {
            return Err(Error::invalid("offset value 0"));
        }

        let index = offset_value - 1 + u32::from(literal_length == 0);
        let offset = match index {
            0 => return Ok(first),
            1 => {
                self.offsets = [second, first, third];
                second
            }
            2 => {
                self.offsets = [third, first, second];
                third
            }
            _ => {
                let offset = first.wrapping_sub(1);
                if offset == 0 {
                    return Err(Error::invalid("repeat offset resolves to 0"));
                }
                self.offsets = [offset, first, second];
                offset
            }
        };
        Ok(offset)
    }
}

impl Default for RepeatOffsets {
    fn default() -> Self {
        Self::new()
    }
}

/// A single decoded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sequence {
    /// Number of literals to copy before the match.
    pub literal_length: u32,
    /// Match length above `MIN_MATCH`.
    pub match_length: u32,
    /// Resolved distance back in the output.
    pub offset: u32,
}

impl Sequence {
    /// Create a new sequence.
    pub fn new(literal_length: u32, match_length: u32, offset: u32) -> Self {
        Self {
            literal_length,
            match_length,
            offset,
        }
    }

    /// Bytes copied by the match.
    #[inline]
    pub fn match_bytes(&self) -> usize {
        (self.match_length + MIN_MATCH) as usize
    }
}

/// Symbol decoding mode for sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolMode {
    /// Predefined FSE distribution.
    Predefined,
    /// RLE mode - single symbol repeated.
    Rle,
    /// FSE compressed.
    Compressed,
    /// Repeat previous FSE table.
    Repeat,
}

impl SymbolMode {
    /// Parse mode from 2-bit field.
    pub fn from_field(field: u8) -> Self {
        match field & 0x03 {
            0 => SymbolMode::Predefined,
            1 => SymbolMode::Rle,
            2 => SymbolMode::Compressed,
            _ => SymbolMode::Repeat,
        }
    }
}

/// Parsed sequences section header.
///
/// ```text
/// Number_of_Sequences: 1-3 bytes
/// Symbol_Compression_Modes (absent when there are no sequences):
///   bits 7-6 Literals_Lengths_Mode
///   bits 5-4 Offsets_Mode
///   bits 3-2 Match_Lengths_Mode
///   bits 1-0 Reserved, must be 0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencesHeader {
    pub num_sequences: usize,
    pub literal_lengths_mode: SymbolMode,
    pub offsets_mode: SymbolMode,
    pub match_lengths_mode: SymbolMode,
    /// Header length in bytes.
    pub header_size: usize,
}

impl SequencesHeader {
    /// Parse the sequence count and, when non-zero, the modes byte.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (num_sequences, count_size) = parse_sequence_count(data)?;
        if num_sequences == 0 {
            return Ok(Self {
                num_sequences,
                literal_lengths_mode: SymbolMode::Predefined,
                offsets_mode: SymbolMode::Predefined,
                match_lengths_mode: SymbolMode::Predefined,
                header_size: count_size,
            });
        }

        let modes = *data
            .get(count_size)
            .ok_or_else(|| Error::invalid("sequences header truncated"))?;
        if modes & 0x03 != 0 {
            return Err(Error::invalid(format!(
                "reserved bits set in sequence modes byte {:#04x}",
                modes
            )));
        }
        Ok(Self {
            num_sequences,
            literal_lengths_mode: SymbolMode::from_field(modes >> 6),
            offsets_mode: SymbolMode::from_field(modes >> 4),
            match_lengths_mode: SymbolMode::from_field(modes >> 2),
            header_size: count_size + 1,
        })
    }
}

/// Decode the 1-3 byte sequence count.
///
/// Returns the count and its encoded length.
pub fn parse_sequence_count(data: &[u8]) -> Result<(usize, usize)> {
    let truncated = || Error::invalid("sequence count truncated");
    let byte0 = *data.first().ok_or_else(truncated)? as usize;
    match byte0 {
        0..=127 => Ok((byte0, 1)),
        128..=254 => {
            let byte1 = *data.get(1).ok_or_else(truncated)? as usize;
            Ok((((byte0 - 128) << 8) + byte1, 2))
        }
        _ => {
            if data.len() < 3 {
                return Err(truncated());
            }
            let count = data[1] as usize + ((data[2] as usize) << 8) + 0x7F00;
            Ok((count, 3))
        }
    }
}

/// Literal length codes as (extra bits, baseline).
pub const LITERAL_LENGTH_CODES: [(u8, u32); 36] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (0, 5),
    (0, 6),
    (0, 7),
    (0, 8),
    (0, 9),
    (0, 10),
    (0, 11),
    (0, 12),
    (0, 13),
    (0, 14),
    (0, 15),
    (1, 16),
    (1, 18),
    (1, 20),
    (1, 22),
    (2, 24),
    (2, 28),
    (3, 32),
    (3, 40),
    (4, 48),
    (6, 64),
    (7, 128),
    (8, 256),
    (9, 512),
    (10, 1024),
    (11, 2048),
    (12, 4096),
    (13, 8192),
    (14, 16384),
    (15, 32768),
    (16, 65536),
];

/// Match length codes as (extra bits, baseline). Baselines include `MIN_MATCH`.
pub const MATCH_LENGTH_CODES: [(u8, u32); 53] = [
    (0, 3),
    (0, 4),
    (0, 5),
    (0, 6),
    (0, 7),
    (0, 8),
    (0, 9),
    (0, 10),
    (0, 11),
    (0, 12),
    (0, 13),
    (0, 14),
    (0, 15),
    (0, 16),
    (0, 17),
    (0, 18),
    (0, 19),
    (0, 20),
    (0, 21),
    (0, 22),
    (0, 23),
    (0, 24),
    (0, 25),
    (0, 26),
    (0, 27),
    (0, 28),
    (0, 29),
    (0, 30),
    (0, 31),
    (0, 32),
    (0, 33),
    (0, 34),
    (1, 35),
    (1, 37),
    (1, 39),
    (1, 41),
    (2, 43),
    (2, 47),
    (3, 51),
    (3, 59),
    (4, 67),
    (4, 83),
    (5, 99),
    (7, 131),
    (8, 259),
    (9, 515),
    (10, 1027),
    (11, 2051),
    (12, 4099),
    (13, 8195),
    (14, 16387),
    (15, 32771),
    (16, 65539),
];

fn code_value(codes: &[(u8, u32)], code: u8, bits: &mut BackwardBitReader<'_>) -> Result<u32> {
    let &(extra, baseline) = codes
        .get(code as usize)
        .ok_or_else(|| Error::invalid(format!("sequence code {} out of range", code)))?;
    Ok(baseline + bits.read_bits(u32::from(extra)) as u32)
}

struct TableKind {
    name: &'static str,
    max_accuracy_log: u8,
    max_symbol: u8,
    predefined: fn() -> Result<&'static FseTable>,
}

const LL_KIND: TableKind = TableKind {
    name: "literal length",
    max_accuracy_log: LL_MAX_ACCURACY_LOG,
    max_symbol: MAX_LL_SYMBOL,
    predefined: cached_ll_table,
};

const OF_KIND: TableKind = TableKind {
    name: "offset",
    max_accuracy_log: OF_MAX_ACCURACY_LOG,
    max_symbol: MAX_OF_SYMBOL,
    predefined: cached_of_table,
};

const ML_KIND: TableKind = TableKind {
    name: "match length",
    max_accuracy_log: ML_MAX_ACCURACY_LOG,
    max_symbol: MAX_ML_SYMBOL,
    predefined: cached_ml_table,
};

/// Install the table selected by `mode` into `slot`.
///
/// Returns the number of description bytes consumed.
fn select_table(
    mode: SymbolMode,
    data: &[u8],
    slot: &mut Option<Cow<'static, FseTable>>,
    kind: &TableKind,
) -> Result<usize> {
    match mode {
        SymbolMode::Predefined => {
            *slot = Some(Cow::Borrowed((kind.predefined)()?));
            Ok(0)
        }
        SymbolMode::Rle => {
            let symbol = *data
                .first()
                .ok_or_else(|| Error::invalid(format!("{} RLE symbol missing", kind.name)))?;
            if symbol > kind.max_symbol {
                return Err(Error::invalid(format!(
                    "{} RLE symbol {} exceeds maximum {}",
                    kind.name, symbol, kind.max_symbol
                )));
            }
            *slot = Some(Cow::Owned(FseTable::rle(symbol)));
            Ok(1)
        }
        SymbolMode::Compressed => {
            let (table, consumed) = FseTable::parse(data, kind.max_accuracy_log, kind.max_symbol)?;
            *slot = Some(Cow::Owned(table));
            Ok(consumed)
        }
        SymbolMode::Repeat => {
            if slot.is_none() {
                return Err(Error::invalid(format!(
                    "{} table repeated with no previous table",
                    kind.name
                )));
            }
            Ok(0)
        }
    }
}

/// Decode a sequences section into `out`.
///
/// `data` must span exactly to the end of the block. The selected tables are
/// stored in `ctx` for later `Repeat` modes, and the repeat offsets are
/// updated per sequence.
pub fn decode_sequences(data: &[u8], ctx: &mut FrameContext, out: &mut Vec<Sequence>) -> Result<()> {
    let header = SequencesHeader::parse(data)?;
    let mut pos = header.header_size;
    trace!(
        sequences = header.num_sequences,
        ll_mode = ?header.literal_lengths_mode,
        of_mode = ?header.offsets_mode,
        ml_mode = ?header.match_lengths_mode,
        "sequences section"
    );

    if header.num_sequences == 0 {
        if pos != data.len() {
            return Err(Error::invalid(format!(
                "{} bytes after empty sequences section",
                data.len() - pos
            )));
        }
        return Ok(());
    }

    pos += select_table(
        header.literal_lengths_mode,
        &data[pos..],
        &mut ctx.literal_lengths,
        &LL_KIND,
    )?;
    pos += select_table(header.offsets_mode, &data[pos..], &mut ctx.offsets, &OF_KIND)?;
    pos += select_table(
        header.match_lengths_mode,
        &data[pos..],
        &mut ctx.match_lengths,
        &ML_KIND,
    )?;
    if pos > data.len() {
        return Err(Error::invalid("sequence tables overrun block"));
    }

    let (ll_table, of_table, ml_table) = match (
        ctx.literal_lengths.as_deref(),
        ctx.offsets.as_deref(),
        ctx.match_lengths.as_deref(),
    ) {
        (Some(ll), Some(of), Some(ml)) => (ll, of, ml),
        _ => return Err(Error::invalid("sequence tables unavailable")),
    };

    let mut bits = BackwardBitReader::new(&data[pos..])?;
    let mut ll_decoder = FseDecoder::new(ll_table);
    let mut of_decoder = FseDecoder::new(of_table);
    let mut ml_decoder = FseDecoder::new(ml_table);
    ll_decoder.init_state(&mut bits);
    of_decoder.init_state(&mut bits);
    ml_decoder.init_state(&mut bits);

    try_reserve(out, header.num_sequences)?;
    for i in 0..header.num_sequences {
        let of_code = of_decoder.peek_symbol();
        let ml_code = ml_decoder.peek_symbol();
        let ll_code = ll_decoder.peek_symbol();

        // Extra bits are stored offset, match length, literal length
        if of_code > MAX_OF_SYMBOL {
            return Err(Error::invalid(format!("offset code {} out of range", of_code)));
        }
        let offset_value = (1u32 << of_code) + bits.read_bits(u32::from(of_code)) as u32;
        let match_length = code_value(&MATCH_LENGTH_CODES, ml_code, &mut bits)?;
        let literal_length = code_value(&LITERAL_LENGTH_CODES, ll_code, &mut bits)?;

        let offset = ctx.repeat_offsets.resolve(offset_value, literal_length)?;
        out.push(Sequence::new(literal_length, match_length - MIN_MATCH, offset));

        if i + 1 < header.num_sequences {
            ll_decoder.update_state(&mut bits);
            ml_decoder.update_state(&mut bits);
            of_decoder.update_state(&mut bits);
        }
        if bits.is_overflowed() {
            return Err(Error::invalid(format!(
                "sequence bitstream exhausted at sequence {} of {}",
                i + 1,
                header.num_sequences
            )));
        }
    }

    if !bits.is_finished() {
        return Err(Error::invalid(format!(
            "sequence bitstream has {} bits left",
            bits.bits_remaining()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> FrameContext {
        FrameContext::new(1 << 20, 0)
    }

    /// Modes byte with the given LL, OF, ML fields.
    fn modes(ll: u8, of: u8, ml: u8) -> u8 {
        (ll << 6) | (of << 4) | (ml << 2)
    }

    #[test]
    fn test_symbol_mode_parsing() {
        assert_eq!(SymbolMode::from_field(0), SymbolMode::Predefined);
        assert_eq!(SymbolMode::from_field(1), SymbolMode::Rle);
        assert_eq!(SymbolMode::from_field(2), SymbolMode::Compressed);
        assert_eq!(SymbolMode::from_field(3), SymbolMode::Repeat);
    }

    #[test]
    fn test_sequence_count_encodings() {
        assert_eq!(parse_sequence_count(&[0x00]).unwrap(), (0, 1));
        assert_eq!(parse_sequence_count(&[0x7F]).unwrap(), (127, 1));
        assert_eq!(parse_sequence_count(&[0x80, 0x80]).unwrap(), (128, 2));
        assert_eq!(parse_sequence_count(&[0xFE, 0xFF]).unwrap(), (32511, 2));
        assert_eq!(parse_sequence_count(&[0xFF, 0x00, 0x00]).unwrap(), (0x7F00, 3));
        assert_eq!(
            parse_sequence_count(&[0xFF, 0x34, 0x12]).unwrap(),
            (0x1234 + 0x7F00, 3)
        );
    }

    #[test]
    fn test_sequence_count_truncated() {
        assert!(parse_sequence_count(&[]).is_err());
        assert!(parse_sequence_count(&[0x80]).is_err());
        assert!(parse_sequence_count(&[0xFF, 0x01]).is_err());
    }

    #[test]
    fn test_mode_byte_parsing() {
        let header = SequencesHeader::parse(&[0x05, modes(2, 1, 3)]).unwrap();
        assert_eq!(header.num_sequences, 5);
        assert_eq!(header.literal_lengths_mode, SymbolMode::Compressed);
        assert_eq!(header.offsets_mode, SymbolMode::Rle);
        assert_eq!(header.match_lengths_mode, SymbolMode::Repeat);
        assert_eq!(header.header_size, 2);
    }

    #[test]
    fn test_reserved_mode_bits() {
        assert!(matches!(
            SequencesHeader::parse(&[0x01, 0x01]),
            Err(Error::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_zero_sequences() {
        let mut ctx = context();
        let mut out = Vec::new();
        decode_sequences(&[0x00], &mut ctx, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_zero_sequences_with_trailing_bytes() {
        let mut ctx = context();
        let mut out = Vec::new();
        assert!(decode_sequences(&[0x00, 0x12], &mut ctx, &mut out).is_err());
    }

    #[test]
    fn test_empty_section() {
        let mut ctx = context();
        let mut out = Vec::new();
        assert!(decode_sequences(&[], &mut ctx, &mut out).is_err());
    }

    #[test]
    fn test_rle_sequence() {
        // LL code 5, OF code 2 with extra bits 0b11, ML code 10
        let data = [0x01, modes(1, 1, 1), 5, 2, 10, 0x07];
        let mut ctx = context();
        let mut out = Vec::new();
        decode_sequences(&data, &mut ctx, &mut out).unwrap();

        assert_eq!(out, vec![Sequence::new(5, 10, 4)]);
        assert_eq!(out[0].match_bytes(), 13);
        assert_eq!(ctx.repeat_offsets.offsets(), [4, 1, 4]);
    }

    #[test]
    fn test_rle_repeat_offsets_without_literals() {
        // Offset value 1 with no literals selects the second repeat offset
        let data = [0x02, modes(1, 1, 1), 0, 0, 0, 0x01];
        let mut ctx = context();
        let mut out = Vec::new();
        decode_sequences(&data, &mut ctx, &mut out).unwrap();

        assert_eq!(out, vec![Sequence::new(0, 0, 4), Sequence::new(0, 0, 1)]);
        assert_eq!(ctx.repeat_offsets.offsets(), [1, 4, 8]);
    }

    #[test]
    fn test_repeat_mode_reuses_tables() {
        let mut ctx = context();
        let mut out = Vec::new();
        decode_sequences(&[0x01, modes(1, 1, 1), 5, 2, 10, 0x07], &mut ctx, &mut out).unwrap();

        out.clear();
        decode_sequences(&[0x01, modes(3, 3, 3), 0x07], &mut ctx, &mut out).unwrap();
        assert_eq!(out, vec![Sequence::new(5, 10, 4)]);
    }

    #[test]
    fn test_repeat_mode_without_previous() {
        let mut ctx = context();
        let mut out = Vec::new();
        let result = decode_sequences(&[0x01, modes(3, 1, 1), 2, 10, 0x07], &mut ctx, &mut out);
        assert!(matches!(result, Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn test_rle_symbol_out_of_range() {
        let mut ctx = context();
        let mut out = Vec::new();
        let result = decode_sequences(&[0x01, modes(1, 1, 1), 36, 2, 10, 0x07], &mut ctx, &mut out);
        assert!(result.is_err());
    }

    #[test]
    fn test_bitstream_not_consumed() {
        // One unread bit below the marker
        let data = [0x01, modes(1, 1, 1), 5, 2, 10, 0x0F];
        let mut ctx = context();
        let mut out = Vec::new();
        assert!(decode_sequences(&data, &mut ctx, &mut out).is_err());
    }

    #[test]
    fn test_bitstream_exhausted() {
        // Two extra bits needed but only one present
        let data = [0x01, modes(1, 1, 1), 5, 2, 10, 0x03];
        let mut ctx = context();
        let mut out = Vec::new();
        assert!(decode_sequences(&data, &mut ctx, &mut out).is_err());
    }

    #[test]
    fn test_predefined_tables_build() {
        assert_eq!(cached_ll_table().unwrap().accuracy_log(), 6);
        assert_eq!(cached_of_table().unwrap().accuracy_log(), 5);
        assert_eq!(cached_ml_table().unwrap().accuracy_log(), 6);
    }

    #[test]
    fn test_code_tables_are_contiguous() {
        for window in LITERAL_LENGTH_CODES.windows(2) {
            let (bits, base) = window[0];
            assert_eq!(base + (1 << bits), window[1].1);
        }
        for window in MATCH_LENGTH_CODES.windows(2) {
            let (bits, base) = window[0];
            assert_eq!(base + (1 << bits), window[1].1);
        }
    }

    #[test]
    fn test_repeat_offsets_initial_values() {
        assert_eq!(RepeatOffsets::new().offsets(), [1, 4, 8]);
    }

    #[test]
    fn test_repeat_offsets_new_offset() {
        let mut r = RepeatOffsets::new();
        assert_eq!(r.resolve(103, 5).unwrap(), 100);
        assert_eq!(r.offsets(), [100, 1, 4]);
    }

    #[test]
    fn test_repeat_offsets_with_literals() {
        let mut r = RepeatOffsets::new();
        assert_eq!(r.resolve(1, 5).unwrap(), 1);
        assert_eq!(r.offsets(), [1, 4, 8]);

        assert_eq!(r.resolve(2, 5).unwrap(), 4);
        assert_eq!(r.offsets(), [4, 1, 8]);

        assert_eq!(r.resolve(3, 5).unwrap(), 8);
        assert_eq!(r.offsets(), [8, 4, 1]);
    }

    #[test]
    fn test_repeat_offsets_without_literals() {
        let mut r = RepeatOffsets::new();
        assert_eq!(r.resolve(1, 0).unwrap(), 4);
        assert_eq!(r.offsets(), [4, 1, 8]);

        assert_eq!(r.resolve(2, 0).unwrap(), 8);
        assert_eq!(r.offsets(), [8, 4, 1]);

        assert_eq!(r.resolve(3, 0).unwrap(), 7);
        assert_eq!(r.offsets(), [7, 8, 4]);
    }

    #[test]
    fn test_repeat_offsets_minus_one_to_zero() {
        let mut r = RepeatOffsets::new();
        assert!(r.resolve(3, 0).is_err());
    }

    #[test]
    fn test_offset_value_zero() {
        assert!(RepeatOffsets::new().resolve(0, 1).is_err());
    }
}
