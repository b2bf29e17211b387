//! Huffman stream decoding and tree description parsing.

use unzst_core::{Error, Result};

use super::table::HuffmanTable;
use super::{HUFFMAN_MAX_BITS, HUFFMAN_MAX_SYMBOLS, HUFFMAN_MAX_WEIGHT_ACCURACY_LOG};
use crate::bits::BackwardBitReader;
use crate::fse::{read_normalized_counts, FseDecoder, FseTable};

/// Decodes literal bytes with a Huffman table.
#[derive(Debug, Clone, Copy)]
pub struct HuffmanDecoder<'a> {
    table: &'a HuffmanTable,
}

impl<'a> HuffmanDecoder<'a> {
    /// Create a new decoder with the given table.
    pub fn new(table: &'a HuffmanTable) -> Self {
        Self { table }
    }

    /// Decode one symbol from the bitstream.
    #[inline]
    pub fn decode_symbol(&self, bits: &mut BackwardBitReader<'_>) -> u8 {
        let index = bits.peek_bits(u32::from(self.table.max_bits())) as usize;
        let entry = self.table.decode(index);
        bits.consume(u32::from(entry.num_bits));
        entry.symbol
    }

    /// Decode exactly `regenerated` symbols from one stream into `output`.
    ///
    /// The stream must be consumed exactly.
    pub fn decode_stream(&self, stream: &[u8], regenerated: usize, output: &mut Vec<u8>) -> Result<()> {
        let mut bits = BackwardBitReader::new(stream)?;
        for _ in 0..regenerated {
            output.push(self.decode_symbol(&mut bits));
        }
        if !bits.is_finished() {
            return Err(Error::invalid(format!(
                "Huffman stream has {} bits left after {} symbols",
                bits.bits_remaining(),
                regenerated
            )));
        }
        Ok(())
    }
}

/// Parse a Huffman tree description.
///
/// Returns the transmitted weights (the last symbol's weight is implied)
/// and the number of bytes consumed, header byte included.
pub fn parse_huffman_weights(data: &[u8]) -> Result<(Vec<u8>, usize)> {
    let header = match data.first() {
        Some(&byte) => byte as usize,
        None => return Err(Error::invalid("missing Huffman tree description")),
    };

    if header < 128 {
        let end = 1 + header;
        if header == 0 || data.len() < end {
            return Err(Error::invalid(format!(
                "Huffman weight stream of {} bytes does not fit",
                header
            )));
        }
        let weights = decode_fse_weights(&data[1..end])?;
        Ok((weights, end))
    } else {
        let num_weights = header - 127;
        let end = 1 + (num_weights + 1) / 2;
        if data.len() < end {
            return Err(Error::invalid("truncated direct Huffman weights"));
        }
        let weights = (0..num_weights)
            .map(|i| {
                let byte = data[1 + i / 2];
                if i % 2 == 0 {
                    byte >> 4
                } else {
                    byte & 0x0F
                }
            })
            .collect();
        Ok((weights, end))
    }
}

/// Decode FSE-compressed weights: a normalized-count header followed by a
/// backward bitstream read with two interleaved states. Weights are symbols
/// of that table, so it may not describe any above the longest code length.
fn decode_fse_weights(payload: &[u8]) -> Result<Vec<u8>> {
    let (normalized, accuracy_log, header_len) =
        read_normalized_counts(payload, HUFFMAN_MAX_WEIGHT_ACCURACY_LOG, HUFFMAN_MAX_BITS)?;
    let table = FseTable::build(&normalized, accuracy_log)?;

    let stream = &payload[header_len..];
    let mut bits = BackwardBitReader::new(stream)?;
    let mut first = FseDecoder::new(&table);
    let mut second = FseDecoder::new(&table);
    first.init_state(&mut bits);
    second.init_state(&mut bits);
    if bits.is_overflowed() {
        return Err(Error::invalid("Huffman weight stream too short"));
    }

    let mut weights = Vec::with_capacity(HUFFMAN_MAX_SYMBOLS);
    loop {
        weights.push(first.decode_symbol(&mut bits));
        if bits.is_overflowed() {
            weights.push(second.peek_symbol());
            break;
        }
        weights.push(second.decode_symbol(&mut bits));
        if bits.is_overflowed() {
            weights.push(first.peek_symbol());
            break;
        }
        if weights.len() >= HUFFMAN_MAX_SYMBOLS {
            return Err(Error::invalid("Huffman weight stream decodes too many weights"));
        }
    }
    Ok(weights)
}

/// Parse a tree description and build its table.
///
/// Returns the table and the number of bytes consumed.
pub fn read_huffman_table(data: &[u8]) -> Result<(HuffmanTable, usize)> {
    let (weights, consumed) = parse_huffman_weights(data)?;
    let table = HuffmanTable::from_weights(&weights)?;
    Ok((table, consumed))
}
