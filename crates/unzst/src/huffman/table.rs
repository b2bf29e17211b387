//! Huffman decoding tables.

use unzst_core::{Error, Result};

use super::{HUFFMAN_MAX_BITS, HUFFMAN_MAX_SYMBOLS};
use crate::bits::highest_bit;

/// Entry in the Huffman decoding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HuffmanTableEntry {
    /// The decoded symbol (literal byte value).
    pub symbol: u8,
    /// Number of bits consumed for this symbol.
    pub num_bits: u8,
}

/// Single-level Huffman decoding table.
///
/// Indexed by the next `max_bits` bits of the stream. A symbol with code
/// length `n` fills `1 << (max_bits - n)` consecutive entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTable {
    entries: Vec<HuffmanTableEntry>,
    max_bits: u8,
    num_symbols: usize,
}

impl HuffmanTable {
    /// Build a decoding table from transmitted weights.
    ///
    /// `weights[s]` is the weight of symbol `s`, zero for absent symbols.
    /// The weight of the final symbol (`weights.len()`) is not transmitted;
    /// it is derived so that the weights complete a power of two.
    pub fn from_weights(weights: &[u8]) -> Result<Self> {
        if weights.is_empty() || weights.len() >= HUFFMAN_MAX_SYMBOLS {
            return Err(Error::invalid(format!(
                "Huffman description has {} weights",
                weights.len()
            )));
        }

        let mut weight_sum = 0u32;
        for &w in weights {
            if w > HUFFMAN_MAX_BITS {
                return Err(Error::invalid(format!("Huffman weight {} too large", w)));
            }
            if w > 0 {
                weight_sum += 1 << (w - 1);
            }
        }
        if weight_sum == 0 {
            return Err(Error::invalid("Huffman weights are all zero"));
        }

        let max_bits = highest_bit(weight_sum) + 1;
        if max_bits > u32::from(HUFFMAN_MAX_BITS) {
            return Err(Error::invalid(format!(
                "Huffman code length {} exceeds {}",
                max_bits, HUFFMAN_MAX_BITS
            )));
        }
        let left = (1u32 << max_bits) - weight_sum;
        if !left.is_power_of_two() {
            return Err(Error::invalid("Huffman weights do not sum to a power of two"));
        }
        let last_weight = (highest_bit(left) + 1) as u8;

        let mut rank_count = [0u32; HUFFMAN_MAX_BITS as usize + 1];
        for &w in weights.iter().chain(std::iter::once(&last_weight)) {
            rank_count[w as usize] += 1;
        }

        let mut rank_start = [0usize; HUFFMAN_MAX_BITS as usize + 1];
        let mut position = 0usize;
        for w in 1..=max_bits as usize {
            rank_start[w] = position;
            position += (rank_count[w] as usize) << (w - 1);
        }

        let table_size = 1usize << max_bits;
        let mut entries = vec![HuffmanTableEntry::default(); table_size];
        let mut num_symbols = 0;
        for (symbol, &w) in weights
            .iter()
            .chain(std::iter::once(&last_weight))
            .enumerate()
        {
            if w == 0 {
                continue;
            }
            num_symbols += 1;
            let span = 1usize << (w - 1);
            let start = rank_start[w as usize];
            let entry = HuffmanTableEntry {
                symbol: symbol as u8,
                num_bits: (max_bits + 1 - u32::from(w)) as u8,
            };
            entries[start..start + span].fill(entry);
            rank_start[w as usize] += span;
        }

        Ok(Self {
            entries,
            max_bits: max_bits as u8,
            num_symbols,
        })
    }

    /// Get the table size.
    #[inline]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Get the maximum bits (table log).
    #[inline]
    pub fn max_bits(&self) -> u8 {
        self.max_bits
    }

    /// Number of symbols with a code.
    #[inline]
    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    /// Look up the entry for the next `max_bits` bits.
    #[inline]
    pub fn decode(&self, index: usize) -> &HuffmanTableEntry {
        &self.entries[index & (self.entries.len() - 1)]
    }
}
