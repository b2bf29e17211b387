//! FSE decoding tables.
//!
//! ## Table Parsing
//!
//! FSE tables can be parsed from compressed headers using `FseTable::parse()`.
//! The header format (RFC 8878 Section 4.1.1):
//! - 4 bits: accuracy_log - 5 (so actual log = value + 5)
//! - Variable-length encoded symbol probabilities, with a 2-bit repeat
//!   flag run after every zero probability

use unzst_core::{Error, Result};

use crate::bits::{highest_bit, ForwardBitReader};

/// Largest accuracy log any Zstandard table uses.
pub const FSE_MAX_ACCURACY_LOG: u8 = 9;

/// Smallest accuracy log an explicit table header can describe.
pub const FSE_MIN_ACCURACY_LOG: u8 = 5;

/// A single entry in an FSE decoding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FseTableEntry {
    /// Base value to add to the read bits to get the next state.
    pub baseline: u16,
    /// Number of bits to read from the bitstream for the next state.
    pub num_bits: u8,
    /// The symbol this state decodes to.
    pub symbol: u8,
}

impl FseTableEntry {
    /// Create a new FSE table entry.
    #[inline]
    pub const fn new(symbol: u8, num_bits: u8, baseline: u16) -> Self {
        Self {
            baseline,
            num_bits,
            symbol,
        }
    }
}

/// FSE decoding table.
///
/// Table size = 1 << accuracy_log. An RLE table has a single entry and an
/// accuracy log of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FseTable {
    entries: Vec<FseTableEntry>,
    accuracy_log: u8,
}

impl FseTable {
    /// Build a decoding table from a normalized distribution.
    ///
    /// `normalized[s]` is the probability of symbol `s` in table slots, with
    /// `-1` marking a "less than one" probability that takes a single slot.
    pub fn build(normalized: &[i16], accuracy_log: u8) -> Result<Self> {
        if accuracy_log > FSE_MAX_ACCURACY_LOG {
            return Err(Error::invalid(format!(
                "FSE accuracy log {} exceeds maximum {}",
                accuracy_log, FSE_MAX_ACCURACY_LOG
            )));
        }
        if normalized.is_empty() || normalized.len() > 256 {
            return Err(Error::invalid("FSE distribution has no usable symbols"));
        }

        let table_size = 1usize << accuracy_log;
        let mut slot_sum = 0i64;
        for &count in normalized {
            match count {
                -1 => slot_sum += 1,
                c if c >= 0 => slot_sum += i64::from(c),
                _ => return Err(Error::invalid("FSE probability below -1")),
            }
        }
        if slot_sum != table_size as i64 {
            return Err(Error::invalid(format!(
                "FSE probabilities sum to {} but expected {}",
                slot_sum, table_size
            )));
        }

        let mut entries = vec![FseTableEntry::default(); table_size];
        let mut symbol_next = vec![0u32; normalized.len()];

        // Low-probability symbols take the highest slots, one each
        let mut high_threshold = table_size;
        for (symbol, &count) in normalized.iter().enumerate() {
            if count == -1 {
                high_threshold -= 1;
                entries[high_threshold].symbol = symbol as u8;
                symbol_next[symbol] = 1;
            } else {
                symbol_next[symbol] = count as u32;
            }
        }

        let step = (table_size >> 1) + (table_size >> 3) + 3;
        let mask = table_size - 1;
        let mut position = 0usize;
        for (symbol, &count) in normalized.iter().enumerate() {
            for _ in 0..count.max(0) {
                entries[position].symbol = symbol as u8;
                loop {
                    position = (position + step) & mask;
                    if position < high_threshold {
                        break;
                    }
                }
            }
        }
        if position != 0 {
            return Err(Error::invalid("FSE spread did not cover the table"));
        }

        for entry in entries.iter_mut() {
            let next = &mut symbol_next[entry.symbol as usize];
            let state = *next;
            *next += 1;
            let num_bits = u32::from(accuracy_log) - highest_bit(state);
            entry.num_bits = num_bits as u8;
            entry.baseline = ((state << num_bits) as usize - table_size) as u16;
        }

        Ok(Self {
            entries,
            accuracy_log,
        })
    }

    /// Table that always decodes `symbol` and never reads bits.
    pub fn rle(symbol: u8) -> Self {
        Self {
            entries: vec![FseTableEntry::new(symbol, 0, 0)],
            accuracy_log: 0,
        }
    }

    /// Parse an FSE table header and build the table.
    ///
    /// Returns the table and the number of header bytes consumed.
    pub fn parse(data: &[u8], max_accuracy_log: u8, max_symbol: u8) -> Result<(Self, usize)> {
        let (normalized, accuracy_log, consumed) =
            read_normalized_counts(data, max_accuracy_log, max_symbol)?;
        let table = Self::build(&normalized, accuracy_log)?;
        Ok((table, consumed))
    }

    /// Look up the entry for `state`.
    #[inline]
    pub fn decode(&self, state: usize) -> &FseTableEntry {
        &self.entries[state & (self.entries.len() - 1)]
    }

    /// Log2 of the table size.
    #[inline]
    pub fn accuracy_log(&self) -> u8 {
        self.accuracy_log
    }

    /// Number of states.
    #[inline]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Highest symbol any state decodes to.
    pub fn max_symbol(&self) -> u8 {
        self.entries.iter().map(|e| e.symbol).max().unwrap_or(0)
    }
}

/// Read a normalized-count header.
///
/// Returns the per-symbol probabilities, the accuracy log, and the header
/// length in bytes (a partially used final byte counts as consumed).
pub fn read_normalized_counts(
    data: &[u8],
    max_accuracy_log: u8,
    max_symbol: u8,
) -> Result<(Vec<i16>, u8, usize)> {
    if data.is_empty() {
        return Err(Error::invalid("empty FSE table header"));
    }

    let mut bits = ForwardBitReader::new(data);
    let accuracy_log = bits.read_bits(4)? as u8 + FSE_MIN_ACCURACY_LOG;
    if accuracy_log > max_accuracy_log {
        return Err(Error::invalid(format!(
            "FSE accuracy log {} exceeds maximum {}",
            accuracy_log, max_accuracy_log
        )));
    }

    let table_size = 1i32 << accuracy_log;
    // One more than the probability still to be distributed
    let mut remaining = table_size + 1;
    let mut threshold = table_size;
    let mut nb_bits = u32::from(accuracy_log) + 1;
    let mut normalized: Vec<i16> = Vec::with_capacity(max_symbol as usize + 1);
    let mut previous_zero = false;

    while remaining > 1 {
        if previous_zero {
            loop {
                let repeat = bits.read_bits(2)?;
                for _ in 0..repeat {
                    normalized.push(0);
                }
                if repeat != 3 {
                    break;
                }
            }
        }
        if normalized.len() > max_symbol as usize {
            return Err(Error::invalid(format!(
                "FSE table describes symbols beyond {}",
                max_symbol
            )));
        }

        let max = 2 * threshold - 1 - remaining;
        let low = bits.read_bits(nb_bits - 1)? as i32;
        let value = if low < max {
            low
        } else {
            let high = bits.read_bits(1)? as i32;
            let full = low | (high << (nb_bits - 1));
            if full >= threshold {
                full - max
            } else {
                full
            }
        };

        let count = value - 1;
        remaining -= count.abs();
        if remaining < 1 {
            return Err(Error::invalid("FSE probabilities exceed table size"));
        }
        normalized.push(count as i16);
        previous_zero = count == 0;

        while remaining < threshold {
            nb_bits -= 1;
            threshold >>= 1;
        }
    }

    Ok((normalized, accuracy_log, bits.bytes_consumed()))
}

/// Default distribution for Literal Length codes (accuracy_log = 6).
/// From RFC 8878 Section 3.1.1.3.2.2.1
pub const LITERAL_LENGTH_DEFAULT_DISTRIBUTION: [i16; 36] = [
    4, 3, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 3, 2, 1, 1, 1, 1, 1,
    -1, -1, -1, -1,
];

/// Default distribution for Match Length codes (accuracy_log = 6).
/// From RFC 8878 Section 3.1.1.3.2.2.2
pub const MATCH_LENGTH_DEFAULT_DISTRIBUTION: [i16; 53] = [
    1, 4, 3, 2, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -1, -1, -1, -1, -1, -1, -1,
];

/// Default distribution for Offset codes (accuracy_log = 5).
/// From RFC 8878 Section 3.1.1.3.2.2.3
pub const OFFSET_DEFAULT_DISTRIBUTION: [i16; 29] = [
    1, 1, 1, 1, 1, 1, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -1, -1, -1, -1, -1,
];
