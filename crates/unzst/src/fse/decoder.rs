//! FSE stream decoder.

use super::table::FseTable;
use crate::bits::BackwardBitReader;

/// FSE state machine over a shared backward bitstream.
///
/// Several decoders may read from one bitstream; the caller decides the
/// interleaving order.
#[derive(Debug, Clone)]
pub struct FseDecoder<'a> {
    table: &'a FseTable,
    state: usize,
}

impl<'a> FseDecoder<'a> {
    /// Create a new FSE decoder with the given table.
    pub fn new(table: &'a FseTable) -> Self {
        Self { table, state: 0 }
    }

    /// Initialize the state by reading `accuracy_log` bits.
    pub fn init_state(&mut self, bits: &mut BackwardBitReader<'_>) {
        self.state = bits.read_bits(u32::from(self.table.accuracy_log())) as usize;
    }

    /// Symbol for the current state.
    #[inline]
    pub fn peek_symbol(&self) -> u8 {
        self.table.decode(self.state).symbol
    }

    /// Move to the next state by reading the entry's transition bits.
    #[inline]
    pub fn update_state(&mut self, bits: &mut BackwardBitReader<'_>) {
        let entry = self.table.decode(self.state);
        let add = bits.read_bits(u32::from(entry.num_bits)) as usize;
        self.state = entry.baseline as usize + add;
    }

    /// Emit the current symbol, then update state.
    #[inline]
    pub fn decode_symbol(&mut self, bits: &mut BackwardBitReader<'_>) -> u8 {
        let symbol = self.peek_symbol();
        self.update_state(bits);
        symbol
    }

    /// Current state.
    pub fn state(&self) -> usize {
        self.state
    }
}
