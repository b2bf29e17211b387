//! Finite State Entropy (FSE) decoding.
//!
//! FSE is the table-driven entropy coder used for sequence codes and for
//! compressed Huffman weights. Each decode step emits the symbol of the
//! current state and reads a few bits to reach the next state.
//!
//! ## Table sources
//!
//! - **Predefined**: fixed distributions for literal-length, match-length and
//!   offset codes, cached with `OnceLock` after first use.
//! - **RLE**: a single symbol, zero bits per step.
//! - **Compressed**: an explicit normalized-count header.
//! - **Repeat**: the previous table of the same kind within a frame.
//!
//! ## References
//!
//! - [RFC 8878 Section 4.1](https://datatracker.ietf.org/doc/html/rfc8878#section-4.1)
//! - [FSE Educational Decoder](https://github.com/facebook/zstd/blob/dev/doc/educational_decoder.md)

mod decoder;
mod table;

use std::sync::OnceLock;

use unzst_core::{Error, Result};

pub use decoder::FseDecoder;
pub use table::{
    read_normalized_counts, FseTable, FseTableEntry, FSE_MAX_ACCURACY_LOG, FSE_MIN_ACCURACY_LOG,
    LITERAL_LENGTH_DEFAULT_DISTRIBUTION, MATCH_LENGTH_DEFAULT_DISTRIBUTION,
    OFFSET_DEFAULT_DISTRIBUTION,
};

static CACHED_LL_TABLE: OnceLock<Option<FseTable>> = OnceLock::new();
static CACHED_OF_TABLE: OnceLock<Option<FseTable>> = OnceLock::new();
static CACHED_ML_TABLE: OnceLock<Option<FseTable>> = OnceLock::new();

fn cached(
    cell: &'static OnceLock<Option<FseTable>>,
    distribution: &[i16],
    accuracy_log: u8,
) -> Result<&'static FseTable> {
    cell.get_or_init(|| FseTable::build(distribution, accuracy_log).ok())
        .as_ref()
        .ok_or_else(|| Error::invalid("predefined FSE distribution rejected"))
}

/// Predefined literal-length table, built on first use.
#[inline]
pub fn cached_ll_table() -> Result<&'static FseTable> {
    cached(
        &CACHED_LL_TABLE,
        &LITERAL_LENGTH_DEFAULT_DISTRIBUTION,
        LITERAL_LENGTH_ACCURACY_LOG,
    )
}

/// Predefined offset table, built on first use.
#[inline]
pub fn cached_of_table() -> Result<&'static FseTable> {
    cached(&CACHED_OF_TABLE, &OFFSET_DEFAULT_DISTRIBUTION, OFFSET_ACCURACY_LOG)
}

/// Predefined match-length table, built on first use.
#[inline]
pub fn cached_ml_table() -> Result<&'static FseTable> {
    cached(
        &CACHED_ML_TABLE,
        &MATCH_LENGTH_DEFAULT_DISTRIBUTION,
        MATCH_LENGTH_ACCURACY_LOG,
    )
}

/// Accuracy log of the predefined literal-length distribution.
pub const LITERAL_LENGTH_ACCURACY_LOG: u8 = 6;

/// Accuracy log of the predefined match-length distribution.
pub const MATCH_LENGTH_ACCURACY_LOG: u8 = 6;

/// Accuracy log of the predefined offset distribution.
pub const OFFSET_ACCURACY_LOG: u8 = 5;
