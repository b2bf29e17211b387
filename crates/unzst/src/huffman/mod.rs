//! Huffman coding for Zstandard literals.
//!
//! Zstd uses canonical Huffman codes described only by per-symbol weights.
//! The description is either FSE-compressed or stored as packed 4-bit
//! weights. Code length is `max_bits + 1 - weight`; weight 0 marks an absent
//! symbol.
//!
//! ## References
//!
//! - [RFC 8878 Section 4.2](https://datatracker.ietf.org/doc/html/rfc8878#section-4.2)

mod decoder;
mod table;

pub use decoder::{parse_huffman_weights, read_huffman_table, HuffmanDecoder};
pub use table::{HuffmanTable, HuffmanTableEntry};

/// Maximum number of symbols in a Huffman table (0-255 for literals).
pub const HUFFMAN_MAX_SYMBOLS: usize = 256;

/// Maximum number of bits for a Huffman code.
pub const HUFFMAN_MAX_BITS: u8 = 11;

/// Largest accuracy log of an FSE-compressed weight table.
pub const HUFFMAN_MAX_WEIGHT_ACCURACY_LOG: u8 = 6;
