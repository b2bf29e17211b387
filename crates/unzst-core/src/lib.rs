//! # Unzst Core
//!
//! Shared vocabulary for the unzst decoder: the error type, decoder
//! configuration, statistics, and the [`Decompressor`] trait.
//!
//! ## Example
//!
//! ```ignore
//! use unzst::ZstdDecoder;
//! use unzst_core::{DecoderConfig, Decompressor};
//!
//! let mut decoder = ZstdDecoder::with_config(DecoderConfig::new().with_verify_checksum(false));
//! let original = decoder.decompress(&compressed)?;
//! ```

pub mod config;
pub mod error;
pub mod stats;
pub mod traits;

pub use config::{DecoderConfig, DEFAULT_MAX_WINDOW_SIZE, DEFAULT_OUTPUT_RESERVE_LIMIT};
pub use error::{Error, Result};
pub use stats::DecodeStats;
pub use traits::Decompressor;
