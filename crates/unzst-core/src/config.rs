//! Decoder configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default ceiling on a frame's window size (128 MiB).
pub const DEFAULT_MAX_WINDOW_SIZE: u64 = 1 << 27;

/// Default ceiling on eager output reservation (8 MiB).
pub const DEFAULT_OUTPUT_RESERVE_LIMIT: usize = 8 * 1024 * 1024;

/// Configuration for frame decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecoderConfig {
    /// Largest window a frame may declare (default: 128 MiB).
    pub max_window_size: u64,

    /// Compare the frame trailer against the content hash.
    pub verify_checksum: bool,

    /// Reject frames whose output length differs from the declared content size.
    pub verify_content_size: bool,

    /// Upper bound on output capacity reserved up front from a declared
    /// content size (default: 8 MiB).
    pub output_reserve_limit: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            max_window_size: DEFAULT_MAX_WINDOW_SIZE,
            verify_checksum: true,
            verify_content_size: true,
            output_reserve_limit: DEFAULT_OUTPUT_RESERVE_LIMIT,
        }
    }
}

impl DecoderConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window size ceiling.
    pub fn with_max_window_size(mut self, max_window_size: u64) -> Self {
        self.max_window_size = max_window_size;
        self
    }

    /// Enable or disable trailer checksum verification.
    pub fn with_verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    /// Enable or disable content size verification.
    pub fn with_verify_content_size(mut self, verify: bool) -> Self {
        self.verify_content_size = verify;
        self
    }

    /// Set the eager output reservation limit.
    pub fn with_output_reserve_limit(mut self, limit: usize) -> Self {
        self.output_reserve_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.max_window_size, 128 * 1024 * 1024);
        assert!(config.verify_checksum);
        assert!(config.verify_content_size);
    }

    #[test]
    fn test_builder() {
        let config = DecoderConfig::new()
            .with_max_window_size(1 << 20)
            .with_verify_checksum(false)
            .with_output_reserve_limit(4096);
        assert_eq!(config.max_window_size, 1 << 20);
        assert!(!config.verify_checksum);
        assert!(config.verify_content_size);
        assert_eq!(config.output_reserve_limit, 4096);
    }
}
