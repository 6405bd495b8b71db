//! Error types for sucisim

use thiserror::Error;

/// Error types for the sucisim library.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A fixed-size cryptographic input had the wrong length.
    #[error("Invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Name of the offending field (e.g. "K", "OPc", "AMF")
        field: &'static str,
        /// Required length in bytes
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// Hex decoding errors.
    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}
