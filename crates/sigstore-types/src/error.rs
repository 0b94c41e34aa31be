//! Error types for sigstore-types

use thiserror::Error;

/// Errors that can occur when decoding Sigstore data structures
#[derive(Error, Debug)]
pub enum Error {
    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 payload could not be decoded
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Hex string could not be decoded
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Media type is not a recognized bundle media type
    #[error("invalid media type: {0}")]
    InvalidMediaType(String),

    /// Checkpoint text is malformed
    #[error("invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    /// A hash value had the wrong length
    #[error("invalid hash length: expected {expected}, got {actual}")]
    InvalidHashLength { expected: usize, actual: usize },

    /// Reading a document from disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sigstore-types operations
pub type Result<T> = std::result::Result<T, Error>;
