//! Error types for sigstore-crypto

use thiserror::Error;

/// Errors from cryptographic operations
#[derive(Error, Debug)]
pub enum Error {
    /// Public key bytes could not be interpreted
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    /// Algorithm, curve or scheme is not supported
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature does not verify
    #[error("signature verification failed")]
    VerificationFailed,

    /// Certificate could not be parsed or is malformed
    #[error("certificate error: {0}")]
    Certificate(String),

    /// DER decoding or encoding failed
    #[error("DER error: {0}")]
    Der(#[from] der::Error),
}

/// Result type for sigstore-crypto operations
pub type Result<T> = std::result::Result<T, Error>;
