//! Error types for sigstore-tsa

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// DER structure could not be decoded
    #[error("DER error: {0}")]
    Der(#[from] der::Error),

    /// The token is structurally valid DER but not a usable timestamp token
    #[error("malformed timestamp token: {0}")]
    Malformed(String),

    /// The timestamp response reports a failure status
    #[error("timestamp response status {0} is not granted")]
    Rejected(u32),

    /// The message imprint does not cover the supplied data
    #[error("message imprint does not match the timestamped data")]
    ImprintMismatch,

    /// The signed messageDigest attribute does not match the TSTInfo
    #[error("messageDigest attribute does not match TSTInfo")]
    MessageDigestMismatch,

    /// Unknown digest algorithm OID
    #[error("unsupported digest algorithm {0}")]
    UnsupportedDigest(String),

    /// Signature check failed
    #[error("signature verification failed: {0}")]
    Signature(#[from] sigstore_crypto::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
