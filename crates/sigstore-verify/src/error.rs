//! Error types for sigstore-verify
//!
//! Every failure carries one of a fixed set of codes so callers can tell
//! which stage of verification rejected the bundle.

use thiserror::Error;

/// Stable classification of a verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Validation,
    Certificate,
    PublicKey,
    Tlog,
    TlogBody,
    TlogInclusionProof,
    TlogInclusionPromise,
    Timestamp,
    Signature,
    UntrustedSigner,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::Certificate => "CERTIFICATE_ERROR",
            ErrorCode::PublicKey => "PUBLIC_KEY_ERROR",
            ErrorCode::Tlog => "TLOG_ERROR",
            ErrorCode::TlogBody => "TLOG_BODY_ERROR",
            ErrorCode::TlogInclusionProof => "TLOG_INCLUSION_PROOF_ERROR",
            ErrorCode::TlogInclusionPromise => "TLOG_INCLUSION_PROMISE_ERROR",
            ErrorCode::Timestamp => "TIMESTAMP_ERROR",
            ErrorCode::Signature => "SIGNATURE_ERROR",
            ErrorCode::UntrustedSigner => "UNTRUSTED_SIGNER_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from bundle verification
#[derive(Error, Debug)]
pub enum Error {
    /// The bundle does not have the shape its media type requires
    #[error("bundle validation failed: {0}")]
    Validation(#[from] sigstore_bundle::Error),

    /// Certificate chain, profile or SCT check failed
    #[error("certificate verification failed: {0}")]
    Certificate(String),

    /// The signer key could not be resolved or is not valid at signing time
    #[error("public key verification failed: {0}")]
    PublicKey(String),

    /// Not enough transparency log entries verified
    #[error("transparency log verification failed: {0}")]
    Tlog(String),

    /// A log entry body does not match the bundle content
    #[error("transparency log entry body mismatch: {0}")]
    TlogBody(String),

    /// Inclusion proof or checkpoint check failed
    #[error("inclusion proof verification failed: {0}")]
    TlogInclusionProof(String),

    /// Signed entry timestamp check failed
    #[error("inclusion promise verification failed: {0}")]
    TlogInclusionPromise(String),

    /// Timestamp evidence is invalid or insufficient
    #[error("timestamp verification failed: {0}")]
    Timestamp(String),

    /// The content signature does not verify
    #[error("signature verification failed: {0}")]
    Signature(String),

    /// The signer does not satisfy the verification policy
    #[error("untrusted signer: {0}")]
    UntrustedSigner(String),
}

impl Error {
    /// The classification of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Validation(_) => ErrorCode::Validation,
            Error::Certificate(_) => ErrorCode::Certificate,
            Error::PublicKey(_) => ErrorCode::PublicKey,
            Error::Tlog(_) => ErrorCode::Tlog,
            Error::TlogBody(_) => ErrorCode::TlogBody,
            Error::TlogInclusionProof(_) => ErrorCode::TlogInclusionProof,
            Error::TlogInclusionPromise(_) => ErrorCode::TlogInclusionPromise,
            Error::Timestamp(_) => ErrorCode::Timestamp,
            Error::Signature(_) => ErrorCode::Signature,
            Error::UntrustedSigner(_) => ErrorCode::UntrustedSigner,
        }
    }
}

/// Result type for verification operations
pub type Result<T> = std::result::Result<T, Error>;
