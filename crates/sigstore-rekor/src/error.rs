//! Error types for sigstore-rekor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The body JSON does not match the schema for its kind
    #[error("failed to parse entry body: {0}")]
    Json(#[from] serde_json::Error),

    /// The body declares a different kind or version than the bundle entry
    #[error("entry body is {actual_kind}/{actual_version}, expected {expected_kind}/{expected_version}")]
    KindVersionMismatch {
        expected_kind: String,
        expected_version: String,
        actual_kind: String,
        actual_version: String,
    },

    /// No schema is known for this kind and version
    #[error("unsupported entry kind {kind} version {version}")]
    Unsupported { kind: String, version: String },
}

pub type Result<T> = std::result::Result<T, Error>;
