//! Error types for sigstore-trust-root

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A key or certificate in the trusted root could not be used
    #[error("invalid trust material: {0}")]
    InvalidMaterial(String),

    /// No trusted public key is known for the hint
    #[error("no trusted public key for hint {0:?}")]
    KeyNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
