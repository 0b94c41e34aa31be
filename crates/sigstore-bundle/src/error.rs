//! Error types for sigstore-bundle

use thiserror::Error;

/// Errors from bundle validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// One or more required fields are missing or invalid
    #[error("invalid bundle, offending fields: {}", fields.join(", "))]
    Validation { fields: Vec<String> },
}

impl Error {
    /// Offending field paths
    pub fn fields(&self) -> &[String] {
        match self {
            Error::Validation { fields } => fields,
        }
    }
}

/// Result type for bundle operations
pub type Result<T> = std::result::Result<T, Error>;
