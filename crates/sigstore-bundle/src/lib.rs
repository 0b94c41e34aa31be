//! Bundle shape validation for Sigstore
//!
//! This crate checks raw bundles (versions 0.1, 0.2 and 0.3) against the
//! required-field rules of their media type and narrows them into
//! [`ValidatedBundle`] values that downstream verification can rely on.

pub mod error;
pub mod validated;
pub mod validation;

pub use error::{Error, Result};
pub use validated::{
    Content, KeyMaterial, SignedEnvelope, SignedMessage, TlogEntry, ValidatedBundle,
};
pub use validation::validate_bundle;

// Re-export the wire type for convenience
pub use sigstore_types::{Bundle, MediaType};
