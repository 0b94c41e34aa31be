//! RFC 3161 timestamp token support
//!
//! Parses timestamp tokens embedded in Sigstore bundles and checks that a
//! token covers a given signature and was signed by a given key. Choosing
//! which timestamp authority to trust, and validating its certificate chain,
//! is left to the caller.

pub mod asn1;
pub mod error;
pub mod timestamp;

pub use error::{Error, Result};
pub use timestamp::Rfc3161Timestamp;
