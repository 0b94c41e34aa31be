//! Rekor transparency log entry bodies
//!
//! Parses the canonicalized body of a log entry into a typed value for each
//! supported `kind`/`apiVersion` pair: `hashedrekord` 0.0.1 and 0.0.2,
//! `intoto` 0.0.2, and `dsse` 0.0.1 and 0.0.2.

pub mod body;
pub mod error;

pub use body::RekorEntryBody;
pub use error::{Error, Result};
