//! Cryptographic primitives for Sigstore verification
//!
//! Digests, constant-time comparison, public-key signature verification
//! (ECDSA, Ed25519, RSA) backed by `aws-lc-rs`, and an X.509 certificate
//! wrapper exposing the fields a Sigstore verifier inspects.

pub mod error;
pub mod hash;
pub mod signing;
pub mod x509;

pub use error::{Error, Result};
pub use hash::{constant_time_eq, digest, sha256};
pub use signing::{spki_to_der, KeyType, PublicKey, SigningScheme};
pub use x509::Certificate;
