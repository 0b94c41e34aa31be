//! Offline Sigstore bundle verification
//!
//! Verifies that a bundle's signature was produced by a trusted signer at a
//! time vouched for by a trusted log or timestamp authority, using only the
//! supplied trust material. Nothing is fetched over the network.
//!
//! # Example
//!
//! ```no_run
//! use sigstore_verify::trust_root::{KeySource, TrustMaterial, TrustedRoot};
//! use sigstore_verify::types::Bundle;
//! use sigstore_verify::{VerificationPolicy, Verifier, VerifierOptions};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = TrustedRoot::from_file("trusted_root.json")?;
//! let trust = TrustMaterial::from_trusted_root(&root, KeySource::default())?;
//! let bundle = Bundle::from_json(&std::fs::read_to_string("artifact.sigstore.json")?)?;
//! let artifact = std::fs::read("artifact.txt")?;
//!
//! let policy = VerificationPolicy::default()
//!     .require_identity("^https://github.com/example/")
//!     .require_issuer("https://token.actions.githubusercontent.com");
//!
//! let signer = Verifier::new(&trust, VerifierOptions::default())
//!     .verify(&bundle, Some(&artifact), &policy)?;
//! println!("signed by {:?}", signer.identity);
//! # Ok(())
//! # }
//! ```

pub mod error;
mod verify;

// Private submodules for verification logic
mod verify_impl;

// Re-export core types that users need
pub use sigstore_bundle as bundle;
pub use sigstore_crypto as crypto;
pub use sigstore_merkle as merkle;
pub use sigstore_rekor as rekor;
pub use sigstore_trust_root as trust_root;
pub use sigstore_tsa as tsa;
pub use sigstore_types as types;

pub use error::{Error, ErrorCode, Result};
pub use verify::{
    verify, CertificateExtensions, CertificateIdentity, Signer, VerificationPolicy, Verifier,
    VerifierOptions,
};
pub use verify_impl::policy::{verify_extensions, verify_subject_alternative_name};
