//! Sigstore trusted root parsing and trust material
//!
//! A [`TrustedRoot`] is the JSON document distributed by a Sigstore
//! deployment. It lists the trust anchors a verifier needs:
//! - certificate authorities that issue signing certificates
//! - transparency log keys
//! - certificate transparency log keys
//! - timestamp authority chains
//!
//! [`TrustMaterial`] is the parsed, query-ready form of that document plus a
//! [`KeySource`] for signers identified by a bare public key. Build it once
//! and share it between verifications.
//!
//! ```no_run
//! use sigstore_trust_root::{KeySource, TrustMaterial, TrustedRoot};
//!
//! # fn example() -> Result<(), sigstore_trust_root::Error> {
//! let root = TrustedRoot::from_file("trusted_root.json")?;
//! let material = TrustMaterial::from_trusted_root(&root, KeySource::default())?;
//! println!("{} certificate authorities", material.certificate_authorities.len());
//! # Ok(())
//! # }
//! ```
//!
//! Fetching and refreshing the document is out of scope here.

pub mod error;
pub mod material;
pub mod trusted_root;

pub use error::{Error, Result};
pub use material::{
    public_key_from_details, CertAuthority, KeySource, TLogAuthority, TrustMaterial,
    TrustedPublicKey, ValidityPeriod,
};
pub use trusted_root::{
    CertificateAuthority, DistinguishedName, TimeRange, TransparencyLog, TrustedRoot,
    TrustedRootPublicKey, TRUSTED_ROOT_MEDIA_TYPE,
};
