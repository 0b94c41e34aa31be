//! Core types and data structures for Sigstore
//!
//! This crate provides the wire-level data structures consumed by offline
//! verification: the bundle format, transparency log entries, DSSE envelopes
//! and signed checkpoints, together with the encoding newtypes they share.

pub mod bundle;
pub mod checkpoint;
pub mod dsse;
pub mod encoding;
pub mod error;
pub mod hash;

pub use bundle::{
    Bundle, CheckpointEnvelope, HashOutput, InclusionPromise, InclusionProof, KindVersion, LogId,
    MediaType, MessageSignature, PublicKeyIdentifier, Rfc3161SignedTimestamp,
    TimestampVerificationData, TransparencyLogEntry, VerificationMaterial, X509Certificate,
    X509CertificateChain,
};
pub use checkpoint::{Checkpoint, CheckpointSignature};
pub use dsse::{pae, DsseEnvelope, DsseSignature};
pub use encoding::{
    string_i64, CanonicalizedBody, DerCertificate, DerPublicKey, HashBytes, LogKeyId,
    PayloadBytes, Sha256Hash, SignatureBytes, SignedTimestamp, TimestampToken,
};
pub use error::{Error, Result};
pub use hash::HashAlgorithm;
