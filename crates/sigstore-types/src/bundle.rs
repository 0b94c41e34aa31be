//! Sigstore bundle format types
//!
//! The bundle is the core artifact consumed by verification. It contains the
//! signature, verification material (certificate or public key), and
//! transparency log entries.
//!
//! These types mirror the JSON wire form of bundle versions 0.1 to 0.3. Almost
//! every field is optional at this layer: a bundle is untrusted input, and
//! `sigstore-bundle` turns it into a shape-checked value.

use crate::checkpoint::Checkpoint;
use crate::dsse::DsseEnvelope;
use crate::encoding::{
    string_i64, CanonicalizedBody, DerCertificate, HashBytes, LogKeyId, SignatureBytes,
    SignedTimestamp, TimestampToken,
};
use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const BUNDLE_JSON_PREFIX: &str = "application/vnd.dev.sigstore.bundle+json;version=";
const BUNDLE_VERSIONED_PREFIX: &str = "application/vnd.dev.sigstore.bundle.v";

/// Sigstore bundle media types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// Bundle format version 0.1
    Bundle0_1,
    /// Bundle format version 0.2
    Bundle0_2,
    /// Bundle format version 0.3 (and any newer version, validated with the same rules)
    Bundle0_3,
}

impl MediaType {
    /// Get the canonical media type string
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Bundle0_1 => "application/vnd.dev.sigstore.bundle+json;version=0.1",
            MediaType::Bundle0_2 => "application/vnd.dev.sigstore.bundle+json;version=0.2",
            MediaType::Bundle0_3 => "application/vnd.dev.sigstore.bundle.v0.3+json",
        }
    }
}

/// `<digit>.<digit>` at the start of `s`
fn starts_with_version(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 3 && b[0].is_ascii_digit() && b[1] == b'.' && b[2].is_ascii_digit()
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "application/vnd.dev.sigstore.bundle+json;version=0.1" => Ok(MediaType::Bundle0_1),
            "application/vnd.dev.sigstore.bundle+json;version=0.2" => Ok(MediaType::Bundle0_2),
            "application/vnd.dev.sigstore.bundle.v0.3+json" => Ok(MediaType::Bundle0_3),
            // Also accept alternative v0.3 format
            "application/vnd.dev.sigstore.bundle+json;version=0.3" => Ok(MediaType::Bundle0_3),
            _ => {
                let recognized = s
                    .strip_prefix(BUNDLE_JSON_PREFIX)
                    .is_some_and(starts_with_version)
                    || s.strip_prefix(BUNDLE_VERSIONED_PREFIX).is_some_and(|rest| {
                        starts_with_version(rest) && rest[3..].starts_with("+json")
                    });
                if recognized {
                    Ok(MediaType::Bundle0_3)
                } else {
                    Err(Error::InvalidMediaType(s.to_string()))
                }
            }
        }
    }
}

/// The top-level signed object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(default)]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_material: Option<VerificationMaterial>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_signature: Option<MessageSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dsse_envelope: Option<DsseEnvelope>,
}

impl Bundle {
    /// Parse a bundle from JSON
    pub fn from_json(json: &str) -> Result<Bundle> {
        serde_json::from_str(json).map_err(Error::Json)
    }

    /// Read and parse a bundle file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Bundle> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize the bundle to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Json)
    }

    /// Get the bundle version from the media type
    pub fn version(&self) -> Result<MediaType> {
        MediaType::from_str(&self.media_type)
    }
}

/// Signature over an artifact that is not embedded in the bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSignature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_digest: Option<HashOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBytes>,
}

/// A digest together with the algorithm that produced it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashOutput {
    #[serde(default)]
    pub algorithm: HashAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<HashBytes>,
}

/// Key material and witnesses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMaterial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x509_certificate_chain: Option<X509CertificateChain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<X509Certificate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKeyIdentifier>,
    #[serde(default)]
    pub tlog_entries: Vec<TransparencyLogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_verification_data: Option<TimestampVerificationData>,
}

/// Ordered certificate list, leaf first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct X509CertificateChain {
    #[serde(default)]
    pub certificates: Vec<X509Certificate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X509Certificate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_bytes: Option<DerCertificate>,
}

/// Opaque hint used to look a key up out of band
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyIdentifier {
    #[serde(default)]
    pub hint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampVerificationData {
    #[serde(default)]
    pub rfc3161_timestamps: Vec<Rfc3161SignedTimestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rfc3161SignedTimestamp {
    #[serde(default)]
    pub signed_timestamp: TimestampToken,
}

/// A transparency log entry as carried in a bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransparencyLogEntry {
    #[serde(default, with = "string_i64")]
    pub log_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<LogId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind_version: Option<KindVersion>,
    #[serde(default, with = "string_i64")]
    pub integrated_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion_promise: Option<InclusionPromise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion_proof: Option<InclusionProof>,
    #[serde(default)]
    pub canonicalized_body: CanonicalizedBody,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogId {
    #[serde(default)]
    pub key_id: LogKeyId,
}

/// Declares which body schema the entry uses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindVersion {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionPromise {
    #[serde(default)]
    pub signed_entry_timestamp: SignedTimestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    #[serde(default, with = "string_i64")]
    pub log_index: i64,
    #[serde(default)]
    pub root_hash: HashBytes,
    #[serde(default, with = "string_i64")]
    pub tree_size: i64,
    #[serde(default)]
    pub hashes: Vec<HashBytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<CheckpointEnvelope>,
}

impl InclusionProof {
    /// Parse the checkpoint text
    pub fn parse_checkpoint(&self) -> Result<Checkpoint> {
        let checkpoint = self
            .checkpoint
            .as_ref()
            .ok_or_else(|| Error::InvalidCheckpoint("missing checkpoint".to_string()))?;
        Checkpoint::from_text(&checkpoint.envelope)
    }
}

/// Signed checkpoint note text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointEnvelope {
    #[serde(default)]
    pub envelope: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_parsing() {
        assert_eq!(
            MediaType::from_str("application/vnd.dev.sigstore.bundle+json;version=0.1").unwrap(),
            MediaType::Bundle0_1
        );
        assert_eq!(
            MediaType::from_str("application/vnd.dev.sigstore.bundle+json;version=0.2").unwrap(),
            MediaType::Bundle0_2
        );
        assert_eq!(
            MediaType::from_str("application/vnd.dev.sigstore.bundle.v0.3+json").unwrap(),
            MediaType::Bundle0_3
        );
        assert_eq!(
            MediaType::from_str("application/vnd.dev.sigstore.bundle+json;version=0.3").unwrap(),
            MediaType::Bundle0_3
        );
    }

    #[test]
    fn test_media_type_future_versions() {
        assert_eq!(
            MediaType::from_str("application/vnd.dev.sigstore.bundle.v0.4+json").unwrap(),
            MediaType::Bundle0_3
        );
        assert_eq!(
            MediaType::from_str("application/vnd.dev.sigstore.bundle+json;version=1.0").unwrap(),
            MediaType::Bundle0_3
        );
    }

    #[test]
    fn test_media_type_invalid() {
        assert!(MediaType::from_str("invalid").is_err());
        assert!(MediaType::from_str("").is_err());
        assert!(MediaType::from_str("application/vnd.dev.sigstore.bundle.v0.x+json").is_err());
        assert!(MediaType::from_str("application/vnd.dev.sigstore.bundle.v0.3").is_err());
    }

    #[test]
    fn test_tlog_entry_int64_fields() {
        let json = r#"{
            "logIndex": "25915956",
            "logId": {"keyId": "wNI9atQGlz+VWfO6LRygH4QUfY/8W4RFwiT5i5WRgB0="},
            "kindVersion": {"kind": "hashedrekord", "version": "0.0.1"},
            "integratedTime": 1689177396,
            "canonicalizedBody": "e30="
        }"#;
        let entry: TransparencyLogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.log_index, 25915956);
        assert_eq!(entry.integrated_time, 1689177396);
        assert_eq!(entry.canonicalized_body.as_bytes(), b"{}");
        assert_eq!(entry.log_id.unwrap().key_id.len(), 32);
    }

    #[test]
    fn test_empty_bundle_parses() {
        let bundle = Bundle::from_json("{}").unwrap();
        assert!(bundle.version().is_err());
        assert!(bundle.verification_material.is_none());
    }
}
