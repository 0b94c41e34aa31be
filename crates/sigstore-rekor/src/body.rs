//! Rekor entry bodies
//!
//! The canonicalized body of a log entry is a JSON document whose `spec`
//! layout depends on `kind` and `apiVersion`. Only the fields needed to tie an
//! entry back to bundle content are modelled; unknown fields are ignored.

use crate::error::{Error, Result};
use serde::Deserialize;
use sigstore_types::{HashBytes, SignatureBytes};

/// A parsed log entry body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RekorEntryBody {
    HashedRekordV001(HashedRekordV001),
    HashedRekordV002(HashedRekordV002),
    IntotoV002(IntotoV002),
    DsseV001(DsseV001),
    DsseV002(DsseV002),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BodyHeader {
    kind: String,
    api_version: String,
}

#[derive(Deserialize)]
struct Envelope<S> {
    spec: S,
}

impl RekorEntryBody {
    /// Parse body bytes, checking they declare `kind` and `version`
    pub fn from_json_bytes(body: &[u8], kind: &str, version: &str) -> Result<Self> {
        let header: BodyHeader = serde_json::from_slice(body)?;
        if header.kind != kind || header.api_version != version {
            return Err(Error::KindVersionMismatch {
                expected_kind: kind.to_string(),
                expected_version: version.to_string(),
                actual_kind: header.kind,
                actual_version: header.api_version,
            });
        }

        fn spec<S: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<S> {
            Ok(serde_json::from_slice::<Envelope<S>>(body)?.spec)
        }

        let parsed = match (kind, version) {
            ("hashedrekord", "0.0.1") => RekorEntryBody::HashedRekordV001(spec(body)?),
            ("hashedrekord", "0.0.2") => RekorEntryBody::HashedRekordV002(spec(body)?),
            ("intoto", "0.0.2") => RekorEntryBody::IntotoV002(spec(body)?),
            ("dsse", "0.0.1") => RekorEntryBody::DsseV001(spec(body)?),
            ("dsse", "0.0.2") => RekorEntryBody::DsseV002(spec(body)?),
            _ => {
                return Err(Error::Unsupported {
                    kind: kind.to_string(),
                    version: version.to_string(),
                })
            }
        };
        Ok(parsed)
    }
}

/// Hex digest with its algorithm name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HexHash {
    #[serde(default)]
    pub algorithm: String,
    pub value: String,
}

/// Binary digest with its algorithm name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DigestHash {
    #[serde(default)]
    pub algorithm: String,
    pub digest: HashBytes,
}

// hashedrekord

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HashedRekordV001 {
    pub data: HashedRekordData,
    pub signature: HashedRekordSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HashedRekordData {
    pub hash: HexHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HashedRekordSignature {
    pub content: SignatureBytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashedRekordV002 {
    pub hashed_rekord_v002: HashedRekordV002Content,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HashedRekordV002Content {
    pub data: DigestHash,
    pub signature: HashedRekordSignature,
}

// intoto

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IntotoV002 {
    pub content: IntotoContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntotoContent {
    pub envelope: IntotoEnvelope,
    pub payload_hash: HexHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IntotoEnvelope {
    #[serde(default)]
    pub signatures: Vec<IntotoSignature>,
}

/// `sig` is base64 of the base64 signature text, so after the first decode
/// it still holds base64.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IntotoSignature {
    pub sig: SignatureBytes,
}

// dsse

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsseV001 {
    pub payload_hash: HexHash,
    #[serde(default)]
    pub signatures: Vec<DsseV001Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DsseV001Signature {
    pub signature: SignatureBytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsseV002 {
    pub dsse_v002: DsseV002Content,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsseV002Content {
    pub payload_hash: DigestHash,
    #[serde(default)]
    pub signatures: Vec<DsseV002Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DsseV002Signature {
    pub content: SignatureBytes,
}
