//! Dead Simple Signing Envelope (DSSE) types
//!
//! DSSE is a signature envelope format used for signing arbitrary payloads.
//! Specification: https://github.com/secure-systems-lab/dsse
//!
//! Fields are optional here because the wire form is untrusted; the bundle
//! validator decides which ones are required.

use crate::encoding::{PayloadBytes, SignatureBytes};
use serde::{Deserialize, Serialize};

/// A DSSE envelope containing a signed payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsseEnvelope {
    /// Payload bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadBytes>,
    /// Type URI of the payload
    #[serde(default)]
    pub payload_type: String,
    /// Signatures over the PAE (Pre-Authentication Encoding)
    #[serde(default)]
    pub signatures: Vec<DsseSignature>,
}

/// A signature in a DSSE envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsseSignature {
    /// Signature bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<SignatureBytes>,
    /// Key ID (optional hint for key lookup)
    #[serde(default)]
    pub keyid: String,
}

impl DsseEnvelope {
    /// Get the Pre-Authentication Encoding (PAE) bytes for this envelope
    pub fn pae(&self) -> Vec<u8> {
        let payload = self.payload.as_ref().map(|p| p.as_bytes()).unwrap_or(&[]);
        pae(&self.payload_type, payload)
    }
}

/// Compute the Pre-Authentication Encoding (PAE)
///
/// Format: `DSSEv1 <len(type)> <type> <len(body)> <body>`
pub fn pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let header = format!(
        "DSSEv1 {} {} {} ",
        payload_type.len(),
        payload_type,
        payload.len()
    );
    let mut result = Vec::with_capacity(header.len() + payload.len());
    result.extend_from_slice(header.as_bytes());
    result.extend_from_slice(payload);
    result
}
