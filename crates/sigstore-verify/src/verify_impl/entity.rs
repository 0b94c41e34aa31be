//! The verifier's view of a validated bundle
//!
//! A [`SignedEntity`] pairs the signed content with the signer key material
//! and the evidence (log entries and timestamp tokens) that has to be checked
//! before the signature can be trusted.

use crate::error::{Error, Result};
use sigstore_bundle::{Content, KeyMaterial, SignedEnvelope, SignedMessage, TlogEntry};
use sigstore_bundle::ValidatedBundle;
use sigstore_crypto::{constant_time_eq, Certificate, PublicKey};
use sigstore_types::{pae, TimestampToken};

/// Signed content, independent of its envelope format
pub(crate) trait SignatureContent {
    /// Raw signature bytes, as timestamped by a TSA
    fn signature(&self) -> &[u8];

    /// Whether `digest` is the digest of the signed content
    fn compare_digest(&self, digest: &[u8]) -> bool;

    /// Whether `signature` is this content's signature
    fn compare_signature(&self, signature: &[u8]) -> bool;

    /// Verify the signature with the signer's key
    fn verify_signature(&self, key: &PublicKey) -> Result<()>;
}

/// Signature over an artifact supplied by the caller
pub(crate) struct MessageSignatureContent<'a> {
    message: &'a SignedMessage,
    artifact: Option<&'a [u8]>,
}

impl<'a> MessageSignatureContent<'a> {
    pub(crate) fn new(message: &'a SignedMessage, artifact: Option<&'a [u8]>) -> Self {
        Self { message, artifact }
    }
}

impl SignatureContent for MessageSignatureContent<'_> {
    fn signature(&self) -> &[u8] {
        self.message.signature.as_bytes()
    }

    fn compare_digest(&self, digest: &[u8]) -> bool {
        constant_time_eq(self.message.digest.as_bytes(), digest)
    }

    fn compare_signature(&self, signature: &[u8]) -> bool {
        constant_time_eq(self.message.signature.as_bytes(), signature)
    }

    fn verify_signature(&self, key: &PublicKey) -> Result<()> {
        let artifact = self.artifact.ok_or_else(|| {
            Error::Signature("an artifact is required to verify a message signature".to_string())
        })?;

        let computed = sigstore_crypto::digest(self.message.digest_algorithm, artifact)
            .map_err(|e| Error::Signature(e.to_string()))?;
        if !constant_time_eq(&computed, self.message.digest.as_bytes()) {
            return Err(Error::Signature(
                "artifact digest does not match the message digest".to_string(),
            ));
        }

        key.verify(artifact, self.message.signature.as_bytes())
            .map_err(|e| Error::Signature(e.to_string()))
    }
}

/// DSSE envelope; the signature covers the pre-authentication encoding
pub(crate) struct DsseContent<'a> {
    envelope: &'a SignedEnvelope,
}

impl<'a> DsseContent<'a> {
    pub(crate) fn new(envelope: &'a SignedEnvelope) -> Self {
        Self { envelope }
    }
}

impl SignatureContent for DsseContent<'_> {
    fn signature(&self) -> &[u8] {
        self.envelope.signature.as_bytes()
    }

    fn compare_digest(&self, digest: &[u8]) -> bool {
        let payload_hash = sigstore_crypto::sha256(self.envelope.payload.as_bytes());
        constant_time_eq(payload_hash.as_bytes(), digest)
    }

    fn compare_signature(&self, signature: &[u8]) -> bool {
        constant_time_eq(self.envelope.signature.as_bytes(), signature)
    }

    fn verify_signature(&self, key: &PublicKey) -> Result<()> {
        let message = pae(&self.envelope.payload_type, self.envelope.payload.as_bytes());
        key.verify(&message, self.envelope.signature.as_bytes())
            .map_err(|e| Error::Signature(e.to_string()))
    }
}

/// Signer key material as the verifier uses it
#[derive(Debug, Clone)]
pub(crate) enum VerificationKey {
    PublicKey { hint: String },
    Certificate(Certificate),
}

pub(crate) struct SignedEntity<'a> {
    pub content: Box<dyn SignatureContent + 'a>,
    pub key: VerificationKey,
    /// Log entries carrying a promise or a checkpoint
    pub tlog_entries: Vec<&'a TlogEntry>,
    pub timestamps: &'a [TimestampToken],
}

impl<'a> SignedEntity<'a> {
    pub(crate) fn new(bundle: &'a ValidatedBundle, artifact: Option<&'a [u8]>) -> Result<Self> {
        let content: Box<dyn SignatureContent + 'a> = match &bundle.content {
            Content::MessageSignature(message) => {
                Box::new(MessageSignatureContent::new(message, artifact))
            }
            Content::DsseEnvelope(envelope) => Box::new(DsseContent::new(envelope)),
        };

        let key = match &bundle.key_material {
            KeyMaterial::PublicKey { hint } => VerificationKey::PublicKey { hint: hint.clone() },
            material => {
                let der = material.leaf_certificate().ok_or_else(|| {
                    Error::Certificate("bundle carries no leaf certificate".to_string())
                })?;
                let leaf = Certificate::from_der(der.as_bytes())
                    .map_err(|e| Error::Certificate(e.to_string()))?;
                VerificationKey::Certificate(leaf)
            }
        };

        let tlog_entries = bundle
            .tlog_entries
            .iter()
            .filter(|entry| {
                let witnessed = entry.has_witness();
                if !witnessed {
                    tracing::debug!(
                        "ignoring tlog entry {} without promise or checkpoint",
                        entry.log_index
                    );
                }
                witnessed
            })
            .collect();

        Ok(Self {
            content,
            key,
            tlog_entries,
            timestamps: &bundle.rfc3161_timestamps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_lc_rs::rand::SystemRandom;
    use aws_lc_rs::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
    use sigstore_types::{HashAlgorithm, HashBytes, PayloadBytes, SignatureBytes};

    fn key_pair() -> (EcdsaKeyPair, PublicKey) {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
        let pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref()).unwrap();
        let mut spki =
            hex::decode("3059301306072a8648ce3d020106082a8648ce3d030107034200").unwrap();
        spki.extend_from_slice(pair.public_key().as_ref());
        let public = PublicKey::from_spki_der(&spki).unwrap();
        (pair, public)
    }

    fn sign(pair: &EcdsaKeyPair, data: &[u8]) -> Vec<u8> {
        pair.sign(&SystemRandom::new(), data)
            .unwrap()
            .as_ref()
            .to_vec()
    }

    #[test]
    fn test_message_signature_content() {
        let (pair, public) = key_pair();
        let artifact = b"hello world";
        let message = SignedMessage {
            digest_algorithm: HashAlgorithm::Sha2_256,
            digest: HashBytes::new(sigstore_crypto::sha256(artifact).as_bytes().to_vec()),
            signature: SignatureBytes::new(sign(&pair, artifact)),
        };

        let content = MessageSignatureContent::new(&message, Some(artifact));
        content.verify_signature(&public).unwrap();
        assert!(content.compare_digest(sigstore_crypto::sha256(artifact).as_bytes()));
        assert!(content.compare_signature(message.signature.as_bytes()));
        assert!(!content.compare_signature(b"other"));

        let tampered = MessageSignatureContent::new(&message, Some(b"hello world!"));
        assert!(matches!(
            tampered.verify_signature(&public),
            Err(Error::Signature(_))
        ));

        let missing = MessageSignatureContent::new(&message, None);
        assert!(matches!(
            missing.verify_signature(&public),
            Err(Error::Signature(_))
        ));
    }

    #[test]
    fn test_dsse_content_verifies_pae() {
        let (pair, public) = key_pair();
        let payload = br#"{"_type":"https://in-toto.io/Statement/v1"}"#;
        let payload_type = "application/vnd.in-toto+json";
        let envelope = SignedEnvelope {
            payload_type: payload_type.to_string(),
            payload: PayloadBytes::from_bytes(payload),
            keyid: String::new(),
            signature: SignatureBytes::new(sign(&pair, &pae(payload_type, payload))),
        };

        let content = DsseContent::new(&envelope);
        content.verify_signature(&public).unwrap();
        assert!(content.compare_digest(sigstore_crypto::sha256(payload).as_bytes()));
        assert!(!content.compare_digest(&[0u8; 32]));

        // Signing the bare payload is not enough
        let bare = SignedEnvelope {
            signature: SignatureBytes::new(sign(&pair, payload)),
            ..envelope.clone()
        };
        assert!(DsseContent::new(&bare).verify_signature(&public).is_err());
    }
}
