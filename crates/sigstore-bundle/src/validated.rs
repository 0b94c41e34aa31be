//! Shape-checked bundle values
//!
//! [`validate_bundle`](crate::validate_bundle) narrows a wire [`Bundle`] into
//! a [`ValidatedBundle`]. Its variants are closed enums and every field the
//! verifier relies on is present. The fields are public so tests and tools
//! can assemble bundles and convert them back with `Bundle::from`; such
//! values carry no guarantee until they pass through `validate_bundle` again,
//! which is the only way the verifier accepts them.

use sigstore_types::{
    Bundle, CanonicalizedBody, DerCertificate, DsseEnvelope, DsseSignature, HashAlgorithm,
    HashBytes, InclusionPromise, InclusionProof, KindVersion, LogId, LogKeyId, MediaType,
    MessageSignature, PayloadBytes, PublicKeyIdentifier, Rfc3161SignedTimestamp, SignatureBytes,
    SignedTimestamp, TimestampToken, TimestampVerificationData, TransparencyLogEntry,
    VerificationMaterial, X509Certificate, X509CertificateChain,
};

/// A bundle whose shape has been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBundle {
    /// Media type as written in the bundle
    pub media_type: String,
    /// Rule set the bundle was validated with
    pub version: MediaType,
    pub content: Content,
    pub key_material: KeyMaterial,
    pub tlog_entries: Vec<TlogEntry>,
    pub rfc3161_timestamps: Vec<TimestampToken>,
}

/// Signed content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    MessageSignature(SignedMessage),
    DsseEnvelope(SignedEnvelope),
}

/// Signature over an external artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub digest_algorithm: HashAlgorithm,
    pub digest: HashBytes,
    pub signature: SignatureBytes,
}

/// DSSE envelope with its single signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub payload_type: String,
    pub payload: PayloadBytes,
    pub keyid: String,
    pub signature: SignatureBytes,
}

/// Signer key material
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// Non-empty certificate list, leaf first
    X509CertificateChain(Vec<DerCertificate>),
    /// Single leaf certificate
    Certificate(DerCertificate),
    /// Key resolved out of band by hint
    PublicKey { hint: String },
}

impl KeyMaterial {
    /// The leaf certificate, if the signer is certificate based
    pub fn leaf_certificate(&self) -> Option<&DerCertificate> {
        match self {
            KeyMaterial::X509CertificateChain(chain) => chain.first(),
            KeyMaterial::Certificate(cert) => Some(cert),
            KeyMaterial::PublicKey { .. } => None,
        }
    }
}

/// A transparency log entry with its identifying fields present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlogEntry {
    pub log_index: i64,
    pub log_id: LogKeyId,
    pub kind_version: KindVersion,
    pub integrated_time: i64,
    pub inclusion_promise: Option<SignedTimestamp>,
    pub inclusion_proof: Option<InclusionProof>,
    pub canonicalized_body: CanonicalizedBody,
}

impl TlogEntry {
    /// Whether the entry carries any witness that can be checked
    pub fn has_witness(&self) -> bool {
        self.inclusion_promise.is_some()
            || self
                .inclusion_proof
                .as_ref()
                .is_some_and(|proof| proof.checkpoint.is_some())
    }
}

impl From<&ValidatedBundle> for Bundle {
    fn from(validated: &ValidatedBundle) -> Self {
        let (message_signature, dsse_envelope) = match &validated.content {
            Content::MessageSignature(msg) => (
                Some(MessageSignature {
                    message_digest: Some(sigstore_types::HashOutput {
                        algorithm: msg.digest_algorithm,
                        digest: Some(msg.digest.clone()),
                    }),
                    signature: Some(msg.signature.clone()),
                }),
                None,
            ),
            Content::DsseEnvelope(env) => (
                None,
                Some(DsseEnvelope {
                    payload: Some(env.payload.clone()),
                    payload_type: env.payload_type.clone(),
                    signatures: vec![DsseSignature {
                        sig: Some(env.signature.clone()),
                        keyid: env.keyid.clone(),
                    }],
                }),
            ),
        };

        let mut material = VerificationMaterial::default();
        match &validated.key_material {
            KeyMaterial::X509CertificateChain(chain) => {
                material.x509_certificate_chain = Some(X509CertificateChain {
                    certificates: chain
                        .iter()
                        .map(|der| X509Certificate {
                            raw_bytes: Some(der.clone()),
                        })
                        .collect(),
                })
            }
            KeyMaterial::Certificate(der) => {
                material.certificate = Some(X509Certificate {
                    raw_bytes: Some(der.clone()),
                })
            }
            KeyMaterial::PublicKey { hint } => {
                material.public_key = Some(PublicKeyIdentifier { hint: hint.clone() })
            }
        }

        material.tlog_entries = validated
            .tlog_entries
            .iter()
            .map(|entry| TransparencyLogEntry {
                log_index: entry.log_index,
                log_id: Some(LogId {
                    key_id: entry.log_id.clone(),
                }),
                kind_version: Some(entry.kind_version.clone()),
                integrated_time: entry.integrated_time,
                inclusion_promise: entry.inclusion_promise.clone().map(|set| InclusionPromise {
                    signed_entry_timestamp: set,
                }),
                inclusion_proof: entry.inclusion_proof.clone(),
                canonicalized_body: entry.canonicalized_body.clone(),
            })
            .collect();

        if !validated.rfc3161_timestamps.is_empty() {
            material.timestamp_verification_data = Some(TimestampVerificationData {
                rfc3161_timestamps: validated
                    .rfc3161_timestamps
                    .iter()
                    .map(|token| Rfc3161SignedTimestamp {
                        signed_timestamp: token.clone(),
                    })
                    .collect(),
            });
        }

        Bundle {
            media_type: validated.media_type.clone(),
            verification_material: Some(material),
            message_signature,
            dsse_envelope,
        }
    }
}
