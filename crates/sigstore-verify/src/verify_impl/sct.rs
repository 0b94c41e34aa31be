//! Certificate transparency: embedded SCT verification (RFC 6962)
//!
//! Fulcio logs every certificate as a precertificate before issuing it. The
//! log's signed certificate timestamp covers the precertificate TBS, which is
//! the final TBS without the SCT list extension, together with a hash of the
//! issuer's public key.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use const_oid::db::rfc6962::CT_PRECERT_SCTS;
use der::{Decode, Encode};
use sigstore_crypto::{Certificate, KeyType, SigningScheme};
use sigstore_trust_root::TLogAuthority;
use tls_codec::{SerializeBytes, TlsByteVecU16, TlsByteVecU24, TlsSerializeBytes, TlsSize};
use x509_cert::ext::pkix::sct::Version;
use x509_cert::ext::pkix::{SignedCertificateTimestamp, SignedCertificateTimestampList};

// TLS SignatureAndHashAlgorithm code points (RFC 5246)
const ECDSA_SHA256: u16 = 0x0403;
const ECDSA_SHA384: u16 = 0x0503;
const ECDSA_SHA512: u16 = 0x0603;
const RSA_PKCS1_SHA256: u16 = 0x0401;
const RSA_PKCS1_SHA384: u16 = 0x0501;
const RSA_PKCS1_SHA512: u16 = 0x0601;

#[derive(PartialEq, Debug, TlsSerializeBytes, TlsSize)]
#[repr(u8)]
enum SignatureType {
    CertificateTimestamp = 0,
    #[allow(unused)]
    TreeHash = 1,
}

#[derive(PartialEq, Debug)]
#[repr(u16)]
enum LogEntryType {
    X509Entry = 0,
    PrecertEntry = 1,
}

#[derive(PartialEq, Debug, TlsSerializeBytes, TlsSize)]
struct PreCert {
    /// SHA-256 of the issuer's SubjectPublicKeyInfo
    issuer_key_hash: [u8; 32],
    tbs_certificate: TlsByteVecU24,
}

#[derive(PartialEq, Debug, TlsSerializeBytes, TlsSize)]
#[repr(u16)]
enum SignedEntry {
    #[allow(unused)]
    #[tls_codec(discriminant = "LogEntryType::X509Entry")]
    X509Entry(TlsByteVecU24),
    #[tls_codec(discriminant = "LogEntryType::PrecertEntry")]
    PrecertEntry(PreCert),
}

/// The structure a CT log signs for an embedded SCT
#[derive(PartialEq, Debug, TlsSerializeBytes, TlsSize)]
struct SctSignedData {
    version: Version,
    signature_type: SignatureType,
    timestamp: u64,
    signed_entry: SignedEntry,
    extensions: TlsByteVecU16,
}

impl SctSignedData {
    fn new(
        leaf: &Certificate,
        sct: &SignedCertificateTimestamp,
        issuer_key_hash: [u8; 32],
    ) -> Result<Self> {
        let mut tbs_precert = leaf.inner().tbs_certificate.clone();
        tbs_precert.extensions = tbs_precert.extensions.map(|exts| {
            exts.into_iter()
                .filter(|ext| ext.extn_id != CT_PRECERT_SCTS)
                .collect()
        });
        let tbs_precert_der = tbs_precert
            .to_der()
            .map_err(|e| Error::Certificate(format!("failed to encode precertificate: {}", e)))?;

        Ok(Self {
            version: match sct.version {
                Version::V1 => Version::V1,
            },
            signature_type: SignatureType::CertificateTimestamp,
            timestamp: sct.timestamp,
            signed_entry: SignedEntry::PrecertEntry(PreCert {
                issuer_key_hash,
                tbs_certificate: tbs_precert_der.as_slice().into(),
            }),
            extensions: sct.extensions.clone(),
        })
    }
}

/// A verified SCT
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VerifiedSct {
    pub log_id: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

/// Verify every SCT embedded in `leaf`, issued by `issuer`.
///
/// Each SCT must verify under a CT log with the same log ID whose key was
/// valid at the SCT time. A certificate without the SCT extension yields no
/// SCTs.
pub(crate) fn verify_embedded_scts(
    leaf: &Certificate,
    issuer: &Certificate,
    ctlogs: &[TLogAuthority],
) -> Result<Vec<VerifiedSct>> {
    let Some(ext) = leaf.extension_value(CT_PRECERT_SCTS) else {
        return Ok(Vec::new());
    };
    let list = SignedCertificateTimestampList::from_der(ext)
        .map_err(|e| Error::Certificate(format!("failed to decode SCT list: {}", e)))?;
    let serialized = list
        .parse_timestamps()
        .map_err(|e| Error::Certificate(format!("failed to parse SCT list: {:?}", e)))?;

    let issuer_spki = issuer
        .spki_der()
        .map_err(|e| Error::Certificate(e.to_string()))?;
    let issuer_key_hash = *sigstore_crypto::sha256(&issuer_spki).as_bytes();

    let mut verified = Vec::with_capacity(serialized.len());
    for single in &serialized {
        let sct = single
            .parse_timestamp()
            .map_err(|e| Error::Certificate(format!("failed to parse SCT: {:?}", e)))?;
        verified.push(verify_sct(leaf, &sct, issuer_key_hash, ctlogs)?);
    }
    Ok(verified)
}

fn verify_sct(
    leaf: &Certificate,
    sct: &SignedCertificateTimestamp,
    issuer_key_hash: [u8; 32],
    ctlogs: &[TLogAuthority],
) -> Result<VerifiedSct> {
    let log_id = sct.log_id.key_id.to_vec();
    let millis = i64::try_from(sct.timestamp)
        .map_err(|_| Error::Certificate("SCT timestamp out of range".to_string()))?;
    let timestamp = DateTime::from_timestamp(millis / 1000, 0)
        .ok_or_else(|| Error::Certificate("SCT timestamp out of range".to_string()))?;

    let signed_data = SctSignedData::new(leaf, sct, issuer_key_hash)?
        .tls_serialize()
        .map_err(|e| Error::Certificate(format!("failed to serialize SCT data: {}", e)))?;
    let alg_bytes = sct.signature.algorithm.tls_serialize().map_err(|e| {
        Error::Certificate(format!("failed to serialize SCT signature algorithm: {}", e))
    })?;
    let [hash, sig] = alg_bytes[..] else {
        return Err(Error::Certificate(
            "malformed SCT signature algorithm".to_string(),
        ));
    };
    let algorithm = u16::from_be_bytes([hash, sig]);
    let signature = sct.signature.signature.as_slice();

    let verified = ctlogs
        .iter()
        .filter(|ctlog| ctlog.log_id == log_id && ctlog.valid_for.contains(timestamp))
        .any(|ctlog| {
            sct_scheme(algorithm, ctlog.public_key.key_type()).is_some_and(|scheme| {
                ctlog
                    .public_key
                    .verify_with_scheme(scheme, &signed_data, signature)
                    .is_ok()
            })
        });

    if verified {
        Ok(VerifiedSct { log_id, timestamp })
    } else {
        Err(Error::Certificate(format!(
            "SCT from log {} could not be verified",
            hex::encode(&log_id)
        )))
    }
}

fn sct_scheme(algorithm: u16, key_type: KeyType) -> Option<SigningScheme> {
    let scheme = match (algorithm, key_type) {
        (ECDSA_SHA256, KeyType::EcP256) => SigningScheme::EcdsaP256Sha256,
        (ECDSA_SHA384, KeyType::EcP256) => SigningScheme::EcdsaP256Sha384,
        (ECDSA_SHA256, KeyType::EcP384) => SigningScheme::EcdsaP384Sha256,
        (ECDSA_SHA384, KeyType::EcP384) => SigningScheme::EcdsaP384Sha384,
        (ECDSA_SHA512, KeyType::EcP521) => SigningScheme::EcdsaP521Sha512,
        (RSA_PKCS1_SHA256, KeyType::Rsa) => SigningScheme::RsaPkcs1Sha256,
        (RSA_PKCS1_SHA384, KeyType::Rsa) => SigningScheme::RsaPkcs1Sha384,
        (RSA_PKCS1_SHA512, KeyType::Rsa) => SigningScheme::RsaPkcs1Sha512,
        _ => return None,
    };
    Some(scheme)
}
