//! Signer key resolution
//!
//! A `publicKey` signer is looked up out of band by hint. A certificate
//! signer must chain to a trusted CA at every verified timestamp, follow the
//! Fulcio profile, and carry enough SCTs from trusted CT logs.

use crate::error::{Error, Result};
use crate::verify::{CertificateExtensions, CertificateIdentity, Signer, VerifierOptions};
use crate::verify_impl::chain::verify_certificate_chain;
use crate::verify_impl::entity::VerificationKey;
use crate::verify_impl::sct::{verify_embedded_scts, VerifiedSct};
use crate::verify_impl::timestamp::VerifiedTimestamp;
use const_oid::db::rfc5280::{ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE, ID_KP_CODE_SIGNING};
use const_oid::ObjectIdentifier;
use der::asn1::Utf8StringRef;
use der::Decode;
use sigstore_crypto::Certificate;
use sigstore_trust_root::{TLogAuthority, TrustMaterial};
use x509_cert::ext::pkix::{ExtendedKeyUsage, KeyUsage, KeyUsages};

/// Fulcio OIDC issuer, raw string value (deprecated)
const OIDC_ISSUER: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.57264.1.1");
/// Fulcio OIDC issuer, DER UTF8String value
const OIDC_ISSUER_V2: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.57264.1.8");

pub(crate) fn verify_key(
    key: &VerificationKey,
    trust: &TrustMaterial,
    timestamps: &[VerifiedTimestamp],
    options: &VerifierOptions,
) -> Result<Signer> {
    match key {
        VerificationKey::PublicKey { hint } => verify_public_key(hint, trust, timestamps),
        VerificationKey::Certificate(leaf) => {
            verify_certificate(leaf, trust, timestamps, options)
        }
    }
}

fn verify_public_key(
    hint: &str,
    trust: &TrustMaterial,
    timestamps: &[VerifiedTimestamp],
) -> Result<Signer> {
    let trusted = trust
        .public_key(hint)
        .map_err(|e| Error::PublicKey(e.to_string()))?;

    if let Some(ts) = timestamps.iter().find(|ts| !trusted.is_valid_at(ts.timestamp)) {
        return Err(Error::PublicKey(format!(
            "key {:?} is not valid at {}",
            hint, ts.timestamp
        )));
    }

    Ok(Signer {
        key: trusted.public_key,
        identity: None,
    })
}

fn verify_certificate(
    leaf: &Certificate,
    trust: &TrustMaterial,
    timestamps: &[VerifiedTimestamp],
    options: &VerifierOptions,
) -> Result<Signer> {
    if timestamps.is_empty() {
        return Err(Error::Certificate(
            "no verified timestamp to check the certificate against".to_string(),
        ));
    }

    let mut path = Vec::new();
    for ts in timestamps {
        path = verify_certificate_chain(leaf, &trust.certificate_authorities, ts.timestamp)?;
    }

    if options.check_x509_profile {
        verify_x509_profile(leaf)?;
    }

    if options.ctlog_threshold > 0 {
        verify_sct_threshold(&path, &trust.ctlogs, options.ctlog_threshold)?;
    }

    Ok(Signer {
        key: leaf.public_key().clone(),
        identity: Some(certificate_identity(leaf)),
    })
}

/// Require the keyUsage and extendedKeyUsage Fulcio sets on signing
/// certificates: digitalSignature and codeSigning.
pub(crate) fn verify_x509_profile(cert: &Certificate) -> Result<()> {
    let key_usage = cert
        .extension_value(ID_CE_KEY_USAGE)
        .ok_or_else(|| Error::Certificate("certificate is missing KeyUsage".to_string()))?;
    let key_usage = KeyUsage::from_der(key_usage)
        .map_err(|e| Error::Certificate(format!("failed to parse KeyUsage: {}", e)))?;
    if !key_usage.0.contains(KeyUsages::DigitalSignature) {
        return Err(Error::Certificate(
            "KeyUsage does not contain digitalSignature".to_string(),
        ));
    }

    let eku = cert.extension_value(ID_CE_EXT_KEY_USAGE).ok_or_else(|| {
        Error::Certificate("certificate is missing ExtendedKeyUsage".to_string())
    })?;
    let eku = ExtendedKeyUsage::from_der(eku)
        .map_err(|e| Error::Certificate(format!("failed to parse ExtendedKeyUsage: {}", e)))?;
    if !eku.0.contains(&ID_KP_CODE_SIGNING) {
        return Err(Error::Certificate(
            "ExtendedKeyUsage does not contain codeSigning".to_string(),
        ));
    }

    Ok(())
}

/// Verify the SCTs of `path[0]` and require `threshold` distinct logs
fn verify_sct_threshold(
    path: &[Certificate],
    ctlogs: &[TLogAuthority],
    threshold: usize,
) -> Result<()> {
    let scts = match path {
        [leaf, issuer, ..] => verify_embedded_scts(leaf, issuer, ctlogs)?,
        _ => Vec::new(),
    };

    check_sct_logs(&scts, threshold)
}

/// Require `threshold` SCTs, each from a different log
fn check_sct_logs(scts: &[VerifiedSct], threshold: usize) -> Result<()> {
    let duplicated = scts
        .iter()
        .enumerate()
        .any(|(i, sct)| scts[..i].iter().any(|other| other.log_id == sct.log_id));
    if duplicated {
        return Err(Error::Certificate(
            "certificate carries more than one SCT from the same log".to_string(),
        ));
    }

    if scts.len() < threshold {
        return Err(Error::Certificate(format!(
            "expected {} verified SCTs, got {}",
            threshold,
            scts.len()
        )));
    }
    Ok(())
}

/// Identity claims of a Fulcio certificate
pub(crate) fn certificate_identity(cert: &Certificate) -> CertificateIdentity {
    CertificateIdentity {
        subject_alternative_name: cert.subject_alternative_name(),
        extensions: CertificateExtensions {
            issuer: oidc_issuer(cert),
        },
    }
}

fn oidc_issuer(cert: &Certificate) -> Option<String> {
    if let Some(value) = cert.extension_value(OIDC_ISSUER_V2) {
        return Utf8StringRef::from_der(value)
            .ok()
            .map(|issuer| issuer.as_str().to_string());
    }
    cert.extension_value(OIDC_ISSUER)
        .and_then(|value| std::str::from_utf8(value).ok())
        .map(str::to_string)
}
