//! X.509 certificate accessors
//!
//! A thin wrapper around `x509_cert::Certificate` that keeps the original DER
//! and the exact TBS bytes, and exposes the handful of fields the verifier
//! needs: names, validity window, key identifiers, basic constraints,
//! subject alternative name and raw extension values.

use crate::error::{Error, Result};
use crate::signing::{PublicKey, SigningScheme};
use chrono::{DateTime, Utc};
use const_oid::db::rfc5280::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_SUBJECT_ALT_NAME,
    ID_CE_SUBJECT_KEY_IDENTIFIER,
};
use const_oid::ObjectIdentifier;
use der::asn1::Utf8StringRef;
use der::{Decode, Encode, Reader, SliceReader};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    AuthorityKeyIdentifier, BasicConstraints, SubjectAltName, SubjectKeyIdentifier,
};
use x509_cert::ext::Extension;
use x509_cert::name::Name;

/// A parsed certificate
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    tbs_der: Vec<u8>,
    inner: x509_cert::Certificate,
    public_key: PublicKey,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Certificate {
    /// Parse a DER-encoded certificate
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = x509_cert::Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("failed to parse certificate: {}", e)))?;
        let tbs_der = extract_tbs_der(der)?;
        let public_key = PublicKey::from_spki(&inner.tbs_certificate.subject_public_key_info)?;
        let validity = &inner.tbs_certificate.validity;
        let not_before = to_datetime(validity.not_before.to_unix_duration())?;
        let not_after = to_datetime(validity.not_after.to_unix_duration())?;

        Ok(Self {
            der: der.to_vec(),
            tbs_der,
            inner,
            public_key,
            not_before,
            not_after,
        })
    }

    /// The original DER bytes
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The original TBSCertificate bytes
    pub fn tbs_der(&self) -> &[u8] {
        &self.tbs_der
    }

    /// The underlying `x509_cert` value
    pub fn inner(&self) -> &x509_cert::Certificate {
        &self.inner
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    /// Serial number content bytes
    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Whether `time` falls inside the validity window (inclusive)
    pub fn is_valid_at(&self, time: DateTime<Utc>) -> bool {
        self.not_before <= time && time <= self.not_after
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// DER encoding of the SubjectPublicKeyInfo
    pub fn spki_der(&self) -> Result<Vec<u8>> {
        Ok(self
            .inner
            .tbs_certificate
            .subject_public_key_info
            .to_der()?)
    }

    /// Find an extension by OID
    pub fn extension(&self, oid: ObjectIdentifier) -> Option<&Extension> {
        self.inner
            .tbs_certificate
            .extensions
            .as_ref()?
            .iter()
            .find(|ext| ext.extn_id == oid)
    }

    /// Raw `extnValue` contents of an extension
    pub fn extension_value(&self, oid: ObjectIdentifier) -> Option<&[u8]> {
        self.extension(oid).map(|ext| ext.extn_value.as_bytes())
    }

    fn decode_extension<T: for<'a> Decode<'a>>(&self, oid: ObjectIdentifier) -> Option<T> {
        T::from_der(self.extension_value(oid)?).ok()
    }

    /// Basic constraints `cA` flag (false when the extension is absent)
    pub fn is_ca(&self) -> bool {
        self.decode_extension::<BasicConstraints>(ID_CE_BASIC_CONSTRAINTS)
            .map(|bc| bc.ca)
            .unwrap_or(false)
    }

    /// Basic constraints `pathLenConstraint`
    pub fn path_len_constraint(&self) -> Option<u8> {
        self.decode_extension::<BasicConstraints>(ID_CE_BASIC_CONSTRAINTS)
            .and_then(|bc| bc.path_len_constraint)
    }

    pub fn subject_key_identifier(&self) -> Option<Vec<u8>> {
        self.decode_extension::<SubjectKeyIdentifier>(ID_CE_SUBJECT_KEY_IDENTIFIER)
            .map(|ski| ski.0.as_bytes().to_vec())
    }

    pub fn authority_key_identifier(&self) -> Option<Vec<u8>> {
        self.decode_extension::<AuthorityKeyIdentifier>(ID_CE_AUTHORITY_KEY_IDENTIFIER)
            .and_then(|aki| aki.key_identifier)
            .map(|kid| kid.as_bytes().to_vec())
    }

    /// First usable subject alternative name: URI, then email, then a UTF-8
    /// otherName.
    pub fn subject_alternative_name(&self) -> Option<String> {
        let san = self.decode_extension::<SubjectAltName>(ID_CE_SUBJECT_ALT_NAME)?;

        let uri = san.0.iter().find_map(|name| match name {
            GeneralName::UniformResourceIdentifier(uri) => Some(uri.to_string()),
            _ => None,
        });
        let email = || {
            san.0.iter().find_map(|name| match name {
                GeneralName::Rfc822Name(email) => Some(email.to_string()),
                _ => None,
            })
        };
        let other = || {
            san.0.iter().find_map(|name| match name {
                GeneralName::OtherName(other) => other
                    .value
                    .decode_as::<Utf8StringRef<'_>>()
                    .ok()
                    .map(|s| s.as_str().to_string()),
                _ => None,
            })
        };

        uri.or_else(email).or_else(other)
    }

    /// Whether subject and issuer names are equal
    pub fn has_self_issued_name(&self) -> bool {
        self.subject() == self.issuer()
    }

    /// Verify this certificate's signature with `issuer_key`
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<()> {
        let scheme =
            SigningScheme::for_signature_algorithm(self.inner.signature_algorithm.oid, issuer_key)?;
        let signature = self
            .inner
            .signature
            .as_bytes()
            .ok_or_else(|| Error::Certificate("signature is not octet aligned".to_string()))?;
        issuer_key.verify_with_scheme(scheme, &self.tbs_der, signature)
    }
}

fn to_datetime(d: std::time::Duration) -> Result<DateTime<Utc>> {
    let secs = i64::try_from(d.as_secs())
        .map_err(|_| Error::Certificate("validity time out of range".to_string()))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Certificate("validity time out of range".to_string()))
}

/// Extract the original TBS (To Be Signed) certificate DER bytes
///
/// Re-encoding the decoded structure may not reproduce the signed bytes, so
/// the TBS element is sliced out of the original encoding instead.
fn extract_tbs_der(cert_der: &[u8]) -> Result<Vec<u8>> {
    // Certificate ::= SEQUENCE { tbsCertificate, signatureAlgorithm, signatureValue }
    let mut reader = SliceReader::new(cert_der)?;
    let outer_header = der::Header::decode(&mut reader)?;
    let cert_contents = reader.read_slice(outer_header.length)?;

    let mut tbs_reader = SliceReader::new(cert_contents)?;
    let tbs_header = der::Header::decode(&mut tbs_reader)?;

    let header_len: usize = tbs_header
        .encoded_len()?
        .try_into()
        .map_err(|_| Error::Certificate("TBS header length too large".to_string()))?;
    let body_len: usize = tbs_header
        .length
        .try_into()
        .map_err(|_| Error::Certificate("TBS body length too large".to_string()))?;
    let tbs_total_len = header_len
        .checked_add(body_len)
        .ok_or_else(|| Error::Certificate("TBS length calculation overflow".to_string()))?;

    if tbs_total_len > cert_contents.len() {
        return Err(Error::Certificate(
            "TBS length exceeds certificate contents".to_string(),
        ));
    }

    Ok(cert_contents[..tbs_total_len].to_vec())
}
