//! Query-ready trust material
//!
//! [`TrustMaterial`] is built once from a [`TrustedRoot`] and then only read.
//! Certificates and keys are parsed up front, and every authority carries a
//! concrete [`ValidityPeriod`] with open bounds already filled in.

use crate::trusted_root::{CertificateAuthority, TimeRange, TransparencyLog, TrustedRoot};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sigstore_crypto::{Certificate, PublicKey, SigningScheme};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Inclusive validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Default for ValidityPeriod {
    fn default() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }
}

impl ValidityPeriod {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        let open = Self::default();
        Self {
            start: start.unwrap_or(open.start),
            end: end.unwrap_or(open.end),
        }
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time <= self.end
    }

    /// Whether the whole of `[from, to]` lies inside this period
    pub fn contains_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start <= from && to <= self.end
    }
}

impl From<Option<&TimeRange>> for ValidityPeriod {
    fn from(range: Option<&TimeRange>) -> Self {
        match range {
            Some(range) => Self::new(range.start, range.end),
            None => Self::default(),
        }
    }
}

/// A certificate authority or timestamp authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertAuthority {
    /// Root last
    pub cert_chain: Vec<Certificate>,
    pub valid_for: ValidityPeriod,
}

/// A transparency log or CT log key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TLogAuthority {
    pub log_id: Vec<u8>,
    pub public_key: PublicKey,
    pub valid_for: ValidityPeriod,
}

impl TLogAuthority {
    /// First four bytes of the log ID, as used in checkpoint signatures
    pub fn key_hint(&self) -> Option<[u8; 4]> {
        self.log_id.get(..4)?.try_into().ok()
    }
}

/// A key trusted for a signer identified by hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedPublicKey {
    pub public_key: PublicKey,
    pub valid_for: ValidityPeriod,
}

impl TrustedPublicKey {
    pub fn new(public_key: PublicKey, valid_for: ValidityPeriod) -> Self {
        Self {
            public_key,
            valid_for,
        }
    }

    pub fn is_valid_at(&self, time: DateTime<Utc>) -> bool {
        self.valid_for.contains(time)
    }
}

type KeyFinder = dyn Fn(&str) -> Option<TrustedPublicKey> + Send + Sync;

/// Where keys for `publicKey` signers come from
#[derive(Clone)]
pub enum KeySource {
    /// Fixed map from hint to key
    Map(HashMap<String, TrustedPublicKey>),
    /// Caller supplied lookup
    Finder(Arc<KeyFinder>),
}

impl Default for KeySource {
    fn default() -> Self {
        KeySource::Map(HashMap::new())
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Map(keys) => f
                .debug_tuple("Map")
                .field(&keys.keys().collect::<Vec<_>>())
                .finish(),
            KeySource::Finder(_) => f.write_str("Finder(..)"),
        }
    }
}

impl KeySource {
    pub fn finder<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<TrustedPublicKey> + Send + Sync + 'static,
    {
        KeySource::Finder(Arc::new(f))
    }

    pub fn lookup(&self, hint: &str) -> Result<TrustedPublicKey> {
        let found = match self {
            KeySource::Map(keys) => keys.get(hint).cloned(),
            KeySource::Finder(find) => (**find)(hint),
        };
        found.ok_or_else(|| Error::KeyNotFound(hint.to_string()))
    }
}

/// Everything a verifier trusts
#[derive(Debug, Clone, Default)]
pub struct TrustMaterial {
    pub certificate_authorities: Vec<CertAuthority>,
    pub timestamp_authorities: Vec<CertAuthority>,
    pub tlogs: Vec<TLogAuthority>,
    pub ctlogs: Vec<TLogAuthority>,
    pub key_source: KeySource,
}

impl TrustMaterial {
    /// Parse every authority of `root`
    ///
    /// Entries whose key or certificates cannot be used are skipped with a
    /// warning, so a root listing a newer key type still works for the
    /// authorities that are understood. A root with no usable authority at
    /// all is an error.
    pub fn from_trusted_root(root: &TrustedRoot, key_source: KeySource) -> Result<Self> {
        let material = Self {
            certificate_authorities: cert_authorities(&root.certificate_authorities),
            timestamp_authorities: cert_authorities(&root.timestamp_authorities),
            tlogs: log_authorities(&root.tlogs),
            ctlogs: log_authorities(&root.ctlogs),
            key_source,
        };
        tracing::debug!(
            "trust material: {} CAs, {} TSAs, {} tlogs, {} ctlogs",
            material.certificate_authorities.len(),
            material.timestamp_authorities.len(),
            material.tlogs.len(),
            material.ctlogs.len()
        );

        if material.certificate_authorities.is_empty()
            && material.timestamp_authorities.is_empty()
            && material.tlogs.is_empty()
            && material.ctlogs.is_empty()
        {
            return Err(Error::InvalidMaterial(
                "trusted root contains no usable authority".into(),
            ));
        }
        Ok(material)
    }

    pub fn with_key_source(mut self, key_source: KeySource) -> Self {
        self.key_source = key_source;
        self
    }

    /// Resolve a `publicKey` signer hint
    pub fn public_key(&self, hint: &str) -> Result<TrustedPublicKey> {
        self.key_source.lookup(hint)
    }
}

fn cert_authorities(authorities: &[CertificateAuthority]) -> Vec<CertAuthority> {
    authorities
        .iter()
        .filter_map(|ca| match cert_authority(ca) {
            Ok(authority) => Some(authority),
            Err(e) => {
                tracing::warn!("skipping certificate authority {:?}: {}", ca.uri, e);
                None
            }
        })
        .collect()
}

fn cert_authority(ca: &CertificateAuthority) -> Result<CertAuthority> {
    let cert_chain = ca
        .cert_chain
        .certificates
        .iter()
        .map(|cert| {
            let der = cert
                .raw_bytes
                .as_ref()
                .ok_or_else(|| Error::InvalidMaterial("certificate without rawBytes".into()))?;
            Certificate::from_der(der.as_bytes())
                .map_err(|e| Error::InvalidMaterial(e.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;
    if cert_chain.is_empty() {
        return Err(Error::InvalidMaterial("empty certificate chain".into()));
    }
    Ok(CertAuthority {
        cert_chain,
        valid_for: ca.valid_for.as_ref().into(),
    })
}

fn log_authorities(logs: &[TransparencyLog]) -> Vec<TLogAuthority> {
    logs.iter()
        .filter_map(|log| match log_authority(log) {
            Ok(authority) => Some(authority),
            Err(e) => {
                tracing::warn!("skipping log {:?}: {}", log.base_url, e);
                None
            }
        })
        .collect()
}

fn log_authority(log: &TransparencyLog) -> Result<TLogAuthority> {
    let raw = log
        .public_key
        .raw_bytes
        .as_ref()
        .ok_or_else(|| Error::InvalidMaterial("public key without rawBytes".into()))?;
    let public_key = public_key_from_details(raw.as_bytes(), &log.public_key.key_details)?;
    Ok(TLogAuthority {
        log_id: log.log_id.key_id.as_bytes().to_vec(),
        public_key,
        valid_for: log.public_key.valid_for.as_ref().into(),
    })
}

/// Parse key bytes according to a `PublicKeyDetails` name
///
/// Unrecognized or unspecified details fall back to SubjectPublicKeyInfo
/// with a scheme derived from the key itself.
pub fn public_key_from_details(raw: &[u8], key_details: &str) -> Result<PublicKey> {
    let invalid = |e: sigstore_crypto::Error| Error::InvalidMaterial(e.to_string());

    if key_details == "PKCS1_RSA_PKCS1V5" {
        return PublicKey::from_pkcs1_der(raw)
            .and_then(|key| key.with_scheme(SigningScheme::RsaPkcs1Sha256))
            .map_err(invalid);
    }

    let key = PublicKey::from_spki_der(raw).map_err(invalid)?;
    let scheme = match key_details {
        "PKIX_ECDSA_P256_SHA_256" => Some(SigningScheme::EcdsaP256Sha256),
        "PKIX_ECDSA_P384_SHA_384" => Some(SigningScheme::EcdsaP384Sha384),
        "PKIX_ECDSA_P521_SHA_512" => Some(SigningScheme::EcdsaP521Sha512),
        "PKIX_ED25519" => Some(SigningScheme::Ed25519),
        "PKIX_RSA_PKCS1V15_2048_SHA256"
        | "PKIX_RSA_PKCS1V15_3072_SHA256"
        | "PKIX_RSA_PKCS1V15_4096_SHA256" => Some(SigningScheme::RsaPkcs1Sha256),
        "PKIX_RSA_PSS_2048_SHA256" | "PKIX_RSA_PSS_3072_SHA256" | "PKIX_RSA_PSS_4096_SHA256" => {
            Some(SigningScheme::RsaPssSha256)
        }
        _ => None,
    };
    match scheme {
        Some(scheme) => key.with_scheme(scheme).map_err(invalid),
        None => Ok(key),
    }
}
