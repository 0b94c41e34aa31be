//! Bundle verification entry points

use crate::error::{Error, Result};
use crate::verify_impl::entity::SignedEntity;
use crate::verify_impl::key::verify_key;
use crate::verify_impl::policy::verify_policy;
use crate::verify_impl::rekor::verify_tlog_body;
use crate::verify_impl::timestamp::verify_timestamps;
use crate::verify_impl::tlog::verify_tlog_witness;
use sigstore_bundle::{validate_bundle, ValidatedBundle};
use sigstore_crypto::PublicKey;
use sigstore_trust_root::TrustMaterial;
use sigstore_types::Bundle;

/// Thresholds and checks applied to every bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierOptions {
    /// Minimum number of verified transparency log entries
    pub tlog_threshold: usize,
    /// Minimum number of verified SCTs from distinct CT logs; 0 skips SCTs
    pub ctlog_threshold: usize,
    /// Minimum number of verified timestamps
    pub timestamp_threshold: usize,
    /// Require the Fulcio key usage profile on signing certificates
    pub check_x509_profile: bool,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            tlog_threshold: 1,
            ctlog_threshold: 1,
            timestamp_threshold: 1,
            check_x509_profile: true,
        }
    }
}

impl VerifierOptions {
    pub fn with_tlog_threshold(mut self, threshold: usize) -> Self {
        self.tlog_threshold = threshold;
        self
    }

    pub fn with_ctlog_threshold(mut self, threshold: usize) -> Self {
        self.ctlog_threshold = threshold;
        self
    }

    pub fn with_timestamp_threshold(mut self, threshold: usize) -> Self {
        self.timestamp_threshold = threshold;
        self
    }

    pub fn with_x509_profile_check(mut self, check: bool) -> Self {
        self.check_x509_profile = check;
        self
    }
}

/// Fulcio certificate extensions a policy can pin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateExtensions {
    /// OIDC issuer that authenticated the signer
    pub issuer: Option<String>,
}

/// Identity claims of a certificate signer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateIdentity {
    pub subject_alternative_name: Option<String>,
    pub extensions: CertificateExtensions,
}

/// The key that produced a verified signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    pub key: PublicKey,
    /// Present when the key came from a certificate
    pub identity: Option<CertificateIdentity>,
}

/// Constraints on who may have signed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Regular expression the certificate SAN must match (unanchored)
    pub subject_alternative_name: Option<String>,
    /// Extension values the certificate must carry exactly
    pub extensions: CertificateExtensions,
}

impl VerificationPolicy {
    /// Require the SAN to match `pattern`
    pub fn require_identity(mut self, pattern: impl Into<String>) -> Self {
        self.subject_alternative_name = Some(pattern.into());
        self
    }

    /// Require the OIDC issuer extension to equal `issuer`
    pub fn require_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.extensions.issuer = Some(issuer.into());
        self
    }

    /// Whether the policy constrains nothing
    pub fn is_empty(&self) -> bool {
        self.subject_alternative_name.is_none() && self.extensions.issuer.is_none()
    }
}

/// Offline bundle verifier
///
/// Verification runs in a fixed order and stops at the first failure:
///
/// 1. timestamps (witnessed log entries and RFC 3161 tokens)
/// 2. signer key (trusted key lookup, or certificate chain, profile and SCTs)
/// 3. transparency log entries (witnesses and body match)
/// 4. the content signature
/// 5. the identity policy
#[derive(Debug, Clone)]
pub struct Verifier<'a> {
    trust_material: &'a TrustMaterial,
    options: VerifierOptions,
}

impl<'a> Verifier<'a> {
    pub fn new(trust_material: &'a TrustMaterial, options: VerifierOptions) -> Self {
        Self {
            trust_material,
            options,
        }
    }

    /// Validate and verify `bundle`.
    ///
    /// `artifact` is required for message signature bundles and ignored for
    /// DSSE bundles, whose payload is embedded.
    pub fn verify(
        &self,
        bundle: &Bundle,
        artifact: Option<&[u8]>,
        policy: &VerificationPolicy,
    ) -> Result<Signer> {
        let validated = validate_bundle(bundle)?;
        self.verify_validated(&validated, artifact, policy)
    }

    /// Verify a bundle returned by `validate_bundle`
    fn verify_validated(
        &self,
        bundle: &ValidatedBundle,
        artifact: Option<&[u8]>,
        policy: &VerificationPolicy,
    ) -> Result<Signer> {
        let entity = SignedEntity::new(bundle, artifact)?;

        let timestamps = verify_timestamps(
            &entity,
            &self.trust_material.timestamp_authorities,
            self.options.timestamp_threshold,
        )?;

        let signer = verify_key(&entity.key, self.trust_material, &timestamps, &self.options)?;

        self.verify_tlog_entries(&entity)?;

        entity.content.verify_signature(&signer.key)?;

        verify_policy(policy, &signer)?;

        tracing::debug!(
            identity = ?signer.identity.as_ref().and_then(|id| id.subject_alternative_name.as_deref()),
            "bundle verified"
        );
        Ok(signer)
    }

    fn verify_tlog_entries(&self, entity: &SignedEntity<'_>) -> Result<()> {
        let mut verified = 0;
        for entry in &entity.tlog_entries {
            verify_tlog_witness(entry, &self.trust_material.tlogs)?;
            verify_tlog_body(entry, entity.content.as_ref())?;
            verified += 1;
        }

        if verified < self.options.tlog_threshold {
            return Err(Error::Tlog(format!(
                "expected {} verified transparency log entries, got {}",
                self.options.tlog_threshold, verified
            )));
        }
        Ok(())
    }
}

/// Verify `bundle` with default options
pub fn verify(
    bundle: &Bundle,
    artifact: Option<&[u8]>,
    policy: &VerificationPolicy,
    trust_material: &TrustMaterial,
) -> Result<Signer> {
    Verifier::new(trust_material, VerifierOptions::default()).verify(bundle, artifact, policy)
}
