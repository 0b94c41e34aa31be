//! Signer identity policy

use crate::error::{Error, Result};
use crate::verify::{CertificateExtensions, Signer, VerificationPolicy};
use regex::Regex;

/// Check the signer against `policy`.
///
/// A signer without a certificate identity only satisfies an empty policy.
pub(crate) fn verify_policy(policy: &VerificationPolicy, signer: &Signer) -> Result<()> {
    if policy.is_empty() {
        return Ok(());
    }

    let identity = signer.identity.as_ref().ok_or_else(|| {
        Error::UntrustedSigner(
            "an identity policy was given but the signer has no certificate identity".to_string(),
        )
    })?;

    if let Some(pattern) = &policy.subject_alternative_name {
        verify_subject_alternative_name(pattern, identity.subject_alternative_name.as_deref())?;
    }
    verify_extensions(&policy.extensions, &identity.extensions)
}

/// Match the signer's SAN against a regular expression.
///
/// The pattern is not anchored: it matches if it occurs anywhere in the SAN.
pub fn verify_subject_alternative_name(pattern: &str, signer: Option<&str>) -> Result<()> {
    let regex = Regex::new(pattern).map_err(|e| {
        Error::UntrustedSigner(format!("invalid identity pattern {:?}: {}", pattern, e))
    })?;

    match signer {
        Some(san) if regex.is_match(san) => Ok(()),
        Some(san) => Err(Error::UntrustedSigner(format!(
            "certificate identity {:?} does not match {:?}",
            san, pattern
        ))),
        None => Err(Error::UntrustedSigner(
            "certificate has no subject alternative name".to_string(),
        )),
    }
}

/// Require every extension set in `policy` to equal the signer's value
pub fn verify_extensions(
    policy: &CertificateExtensions,
    signer: &CertificateExtensions,
) -> Result<()> {
    if let Some(expected) = &policy.issuer {
        if signer.issuer.as_ref() != Some(expected) {
            return Err(Error::UntrustedSigner(format!(
                "certificate issuer {:?} does not match {:?}",
                signer.issuer, expected
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::CertificateIdentity;
    use crate::verify_impl::test_support::TestKey;

    fn certificate_signer(san: &str, issuer: &str) -> Signer {
        Signer {
            key: TestKey::new().public_key,
            identity: Some(CertificateIdentity {
                subject_alternative_name: Some(san.to_string()),
                extensions: CertificateExtensions {
                    issuer: Some(issuer.to_string()),
                },
            }),
        }
    }

    #[test]
    fn test_san_pattern() {
        let san = Some("https://github.com/org/repo/.github/workflows/release.yml@refs/heads/main");
        verify_subject_alternative_name("https://github.com/org/repo/", san).unwrap();
        verify_subject_alternative_name("^https://github\\.com/org/.*@refs/heads/main$", san)
            .unwrap();
        // Unanchored
        verify_subject_alternative_name("release", san).unwrap();

        assert!(verify_subject_alternative_name("^release", san).is_err());
        assert!(verify_subject_alternative_name("org/other", san).is_err());
        assert!(verify_subject_alternative_name("repo", None).is_err());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = verify_subject_alternative_name("(unclosed", Some("x")).unwrap_err();
        assert_eq!(err.code().as_str(), "UNTRUSTED_SIGNER_ERROR");
    }

    #[test]
    fn test_extensions_exact_match() {
        let signer = CertificateExtensions {
            issuer: Some("https://accounts.example.com".to_string()),
        };
        verify_extensions(&CertificateExtensions::default(), &signer).unwrap();
        verify_extensions(&signer, &signer).unwrap();

        let prefix = CertificateExtensions {
            issuer: Some("https://accounts.example".to_string()),
        };
        assert!(verify_extensions(&prefix, &signer).is_err());
        assert!(verify_extensions(&signer, &CertificateExtensions::default()).is_err());
    }

    #[test]
    fn test_policy() {
        let signer = certificate_signer("user@example.com", "https://accounts.example.com");

        verify_policy(&VerificationPolicy::default(), &signer).unwrap();
        verify_policy(
            &VerificationPolicy::default()
                .require_identity("@example\\.com$")
                .require_issuer("https://accounts.example.com"),
            &signer,
        )
        .unwrap();

        let err = verify_policy(
            &VerificationPolicy::default().require_issuer("https://other.example.com"),
            &signer,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UntrustedSigner(_)));
    }

    #[test]
    fn test_public_key_signer_with_policy() {
        let signer = Signer {
            key: TestKey::new().public_key,
            identity: None,
        };
        verify_policy(&VerificationPolicy::default(), &signer).unwrap();

        let err = verify_policy(
            &VerificationPolicy::default().require_issuer("https://accounts.example.com"),
            &signer,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UntrustedSigner(_)));
    }
}
