//! Public keys and signature verification
//!
//! Keys arrive as SubjectPublicKeyInfo DER (or PKCS#1 DER for some RSA log
//! keys). The signing scheme is either pinned by the caller, for instance from
//! trust-root key details, or derived from the key type and curve.

use crate::error::{Error, Result};
use aws_lc_rs::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use const_oid::db::rfc5912::{
    ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, ECDSA_WITH_SHA_512, ID_EC_PUBLIC_KEY, RSA_ENCRYPTION,
    SECP_256_R_1, SECP_384_R_1, SECP_521_R_1, SHA_256_WITH_RSA_ENCRYPTION,
    SHA_384_WITH_RSA_ENCRYPTION, SHA_512_WITH_RSA_ENCRYPTION,
};
use const_oid::db::rfc8410::ID_ED_25519;
use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use spki::SubjectPublicKeyInfoOwned;

/// Signature algorithm and digest combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningScheme {
    EcdsaP256Sha256,
    EcdsaP256Sha384,
    EcdsaP384Sha256,
    EcdsaP384Sha384,
    EcdsaP521Sha512,
    Ed25519,
    RsaPkcs1Sha256,
    RsaPkcs1Sha384,
    RsaPkcs1Sha512,
    RsaPssSha256,
    RsaPssSha384,
    RsaPssSha512,
}

impl SigningScheme {
    fn algorithm(&self) -> &'static dyn VerificationAlgorithm {
        match self {
            SigningScheme::EcdsaP256Sha256 => &signature::ECDSA_P256_SHA256_ASN1,
            SigningScheme::EcdsaP256Sha384 => &signature::ECDSA_P256_SHA384_ASN1,
            SigningScheme::EcdsaP384Sha256 => &signature::ECDSA_P384_SHA256_ASN1,
            SigningScheme::EcdsaP384Sha384 => &signature::ECDSA_P384_SHA384_ASN1,
            SigningScheme::EcdsaP521Sha512 => &signature::ECDSA_P521_SHA512_ASN1,
            SigningScheme::Ed25519 => &signature::ED25519,
            SigningScheme::RsaPkcs1Sha256 => &signature::RSA_PKCS1_2048_8192_SHA256,
            SigningScheme::RsaPkcs1Sha384 => &signature::RSA_PKCS1_2048_8192_SHA384,
            SigningScheme::RsaPkcs1Sha512 => &signature::RSA_PKCS1_2048_8192_SHA512,
            SigningScheme::RsaPssSha256 => &signature::RSA_PSS_2048_8192_SHA256,
            SigningScheme::RsaPssSha384 => &signature::RSA_PSS_2048_8192_SHA384,
            SigningScheme::RsaPssSha512 => &signature::RSA_PSS_2048_8192_SHA512,
        }
    }

    fn key_type(&self) -> KeyType {
        match self {
            SigningScheme::EcdsaP256Sha256 | SigningScheme::EcdsaP256Sha384 => KeyType::EcP256,
            SigningScheme::EcdsaP384Sha256 | SigningScheme::EcdsaP384Sha384 => KeyType::EcP384,
            SigningScheme::EcdsaP521Sha512 => KeyType::EcP521,
            SigningScheme::Ed25519 => KeyType::Ed25519,
            _ => KeyType::Rsa,
        }
    }

    /// Scheme for an X.509 `signatureAlgorithm`, given the issuer's key.
    ///
    /// ECDSA OIDs only name the digest, so the curve comes from the key.
    pub fn for_signature_algorithm(oid: ObjectIdentifier, issuer_key: &PublicKey) -> Result<Self> {
        let scheme = match (issuer_key.key_type, oid) {
            (KeyType::EcP256, ECDSA_WITH_SHA_256) => SigningScheme::EcdsaP256Sha256,
            (KeyType::EcP256, ECDSA_WITH_SHA_384) => SigningScheme::EcdsaP256Sha384,
            (KeyType::EcP384, ECDSA_WITH_SHA_256) => SigningScheme::EcdsaP384Sha256,
            (KeyType::EcP384, ECDSA_WITH_SHA_384) => SigningScheme::EcdsaP384Sha384,
            (KeyType::EcP521, ECDSA_WITH_SHA_512) => SigningScheme::EcdsaP521Sha512,
            (KeyType::Ed25519, ID_ED_25519) => SigningScheme::Ed25519,
            (KeyType::Rsa, SHA_256_WITH_RSA_ENCRYPTION) => SigningScheme::RsaPkcs1Sha256,
            (KeyType::Rsa, SHA_384_WITH_RSA_ENCRYPTION) => SigningScheme::RsaPkcs1Sha384,
            (KeyType::Rsa, SHA_512_WITH_RSA_ENCRYPTION) => SigningScheme::RsaPkcs1Sha512,
            (key_type, oid) => {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "signature algorithm {} with {:?} key",
                    oid, key_type
                )))
            }
        };
        Ok(scheme)
    }
}

/// Public key family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    EcP256,
    EcP384,
    EcP521,
    Ed25519,
    Rsa,
}

impl KeyType {
    fn default_scheme(&self) -> SigningScheme {
        match self {
            KeyType::EcP256 => SigningScheme::EcdsaP256Sha256,
            KeyType::EcP384 => SigningScheme::EcdsaP384Sha384,
            KeyType::EcP521 => SigningScheme::EcdsaP521Sha512,
            KeyType::Ed25519 => SigningScheme::Ed25519,
            KeyType::Rsa => SigningScheme::RsaPkcs1Sha256,
        }
    }
}

/// A verification key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    key_type: KeyType,
    scheme: Option<SigningScheme>,
    /// Key bytes as aws-lc-rs expects them: the EC point, the Ed25519 key or
    /// the PKCS#1 RSAPublicKey.
    raw: Vec<u8>,
}

impl PublicKey {
    /// Parse a SubjectPublicKeyInfo DER blob
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoOwned::from_der(der)?;
        Self::from_spki(&spki)
    }

    /// Build from an already decoded SubjectPublicKeyInfo
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let key_type = match spki.algorithm.oid {
            ID_EC_PUBLIC_KEY => {
                let curve = extract_ec_curve_oid(spki)?;
                match curve {
                    SECP_256_R_1 => KeyType::EcP256,
                    SECP_384_R_1 => KeyType::EcP384,
                    SECP_521_R_1 => KeyType::EcP521,
                    other => {
                        return Err(Error::UnsupportedAlgorithm(format!("EC curve {}", other)))
                    }
                }
            }
            RSA_ENCRYPTION => KeyType::Rsa,
            ID_ED_25519 => KeyType::Ed25519,
            other => {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "public key algorithm {}",
                    other
                )))
            }
        };

        let raw = spki
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| Error::InvalidKey("public key bit string is not octet aligned".into()))?
            .to_vec();

        Ok(Self {
            key_type,
            scheme: None,
            raw,
        })
    }

    /// Parse a PKCS#1 RSAPublicKey DER blob
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        if der.is_empty() {
            return Err(Error::InvalidKey("empty RSA key".into()));
        }
        Ok(Self {
            key_type: KeyType::Rsa,
            scheme: None,
            raw: der.to_vec(),
        })
    }

    /// Pin the scheme used by [`PublicKey::verify`]
    pub fn with_scheme(mut self, scheme: SigningScheme) -> Result<Self> {
        if scheme.key_type() != self.key_type {
            return Err(Error::UnsupportedAlgorithm(format!(
                "scheme {:?} cannot be used with a {:?} key",
                scheme, self.key_type
            )));
        }
        self.scheme = Some(scheme);
        Ok(self)
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// The scheme [`PublicKey::verify`] uses
    pub fn scheme(&self) -> SigningScheme {
        self.scheme
            .unwrap_or_else(|| self.key_type.default_scheme())
    }

    /// Verify `signature` over `data` with this key's scheme
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        self.verify_with_scheme(self.scheme(), data, signature)
    }

    /// Verify `signature` over `data` with an explicit scheme
    pub fn verify_with_scheme(
        &self,
        scheme: SigningScheme,
        data: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        if scheme.key_type() != self.key_type {
            return Err(Error::UnsupportedAlgorithm(format!(
                "scheme {:?} cannot be used with a {:?} key",
                scheme, self.key_type
            )));
        }
        UnparsedPublicKey::new(scheme.algorithm(), &self.raw)
            .verify(data, signature)
            .map_err(|_| Error::VerificationFailed)
    }
}

/// Extract the EC curve OID from a SubjectPublicKeyInfo
///
/// For EC keys, the algorithm parameters contain the curve OID
fn extract_ec_curve_oid(spki: &SubjectPublicKeyInfoOwned) -> Result<ObjectIdentifier> {
    let Some(params) = &spki.algorithm.parameters else {
        return Err(Error::InvalidKey(
            "EC public key missing curve parameters".to_string(),
        ));
    };

    // `value()` is the OID content without tag and length
    ObjectIdentifier::from_bytes(params.value())
        .map_err(|e| Error::InvalidKey(format!("failed to parse EC curve OID: {}", e)))
}

/// Re-encode a SubjectPublicKeyInfo as DER
pub fn spki_to_der(spki: &SubjectPublicKeyInfoOwned) -> Result<Vec<u8>> {
    Ok(spki.to_der()?)
}
