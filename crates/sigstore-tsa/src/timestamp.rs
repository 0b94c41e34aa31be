//! RFC 3161 timestamp tokens
//!
//! A token is a CMS `SignedData` whose encapsulated content is a `TSTInfo`.
//! Bundles usually carry the bare `ContentInfo`, but some clients store the
//! whole `TimeStampResp`; both forms are accepted.

use chrono::{DateTime, Utc};
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use const_oid::ObjectIdentifier;
use der::asn1::OctetString;
use der::{Decode, Encode, Tag, Tagged};
use sigstore_crypto::{constant_time_eq, KeyType, PublicKey, SigningScheme};
use sigstore_types::HashAlgorithm;
use x509_cert::name::Name;

use crate::asn1::{
    TimeStampResp, TstInfo, ID_CONTENT_TYPE, ID_CT_TST_INFO, ID_MESSAGE_DIGEST, ID_SHA256,
    ID_SHA384, ID_SHA512, ID_SIGNED_DATA,
};
use crate::error::{Error, Result};

/// PKIStatus values that carry a token
const STATUS_GRANTED: u32 = 0;
const STATUS_GRANTED_WITH_MODS: u32 = 1;

/// A parsed timestamp token
#[derive(Debug, Clone)]
pub struct Rfc3161Timestamp {
    signed_data: SignedData,
    tst_info: TstInfo,
    tst_info_der: Vec<u8>,
    signing_time: DateTime<Utc>,
}

impl Rfc3161Timestamp {
    /// Parse a DER `ContentInfo` or `TimeStampResp`
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let content_info = match ContentInfo::from_der(bytes) {
            Ok(info) => info,
            Err(content_info_err) => {
                let resp = TimeStampResp::from_der(bytes).map_err(|_| content_info_err)?;
                let status = resp.status.status;
                if status != STATUS_GRANTED && status != STATUS_GRANTED_WITH_MODS {
                    return Err(Error::Rejected(status));
                }
                resp.time_stamp_token.ok_or_else(|| {
                    Error::Malformed("response does not contain a token".to_string())
                })?
            }
        };

        if content_info.content_type != ID_SIGNED_DATA {
            return Err(Error::Malformed(format!(
                "content type {} is not signedData",
                content_info.content_type
            )));
        }
        let signed_data: SignedData = content_info.content.decode_as()?;

        if signed_data.signer_infos.0.len() != 1 {
            return Err(Error::Malformed(format!(
                "expected exactly one signer, found {}",
                signed_data.signer_infos.0.len()
            )));
        }

        let encap = &signed_data.encap_content_info;
        if encap.econtent_type != ID_CT_TST_INFO {
            return Err(Error::Malformed(format!(
                "encapsulated content type {} is not TSTInfo",
                encap.econtent_type
            )));
        }
        let econtent = encap
            .econtent
            .as_ref()
            .ok_or_else(|| Error::Malformed("missing encapsulated TSTInfo".to_string()))?;
        if econtent.tag() != Tag::OctetString {
            return Err(Error::Malformed(
                "encapsulated content is not an OCTET STRING".to_string(),
            ));
        }
        let tst_info_der = econtent.value().to_vec();
        let tst_info = TstInfo::from_der(&tst_info_der)?;
        let signing_time = tst_info.gen_time()?;

        tracing::trace!(
            "parsed timestamp token, genTime {}, policy {}",
            signing_time,
            tst_info.policy
        );

        Ok(Self {
            signed_data,
            tst_info,
            tst_info_der,
            signing_time,
        })
    }

    /// The `genTime` asserted by the authority
    pub fn signing_time(&self) -> DateTime<Utc> {
        self.signing_time
    }

    fn signer_info(&self) -> Result<&SignerInfo> {
        self.signed_data
            .signer_infos
            .0
            .iter()
            .next()
            .ok_or_else(|| Error::Malformed("token has no signer".to_string()))
    }

    /// Serial number of the signing certificate, when the signer is named by
    /// issuer and serial.
    pub fn signer_serial_number(&self) -> Option<&[u8]> {
        match &self.signer_info().ok()?.sid {
            SignerIdentifier::IssuerAndSerialNumber(ias) => Some(ias.serial_number.as_bytes()),
            SignerIdentifier::SubjectKeyIdentifier(_) => None,
        }
    }

    /// Issuer of the signing certificate
    pub fn signer_issuer(&self) -> Option<&Name> {
        match &self.signer_info().ok()?.sid {
            SignerIdentifier::IssuerAndSerialNumber(ias) => Some(&ias.issuer),
            SignerIdentifier::SubjectKeyIdentifier(_) => None,
        }
    }

    /// Check that the token covers `data` and was signed by `key`
    pub fn verify(&self, data: &[u8], key: &PublicKey) -> Result<()> {
        let imprint = &self.tst_info.message_imprint;
        let imprint_alg = hash_algorithm(imprint.hash_algorithm.oid)?;
        let expected = sigstore_crypto::digest(imprint_alg, data)?;
        if !constant_time_eq(&expected, imprint.hashed_message.as_bytes()) {
            return Err(Error::ImprintMismatch);
        }

        let signer = self.signer_info()?;
        let digest_alg = hash_algorithm(signer.digest_alg.oid)?;

        let signed_bytes = match &signer.signed_attrs {
            Some(attrs) => {
                let mut message_digest = None;
                for attr in attrs.iter() {
                    let Some(value) = attr.values.iter().next() else {
                        continue;
                    };
                    if attr.oid == ID_MESSAGE_DIGEST {
                        message_digest = Some(value.decode_as::<OctetString>()?);
                    } else if attr.oid == ID_CONTENT_TYPE {
                        let content_type: ObjectIdentifier = value.decode_as()?;
                        if content_type != ID_CT_TST_INFO {
                            return Err(Error::Malformed(format!(
                                "signed content type {} is not TSTInfo",
                                content_type
                            )));
                        }
                    }
                }
                let message_digest = message_digest.ok_or_else(|| {
                    Error::Malformed("signed attributes lack messageDigest".to_string())
                })?;
                let content_digest = sigstore_crypto::digest(digest_alg, &self.tst_info_der)?;
                if !constant_time_eq(&content_digest, message_digest.as_bytes()) {
                    return Err(Error::MessageDigestMismatch);
                }
                attrs.to_der()?
            }
            None => self.tst_info_der.clone(),
        };

        let scheme = signer_scheme(signer, key, digest_alg)?;
        key.verify_with_scheme(scheme, &signed_bytes, signer.signature.as_bytes())?;
        Ok(())
    }
}

fn hash_algorithm(oid: ObjectIdentifier) -> Result<HashAlgorithm> {
    match oid {
        ID_SHA256 => Ok(HashAlgorithm::Sha2_256),
        ID_SHA384 => Ok(HashAlgorithm::Sha2_384),
        ID_SHA512 => Ok(HashAlgorithm::Sha2_512),
        other => Err(Error::UnsupportedDigest(other.to_string())),
    }
}

/// Pick the scheme for the signer's signature.
///
/// Many authorities put the bare key algorithm (`rsaEncryption`,
/// `id-ecPublicKey`) in `signatureAlgorithm`, in which case the digest
/// algorithm decides.
fn signer_scheme(
    signer: &SignerInfo,
    key: &PublicKey,
    digest_alg: HashAlgorithm,
) -> Result<SigningScheme> {
    if let Ok(scheme) = SigningScheme::for_signature_algorithm(signer.signature_algorithm.oid, key)
    {
        return Ok(scheme);
    }
    let scheme = match (key.key_type(), digest_alg) {
        (KeyType::EcP256, HashAlgorithm::Sha2_256) => SigningScheme::EcdsaP256Sha256,
        (KeyType::EcP256, HashAlgorithm::Sha2_384) => SigningScheme::EcdsaP256Sha384,
        (KeyType::EcP384, HashAlgorithm::Sha2_256) => SigningScheme::EcdsaP384Sha256,
        (KeyType::EcP384, HashAlgorithm::Sha2_384) => SigningScheme::EcdsaP384Sha384,
        (KeyType::EcP521, HashAlgorithm::Sha2_512) => SigningScheme::EcdsaP521Sha512,
        (KeyType::Ed25519, _) => SigningScheme::Ed25519,
        (KeyType::Rsa, HashAlgorithm::Sha2_256) => SigningScheme::RsaPkcs1Sha256,
        (KeyType::Rsa, HashAlgorithm::Sha2_384) => SigningScheme::RsaPkcs1Sha384,
        (KeyType::Rsa, HashAlgorithm::Sha2_512) => SigningScheme::RsaPkcs1Sha512,
        (key_type, digest) => {
            return Err(Error::Malformed(format!(
                "signature algorithm {} with {:?} key and {:?} digest",
                signer.signature_algorithm.oid, key_type, digest
            )))
        }
    };
    Ok(scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::{MessageImprint, PkiStatusInfo};
    use aws_lc_rs::rand::SystemRandom;
    use aws_lc_rs::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
    use cms::cert::IssuerAndSerialNumber;
    use cms::content_info::CmsVersion;
    use cms::signed_data::{EncapsulatedContentInfo, SignerInfos};
    use const_oid::db::rfc5912::ECDSA_WITH_SHA_256;
    use der::asn1::{Any, Int, SetOfVec};
    use sigstore_crypto::{sha256, Certificate};
    use x509_cert::attr::Attribute;
    use x509_cert::spki::AlgorithmIdentifierOwned;

    struct TestAuthority {
        cert: Certificate,
        key: EcdsaKeyPair,
    }

    fn authority(name: &str) -> TestAuthority {
        let key = rcgen::KeyPair::generate().unwrap();
        let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, name);
        let cert = params.self_signed(&key).unwrap();
        TestAuthority {
            cert: Certificate::from_der(cert.der()).unwrap(),
            key: EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &key.serialize_der())
                .unwrap(),
        }
    }

    fn sha256_id() -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: ID_SHA256,
            parameters: None,
        }
    }

    fn octets(bytes: &[u8]) -> OctetString {
        OctetString::new(bytes.to_vec()).unwrap()
    }

    fn attribute(oid: ObjectIdentifier, value: Any) -> Attribute {
        Attribute {
            oid,
            values: SetOfVec::try_from(vec![value]).unwrap(),
        }
    }

    /// Build a signed token over `data`; `content_digest` overrides the
    /// messageDigest attribute.
    fn token(
        tsa: &TestAuthority,
        data: &[u8],
        gen_time: &str,
        content_digest: Option<&[u8]>,
    ) -> Vec<u8> {
        let tst_info = TstInfo {
            version: 1,
            policy: ObjectIdentifier::new_unwrap("1.3.6.1.4.1.57264.2"),
            message_imprint: MessageImprint {
                hash_algorithm: sha256_id(),
                hashed_message: octets(sha256(data).as_bytes()),
            },
            serial_number: Int::new(&[0x2a]).unwrap(),
            gen_time: Any::new(Tag::GeneralizedTime, gen_time.as_bytes()).unwrap(),
            accuracy: None,
            ordering: false,
            nonce: None,
            tsa: None,
            extensions: None,
        };
        let tst_der = tst_info.to_der().unwrap();
        let digest = sha256(&tst_der);
        let digest = content_digest.unwrap_or(digest.as_bytes());

        let attrs = SetOfVec::try_from(vec![
            attribute(ID_CONTENT_TYPE, Any::encode_from(&ID_CT_TST_INFO).unwrap()),
            attribute(
                ID_MESSAGE_DIGEST,
                Any::encode_from(&octets(digest)).unwrap(),
            ),
        ])
        .unwrap();
        let signature = tsa
            .key
            .sign(&SystemRandom::new(), &attrs.to_der().unwrap())
            .unwrap();

        let signer = SignerInfo {
            version: CmsVersion::V1,
            sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                issuer: tsa.cert.issuer().clone(),
                serial_number: tsa.cert.inner().tbs_certificate.serial_number.clone(),
            }),
            digest_alg: sha256_id(),
            signed_attrs: Some(attrs),
            signature_algorithm: AlgorithmIdentifierOwned {
                oid: ECDSA_WITH_SHA_256,
                parameters: None,
            },
            signature: octets(signature.as_ref()),
            unsigned_attrs: None,
        };
        let signed_data = SignedData {
            version: CmsVersion::V3,
            digest_algorithms: SetOfVec::try_from(vec![sha256_id()]).unwrap(),
            encap_content_info: EncapsulatedContentInfo {
                econtent_type: ID_CT_TST_INFO,
                econtent: Some(Any::encode_from(&octets(&tst_der)).unwrap()),
            },
            certificates: None,
            crls: None,
            signer_infos: SignerInfos(SetOfVec::try_from(vec![signer]).unwrap()),
        };
        ContentInfo {
            content_type: ID_SIGNED_DATA,
            content: Any::encode_from(&signed_data).unwrap(),
        }
        .to_der()
        .unwrap()
    }

    #[test]
    fn test_verify_token() {
        let tsa = authority("test-tsa");
        let der = token(&tsa, b"signature bytes", "20250128102815Z", None);
        let ts = Rfc3161Timestamp::from_der(&der).unwrap();

        assert_eq!(ts.signing_time().timestamp(), 1738060095);
        assert_eq!(ts.tst_info.version, 1);
        assert_eq!(ts.signer_serial_number(), Some(tsa.cert.serial_number()));
        assert_eq!(ts.signer_issuer(), Some(tsa.cert.issuer()));
        ts.verify(b"signature bytes", tsa.cert.public_key()).unwrap();
    }

    #[test]
    fn test_imprint_mismatch() {
        let tsa = authority("test-tsa");
        let der = token(&tsa, b"signature bytes", "20250128102815Z", None);
        let ts = Rfc3161Timestamp::from_der(&der).unwrap();
        assert!(matches!(
            ts.verify(b"other bytes", tsa.cert.public_key()),
            Err(Error::ImprintMismatch)
        ));
    }

    #[test]
    fn test_wrong_signing_key() {
        let tsa = authority("test-tsa");
        let other = authority("other-tsa");
        let der = token(&tsa, b"signature bytes", "20250128102815Z", None);
        let ts = Rfc3161Timestamp::from_der(&der).unwrap();
        assert!(matches!(
            ts.verify(b"signature bytes", other.cert.public_key()),
            Err(Error::Signature(_))
        ));
    }

    #[test]
    fn test_message_digest_attribute_mismatch() {
        let tsa = authority("test-tsa");
        let der = token(&tsa, b"signature bytes", "20250128102815Z", Some(&[0u8; 32]));
        let ts = Rfc3161Timestamp::from_der(&der).unwrap();
        assert!(matches!(
            ts.verify(b"signature bytes", tsa.cert.public_key()),
            Err(Error::MessageDigestMismatch)
        ));
    }

    #[test]
    fn test_fractional_gen_time() {
        let tsa = authority("test-tsa");
        let der = token(&tsa, b"x", "20250128102815.123Z", None);
        let ts = Rfc3161Timestamp::from_der(&der).unwrap();
        assert_eq!(ts.signing_time().timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_time_stamp_resp_envelope() {
        let tsa = authority("test-tsa");
        let der = token(&tsa, b"signature bytes", "20250128102815Z", None);
        let resp = TimeStampResp {
            status: PkiStatusInfo {
                status: 0,
                status_string: None,
                fail_info: None,
            },
            time_stamp_token: Some(ContentInfo::from_der(&der).unwrap()),
        };
        let ts = Rfc3161Timestamp::from_der(&resp.to_der().unwrap()).unwrap();
        ts.verify(b"signature bytes", tsa.cert.public_key()).unwrap();

        let rejected = TimeStampResp {
            status: PkiStatusInfo {
                status: 2,
                status_string: Some(vec!["bad request".to_string()]),
                fail_info: None,
            },
            time_stamp_token: None,
        };
        assert!(matches!(
            Rfc3161Timestamp::from_der(&rejected.to_der().unwrap()),
            Err(Error::Rejected(2))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(Rfc3161Timestamp::from_der(b"not a timestamp").is_err());
        assert!(Rfc3161Timestamp::from_der(&[]).is_err());
    }
}
