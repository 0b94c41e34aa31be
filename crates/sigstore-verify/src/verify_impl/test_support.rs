//! Fixtures and signers shared by the verifier's unit tests

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use base64::Engine;
use cms::cert::IssuerAndSerialNumber;
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{
    EncapsulatedContentInfo, SignedData, SignerIdentifier, SignerInfo, SignerInfos,
};
use const_oid::db::rfc5912::ECDSA_WITH_SHA_256;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, Int, OctetString, SetOfVec};
use der::{Encode, Tag};
use sigstore_crypto::{Certificate, PublicKey};
use sigstore_trust_root::{
    CertAuthority, KeySource, TLogAuthority, TrustMaterial, TrustedRoot, ValidityPeriod,
};
use sigstore_tsa::asn1::{
    MessageImprint, TstInfo, ID_CONTENT_TYPE, ID_CT_TST_INFO, ID_MESSAGE_DIGEST, ID_SHA256,
    ID_SIGNED_DATA,
};
use sigstore_types::{CheckpointEnvelope, HashBytes, InclusionProof, Sha256Hash};
use x509_cert::attr::Attribute;
use x509_cert::spki::AlgorithmIdentifierOwned;

pub(crate) const TRUSTED_ROOT_JSON: &str =
    include_str!("../../tests/fixtures/trusted_root.json");
pub(crate) const DSSE_BUNDLE_JSON: &str =
    include_str!("../../tests/fixtures/dsse_v03.sigstore.json");
const CONFORMANCE_LEAF: &str = include_str!("../../tests/fixtures/conformance_leaf.b64");

const P256_SPKI_PREFIX: &str = "3059301306072a8648ce3d020106082a8648ce3d030107034200";

/// Trust material for the public-good instance, without TSAs
pub(crate) fn public_good() -> TrustMaterial {
    let root = TrustedRoot::from_json(TRUSTED_ROOT_JSON).unwrap();
    TrustMaterial::from_trusted_root(&root, KeySource::default()).unwrap()
}

/// A Fulcio leaf issued by the public-good intermediate on 2023-07-12,
/// carrying one embedded SCT.
pub(crate) fn conformance_leaf() -> Certificate {
    let der = base64::engine::general_purpose::STANDARD
        .decode(CONFORMANCE_LEAF.trim())
        .unwrap();
    Certificate::from_der(&der).unwrap()
}

/// An ECDSA P-256 signer
pub(crate) struct TestKey {
    pair: EcdsaKeyPair,
    pub public_key: PublicKey,
    pub spki: Vec<u8>,
}

impl TestKey {
    pub(crate) fn new() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
        Self::from_pkcs8(pkcs8.as_ref())
    }

    fn from_pkcs8(pkcs8: &[u8]) -> Self {
        let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8).unwrap();
        let mut spki = hex::decode(P256_SPKI_PREFIX).unwrap();
        spki.extend_from_slice(pair.public_key().as_ref());
        let public_key = PublicKey::from_spki_der(&spki).unwrap();
        Self {
            pair,
            public_key,
            spki,
        }
    }

    pub(crate) fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.pair
            .sign(&SystemRandom::new(), data)
            .unwrap()
            .as_ref()
            .to_vec()
    }

    /// Log ID as Rekor derives it: SHA-256 of the DER public key
    pub(crate) fn log_id(&self) -> Vec<u8> {
        sigstore_crypto::sha256(&self.spki).as_bytes().to_vec()
    }

    pub(crate) fn log_authority(&self, valid_for: ValidityPeriod) -> TLogAuthority {
        TLogAuthority {
            log_id: self.log_id(),
            public_key: self.public_key.clone(),
            valid_for,
        }
    }

    /// Signed entry timestamp over an entry's identifying fields
    pub(crate) fn sign_entry(
        &self,
        body: &[u8],
        integrated_time: i64,
        log_index: i64,
    ) -> Vec<u8> {
        let payload = serde_json::json!({
            "body": base64::engine::general_purpose::STANDARD.encode(body),
            "integratedTime": integrated_time,
            "logIndex": log_index,
            "logID": hex::encode(self.log_id()),
        });
        self.sign(&serde_json_canonicalizer::to_vec(&payload).unwrap())
    }

    /// Inclusion proof for a one-leaf tree holding `body`, with a checkpoint
    /// signed by this key. `checkpoint_root` replaces the committed root.
    pub(crate) fn inclusion_proof(
        &self,
        body: &[u8],
        checkpoint_root: Option<Sha256Hash>,
    ) -> InclusionProof {
        let root = sigstore_merkle::hash_leaf(body);
        let note = format!(
            "test.log - 1\n1\n{}\n",
            base64::engine::general_purpose::STANDARD
                .encode(checkpoint_root.unwrap_or(root).as_bytes())
        );
        let mut signature = self.log_id()[..4].to_vec();
        signature.extend(self.sign(note.as_bytes()));
        let envelope = format!(
            "{}\n\u{2014} test.log {}\n",
            note,
            base64::engine::general_purpose::STANDARD.encode(signature)
        );
        InclusionProof {
            log_index: 0,
            root_hash: HashBytes::new(root.as_bytes().to_vec()),
            tree_size: 1,
            hashes: vec![],
            checkpoint: Some(CheckpointEnvelope { envelope }),
        }
    }
}

/// `hashedrekord` 0.0.1 body recording `signature` over `digest`
pub(crate) fn hashedrekord_body(signature: &[u8], digest: &[u8]) -> Vec<u8> {
    serde_json::json!({
        "apiVersion": "0.0.1",
        "kind": "hashedrekord",
        "spec": {
            "data": {"hash": {"algorithm": "sha256", "value": hex::encode(digest)}},
            "signature": {
                "content": base64::engine::general_purpose::STANDARD.encode(signature),
                "publicKey": {"content": ""}
            }
        }
    })
    .to_string()
    .into_bytes()
}

/// A self-signed timestamp authority
pub(crate) struct TestTsa {
    pub cert: Certificate,
    key: TestKey,
}

impl TestTsa {
    pub(crate) fn new(name: &str) -> Self {
        let key = rcgen::KeyPair::generate().unwrap();
        let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, name);
        let cert = params.self_signed(&key).unwrap();
        Self {
            cert: Certificate::from_der(cert.der()).unwrap(),
            key: TestKey::from_pkcs8(&key.serialize_der()),
        }
    }

    pub(crate) fn authority(&self, valid_for: ValidityPeriod) -> CertAuthority {
        CertAuthority {
            cert_chain: vec![self.cert.clone()],
            valid_for,
        }
    }

    /// A DER `ContentInfo` timestamp token over `data` at `gen_time`
    /// (GeneralizedTime text)
    pub(crate) fn token(&self, data: &[u8], gen_time: &str) -> Vec<u8> {
        let sha256_id = || AlgorithmIdentifierOwned {
            oid: ID_SHA256,
            parameters: None,
        };
        let octets = |bytes: &[u8]| OctetString::new(bytes.to_vec()).unwrap();
        let attribute = |oid: ObjectIdentifier, value: Any| Attribute {
            oid,
            values: SetOfVec::try_from(vec![value]).unwrap(),
        };

        let tst_info = TstInfo {
            version: 1,
            policy: ObjectIdentifier::new_unwrap("1.3.6.1.4.1.57264.2"),
            message_imprint: MessageImprint {
                hash_algorithm: sha256_id(),
                hashed_message: octets(sigstore_crypto::sha256(data).as_bytes()),
            },
            serial_number: Int::new(&[0x01]).unwrap(),
            gen_time: Any::new(Tag::GeneralizedTime, gen_time.as_bytes()).unwrap(),
            accuracy: None,
            ordering: false,
            nonce: None,
            tsa: None,
            extensions: None,
        };
        let tst_der = tst_info.to_der().unwrap();

        let attrs = SetOfVec::try_from(vec![
            attribute(ID_CONTENT_TYPE, Any::encode_from(&ID_CT_TST_INFO).unwrap()),
            attribute(
                ID_MESSAGE_DIGEST,
                Any::encode_from(&octets(sigstore_crypto::sha256(&tst_der).as_bytes())).unwrap(),
            ),
        ])
        .unwrap();
        let signature = self.key.sign(&attrs.to_der().unwrap());

        let signer = SignerInfo {
            version: CmsVersion::V1,
            sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                issuer: self.cert.issuer().clone(),
                serial_number: self.cert.inner().tbs_certificate.serial_number.clone(),
            }),
            digest_alg: sha256_id(),
            signed_attrs: Some(attrs),
            signature_algorithm: AlgorithmIdentifierOwned {
                oid: ECDSA_WITH_SHA_256,
                parameters: None,
            },
            signature: octets(&signature),
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
}
