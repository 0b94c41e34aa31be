use chrono::DateTime;
use sigstore_crypto::{KeyType, SigningScheme};
use sigstore_trust_root::{KeySource, TrustMaterial, TrustedRoot, TRUSTED_ROOT_MEDIA_TYPE};

const TRUSTED_ROOT: &str = include_str!("fixtures/trusted_root.json");

#[test]
fn test_public_good_root() {
    let root = TrustedRoot::from_json(TRUSTED_ROOT).unwrap();
    assert_eq!(root.media_type, TRUSTED_ROOT_MEDIA_TYPE);

    let material = TrustMaterial::from_trusted_root(&root, KeySource::default()).unwrap();
    assert_eq!(material.certificate_authorities.len(), 1);
    assert_eq!(material.tlogs.len(), 1);
    assert_eq!(material.ctlogs.len(), 1);
    assert!(material.timestamp_authorities.is_empty());

    let fulcio = &material.certificate_authorities[0];
    assert_eq!(fulcio.cert_chain.len(), 2);
    let intermediate = &fulcio.cert_chain[0];
    let root_cert = fulcio.cert_chain.last().unwrap();
    assert!(intermediate.is_ca());
    assert_eq!(intermediate.path_len_constraint(), Some(0));
    assert!(root_cert.has_self_issued_name());
    intermediate.verify_signed_by(root_cert.public_key()).unwrap();
    assert_eq!(intermediate.public_key().key_type(), KeyType::EcP384);

    let start = DateTime::parse_from_rfc3339("2022-04-13T20:06:15Z").unwrap();
    assert_eq!(fulcio.valid_for.start, start);
    assert!(fulcio.valid_for.contains(DateTime::from_timestamp(1738060096, 0).unwrap()));

    let rekor = &material.tlogs[0];
    assert_eq!(rekor.key_hint(), Some([0xc0, 0xd2, 0x3d, 0x6a]));
    assert_eq!(rekor.public_key.scheme(), SigningScheme::EcdsaP256Sha256);
    assert_eq!(
        sigstore_crypto::sha256(&spki(&root, 0)).as_bytes().as_slice(),
        rekor.log_id.as_slice()
    );
}

#[test]
fn test_public_key_lookup_fails_without_keys() {
    let root = TrustedRoot::from_json(TRUSTED_ROOT).unwrap();
    let material = TrustMaterial::from_trusted_root(&root, KeySource::default()).unwrap();
    assert!(matches!(
        material.public_key("anything"),
        Err(sigstore_trust_root::Error::KeyNotFound(_))
    ));
}

fn spki(root: &TrustedRoot, tlog: usize) -> Vec<u8> {
    root.tlogs[tlog]
        .public_key
        .raw_bytes
        .as_ref()
        .unwrap()
        .as_bytes()
        .to_vec()
}
