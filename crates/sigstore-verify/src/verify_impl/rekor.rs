//! Rekor entry body validation
//!
//! Ties a transparency log entry back to the bundle by checking that the
//! signature and digest recorded in the entry body are the ones the bundle
//! carries.

use crate::error::{Error, Result};
use crate::verify_impl::entity::SignatureContent;
use base64::Engine;
use sigstore_bundle::TlogEntry;
use sigstore_rekor::RekorEntryBody;

/// Verify that `entry` records `content`
pub(crate) fn verify_tlog_body(entry: &TlogEntry, content: &dyn SignatureContent) -> Result<()> {
    let kind = &entry.kind_version.kind;
    let version = &entry.kind_version.version;
    let body = RekorEntryBody::from_json_bytes(entry.canonicalized_body.as_bytes(), kind, version)
        .map_err(|e| Error::TlogBody(format!("failed to parse {} {} body: {}", kind, version, e)))?;

    match &body {
        RekorEntryBody::HashedRekordV001(rekord) => {
            check_signature(content, rekord.signature.content.as_bytes())?;
            check_hex_digest(content, &rekord.data.hash.value)
        }
        RekorEntryBody::HashedRekordV002(rekord) => {
            let rekord = &rekord.hashed_rekord_v002;
            check_signature(content, rekord.signature.content.as_bytes())?;
            check_digest(content, rekord.data.digest.as_bytes())
        }
        RekorEntryBody::DsseV001(dsse) => {
            let signature = single_signature(&dsse.signatures)?;
            check_signature(content, signature.signature.as_bytes())?;
            check_hex_digest(content, &dsse.payload_hash.value)
        }
        RekorEntryBody::DsseV002(dsse) => {
            let dsse = &dsse.dsse_v002;
            let signature = single_signature(&dsse.signatures)?;
            check_signature(content, signature.content.as_bytes())?;
            check_digest(content, dsse.payload_hash.digest.as_bytes())
        }
        RekorEntryBody::IntotoV002(intoto) => {
            let signature = single_signature(&intoto.content.envelope.signatures)?;
            // The body stores the base64 signature text base64-encoded again
            let raw = base64::engine::general_purpose::STANDARD
                .decode(signature.sig.as_bytes())
                .map_err(|e| Error::TlogBody(format!("invalid intoto signature: {}", e)))?;
            check_signature(content, &raw)?;
            check_hex_digest(content, &intoto.content.payload_hash.value)
        }
    }
}

fn single_signature<T>(signatures: &[T]) -> Result<&T> {
    match signatures {
        [signature] => Ok(signature),
        _ => Err(Error::TlogBody(format!(
            "entry has {} signatures, expected exactly one",
            signatures.len()
        ))),
    }
}

fn check_signature(content: &dyn SignatureContent, signature: &[u8]) -> Result<()> {
    if content.compare_signature(signature) {
        Ok(())
    } else {
        Err(Error::TlogBody(
            "signature in the log entry does not match the bundle".to_string(),
        ))
    }
}

fn check_hex_digest(content: &dyn SignatureContent, digest: &str) -> Result<()> {
    let digest = hex::decode(digest)
        .map_err(|e| Error::TlogBody(format!("invalid hex digest in log entry: {}", e)))?;
    check_digest(content, &digest)
}

fn check_digest(content: &dyn SignatureContent, digest: &[u8]) -> Result<()> {
    if content.compare_digest(digest) {
        Ok(())
    } else {
        Err(Error::TlogBody(
            "digest in the log entry does not match the bundle".to_string(),
        ))
    }
}
