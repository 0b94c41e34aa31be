//! Transparency log witness verification
//!
//! A log entry is witnessed either by an inclusion proof anchored in a signed
//! checkpoint, or by a signed entry timestamp (SET) over the entry's
//! identifying fields. Both are checked when both are present.

use crate::error::{Error, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sigstore_bundle::TlogEntry;
use sigstore_trust_root::TLogAuthority;
use sigstore_types::{InclusionProof, Sha256Hash, SignedTimestamp};

/// Check every witness an entry carries
pub(crate) fn verify_tlog_witness(entry: &TlogEntry, tlogs: &[TLogAuthority]) -> Result<()> {
    if let Some(proof) = entry
        .inclusion_proof
        .as_ref()
        .filter(|proof| proof.checkpoint.is_some())
    {
        verify_inclusion_proof(entry, proof)?;
        verify_checkpoint(entry, proof, tlogs)?;
    }

    if let Some(promise) = &entry.inclusion_promise {
        verify_set(entry, promise, tlogs)?;
    }

    Ok(())
}

/// Recompute the tree root from the entry body and the audit path
fn verify_inclusion_proof(entry: &TlogEntry, proof: &InclusionProof) -> Result<()> {
    let proof_error = Error::TlogInclusionProof;

    let index = u64::try_from(proof.log_index)
        .map_err(|_| proof_error(format!("negative log index {}", proof.log_index)))?;
    let tree_size = u64::try_from(proof.tree_size)
        .map_err(|_| proof_error(format!("negative tree size {}", proof.tree_size)))?;
    let root = Sha256Hash::try_from_slice(proof.root_hash.as_bytes())
        .map_err(|e| proof_error(format!("invalid root hash: {}", e)))?;
    let hashes = proof
        .hashes
        .iter()
        .map(|hash| Sha256Hash::try_from_slice(hash.as_bytes()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| proof_error(format!("invalid proof hash: {}", e)))?;

    let leaf = sigstore_merkle::hash_leaf(entry.canonicalized_body.as_bytes());
    match sigstore_merkle::verify_inclusion_proof(&leaf, index, tree_size, &hashes, &root) {
        Ok(true) => Ok(()),
        Ok(false) => Err(proof_error(
            "calculated root hash does not match the inclusion proof".to_string(),
        )),
        Err(e) => Err(proof_error(e.to_string())),
    }
}

/// Verify the checkpoint commits to the proof's root and is signed by a
/// trusted log.
///
/// Every signature line must come from a known log whose key was valid at
/// the entry's integrated time. Entries without an integrated time (Rekor v2)
/// are checked against keys regardless of their validity window.
fn verify_checkpoint(
    entry: &TlogEntry,
    proof: &InclusionProof,
    tlogs: &[TLogAuthority],
) -> Result<()> {
    let checkpoint = proof
        .parse_checkpoint()
        .map_err(|e| Error::TlogInclusionProof(format!("failed to parse checkpoint: {}", e)))?;

    if checkpoint.root_hash.as_bytes().as_slice() != proof.root_hash.as_bytes() {
        return Err(Error::TlogInclusionProof(format!(
            "checkpoint root hash {} does not match inclusion proof root hash {}",
            checkpoint.root_hash.to_hex(),
            hex::encode(proof.root_hash.as_bytes())
        )));
    }

    let integrated_time = integrated_time(entry);
    for signature in &checkpoint.signatures {
        let verified = tlogs
            .iter()
            .filter(|tlog| tlog.key_hint() == Some(signature.key_hint))
            .filter(|tlog| integrated_time.map_or(true, |t| tlog.valid_for.contains(t)))
            .any(|tlog| {
                tlog.public_key
                    .verify(checkpoint.signed_data(), &signature.signature)
                    .is_ok()
            });
        if !verified {
            return Err(Error::TlogInclusionProof(format!(
                "checkpoint signature by {} (key hint {}) could not be verified",
                signature.name,
                hex::encode(signature.key_hint)
            )));
        }
    }

    Ok(())
}

/// The document a log signs to promise inclusion
#[derive(Serialize)]
struct RekorPayload {
    body: String,
    #[serde(rename = "integratedTime")]
    integrated_time: i64,
    #[serde(rename = "logIndex")]
    log_index: i64,
    #[serde(rename = "logID")]
    log_id: String,
}

/// Verify a signed entry timestamp
fn verify_set(entry: &TlogEntry, promise: &SignedTimestamp, tlogs: &[TLogAuthority]) -> Result<()> {
    let payload = RekorPayload {
        body: base64::engine::general_purpose::STANDARD.encode(entry.canonicalized_body.as_bytes()),
        integrated_time: entry.integrated_time,
        log_index: entry.log_index,
        log_id: hex::encode(entry.log_id.as_bytes()),
    };
    let canonical_json = serde_json_canonicalizer::to_vec(&payload)
        .map_err(|e| Error::TlogInclusionPromise(format!("canonicalization failed: {}", e)))?;

    let integrated_time = integrated_time(entry);
    let verified = tlogs
        .iter()
        .filter(|tlog| tlog.log_id == entry.log_id.as_bytes())
        .filter(|tlog| integrated_time.is_some_and(|t| tlog.valid_for.contains(t)))
        .any(|tlog| {
            tlog.public_key
                .verify(&canonical_json, promise.as_bytes())
                .is_ok()
        });

    if verified {
        Ok(())
    } else {
        Err(Error::TlogInclusionPromise(format!(
            "no trusted log with ID {} verifies the signed entry timestamp",
            hex::encode(entry.log_id.as_bytes())
        )))
    }
}

/// The entry's integrated time, if it has one
pub(crate) fn integrated_time(entry: &TlogEntry) -> Option<DateTime<Utc>> {
    if entry.integrated_time > 0 {
        DateTime::from_timestamp(entry.integrated_time, 0)
    } else {
        None
    }
}
