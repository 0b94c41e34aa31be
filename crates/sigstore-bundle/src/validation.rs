//! Bundle validation
//!
//! Validates Sigstore bundles according to version-specific rules. Every
//! violation is collected so callers see the complete list of offending field
//! paths, not just the first one.

use crate::error::{Error, Result};
use crate::validated::{
    Content, KeyMaterial, SignedEnvelope, SignedMessage, TlogEntry, ValidatedBundle,
};
use sigstore_types::{Bundle, DsseEnvelope, MediaType, MessageSignature, VerificationMaterial};

/// Validate a Sigstore bundle and narrow it to a [`ValidatedBundle`]
pub fn validate_bundle(bundle: &Bundle) -> Result<ValidatedBundle> {
    let mut invalid = Vec::new();

    let version = match bundle.version() {
        Ok(version) => Some(version),
        Err(_) => {
            invalid.push("mediaType".to_string());
            None
        }
    };

    let content = validate_content(bundle, &mut invalid);

    let material = match &bundle.verification_material {
        Some(vm) => Some(vm),
        None => {
            invalid.push("verificationMaterial".to_string());
            None
        }
    };
    let key_material = material.and_then(|vm| validate_key_material(vm, &mut invalid));
    let tlog_entries = material.map(|vm| validate_tlog_entries(vm, &mut invalid));

    if let (Some(version), Some(vm)) = (version, material) {
        match version {
            MediaType::Bundle0_1 => require_inclusion_promises(vm, &mut invalid),
            MediaType::Bundle0_2 => require_inclusion_proofs(vm, &mut invalid),
            MediaType::Bundle0_3 => {
                require_inclusion_proofs(vm, &mut invalid);
                if vm.x509_certificate_chain.is_some() {
                    invalid.push("verificationMaterial.x509CertificateChain".to_string());
                }
            }
        }
    }

    match (version, content, key_material, tlog_entries) {
        (Some(version), Some(content), Some(key_material), Some(tlog_entries))
            if invalid.is_empty() =>
        {
            let rfc3161_timestamps = material
                .and_then(|vm| vm.timestamp_verification_data.as_ref())
                .map(|tvd| {
                    tvd.rfc3161_timestamps
                        .iter()
                        .map(|ts| ts.signed_timestamp.clone())
                        .collect()
                })
                .unwrap_or_default();

            Ok(ValidatedBundle {
                media_type: bundle.media_type.clone(),
                version,
                content,
                key_material,
                tlog_entries,
                rfc3161_timestamps,
            })
        }
        _ => {
            tracing::debug!(fields = ?invalid, "bundle failed shape validation");
            Err(Error::Validation { fields: invalid })
        }
    }
}

fn validate_content(bundle: &Bundle, invalid: &mut Vec<String>) -> Option<Content> {
    match (&bundle.message_signature, &bundle.dsse_envelope) {
        (Some(msg), None) => validate_message_signature(msg, invalid).map(Content::MessageSignature),
        (None, Some(env)) => validate_dsse_envelope(env, invalid).map(Content::DsseEnvelope),
        _ => {
            invalid.push("content".to_string());
            None
        }
    }
}

fn validate_message_signature(
    msg: &MessageSignature,
    invalid: &mut Vec<String>,
) -> Option<SignedMessage> {
    let digest = msg
        .message_digest
        .as_ref()
        .and_then(|md| md.digest.as_ref().map(|d| (md.algorithm, d)))
        .filter(|(_, d)| !d.is_empty());
    if digest.is_none() {
        invalid.push("messageSignature.messageDigest.digest".to_string());
    }

    let signature = msg.signature.as_ref().filter(|s| !s.is_empty());
    if signature.is_none() {
        invalid.push("messageSignature.signature".to_string());
    }

    let (digest_algorithm, digest) = digest?;
    Some(SignedMessage {
        digest_algorithm,
        digest: digest.clone(),
        signature: signature?.clone(),
    })
}

fn validate_dsse_envelope(env: &DsseEnvelope, invalid: &mut Vec<String>) -> Option<SignedEnvelope> {
    let payload = env.payload.as_ref().filter(|p| !p.is_empty());
    if payload.is_none() {
        invalid.push("dsseEnvelope.payload".to_string());
    }

    let signature = match env.signatures.as_slice() {
        [only] => {
            let sig = only.sig.as_ref().filter(|s| !s.is_empty());
            if sig.is_none() {
                invalid.push("dsseEnvelope.signatures[0].sig".to_string());
            }
            sig.map(|sig| (only.keyid.clone(), sig.clone()))
        }
        _ => {
            invalid.push("dsseEnvelope.signatures".to_string());
            None
        }
    };

    let (keyid, signature) = signature?;
    Some(SignedEnvelope {
        payload_type: env.payload_type.clone(),
        payload: payload?.clone(),
        keyid,
        signature,
    })
}

fn validate_key_material(
    vm: &VerificationMaterial,
    invalid: &mut Vec<String>,
) -> Option<KeyMaterial> {
    match (&vm.x509_certificate_chain, &vm.certificate, &vm.public_key) {
        (Some(chain), None, None) => {
            if chain.certificates.is_empty() {
                invalid.push("verificationMaterial.x509CertificateChain.certificates".to_string());
                return None;
            }
            let mut ders = Vec::with_capacity(chain.certificates.len());
            for (i, cert) in chain.certificates.iter().enumerate() {
                match cert.raw_bytes.as_ref().filter(|b| !b.is_empty()) {
                    Some(der) => ders.push(der.clone()),
                    None => invalid.push(format!(
                        "verificationMaterial.x509CertificateChain.certificates[{}].rawBytes",
                        i
                    )),
                }
            }
            (ders.len() == chain.certificates.len()).then_some(KeyMaterial::X509CertificateChain(ders))
        }
        (None, Some(cert), None) => match cert.raw_bytes.as_ref().filter(|b| !b.is_empty()) {
            Some(der) => Some(KeyMaterial::Certificate(der.clone())),
            None => {
                invalid.push("verificationMaterial.certificate.rawBytes".to_string());
                None
            }
        },
        (None, None, Some(key)) => Some(KeyMaterial::PublicKey {
            hint: key.hint.clone(),
        }),
        _ => {
            invalid.push("verificationMaterial.content".to_string());
            None
        }
    }
}

fn validate_tlog_entries(vm: &VerificationMaterial, invalid: &mut Vec<String>) -> Vec<TlogEntry> {
    let mut entries = Vec::with_capacity(vm.tlog_entries.len());
    for (i, entry) in vm.tlog_entries.iter().enumerate() {
        if entry.log_id.is_none() {
            invalid.push(format!("verificationMaterial.tlogEntries[{}].logId", i));
        }
        if entry.kind_version.is_none() {
            invalid.push(format!("verificationMaterial.tlogEntries[{}].kindVersion", i));
        }
        let (Some(log_id), Some(kind_version)) = (&entry.log_id, &entry.kind_version) else {
            continue;
        };
        entries.push(TlogEntry {
            log_index: entry.log_index,
            log_id: log_id.key_id.clone(),
            kind_version: kind_version.clone(),
            integrated_time: entry.integrated_time,
            inclusion_promise: entry
                .inclusion_promise
                .as_ref()
                .map(|p| p.signed_entry_timestamp.clone()),
            inclusion_proof: entry.inclusion_proof.clone(),
            canonicalized_body: entry.canonicalized_body.clone(),
        });
    }
    entries
}

/// Version 0.1: every entry must carry a signed entry timestamp
fn require_inclusion_promises(vm: &VerificationMaterial, invalid: &mut Vec<String>) {
    for (i, entry) in vm.tlog_entries.iter().enumerate() {
        if entry.inclusion_promise.is_none() {
            invalid.push(format!(
                "verificationMaterial.tlogEntries[{}].inclusionPromise",
                i
            ));
        }
    }
}

/// Version 0.2 and later: every entry must carry an inclusion proof with a checkpoint
fn require_inclusion_proofs(vm: &VerificationMaterial, invalid: &mut Vec<String>) {
    for (i, entry) in vm.tlog_entries.iter().enumerate() {
        match &entry.inclusion_proof {
            None => invalid.push(format!(
                "verificationMaterial.tlogEntries[{}].inclusionProof",
                i
            )),
            Some(proof) if proof.checkpoint.is_none() => invalid.push(format!(
                "verificationMaterial.tlogEntries[{}].inclusionProof.checkpoint",
                i
            )),
            Some(_) => {}
        }
    }
}
