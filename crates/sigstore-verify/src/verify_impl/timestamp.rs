//! Timestamp evidence
//!
//! A signature is only trusted at the instants vouched for by independent
//! evidence: the integrated time of a witnessed log entry, or an RFC 3161
//! token from a trusted timestamp authority over the signature bytes.

use crate::error::{Error, Result};
use crate::verify_impl::chain::verify_chain;
use crate::verify_impl::entity::SignedEntity;
use crate::verify_impl::tlog::integrated_time;
use chrono::{DateTime, Utc};
use sigstore_trust_root::CertAuthority;
use sigstore_tsa::Rfc3161Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimestampSource {
    TransparencyLog,
    TimestampAuthority,
}

/// A trusted point in time at which the signature existed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VerifiedTimestamp {
    pub source: TimestampSource,
    /// Set for log timestamps
    pub log_id: Option<Vec<u8>>,
    pub timestamp: DateTime<Utc>,
}

/// Collect every timestamp the bundle provides and enforce `threshold`
pub(crate) fn verify_timestamps(
    entity: &SignedEntity<'_>,
    timestamp_authorities: &[CertAuthority],
    threshold: usize,
) -> Result<Vec<VerifiedTimestamp>> {
    let mut timestamps: Vec<VerifiedTimestamp> = entity
        .tlog_entries
        .iter()
        .filter_map(|entry| {
            integrated_time(entry).map(|timestamp| VerifiedTimestamp {
                source: TimestampSource::TransparencyLog,
                log_id: Some(entry.log_id.as_bytes().to_vec()),
                timestamp,
            })
        })
        .collect();

    for token in entity.timestamps {
        let timestamp = verify_rfc3161_timestamp(
            token.as_bytes(),
            entity.content.signature(),
            timestamp_authorities,
        )?;
        timestamps.push(VerifiedTimestamp {
            source: TimestampSource::TimestampAuthority,
            log_id: None,
            timestamp,
        });
    }

    let duplicated = timestamps
        .iter()
        .enumerate()
        .any(|(i, ts)| timestamps[..i].contains(ts));
    if duplicated {
        return Err(Error::Timestamp("duplicate timestamp".to_string()));
    }

    if timestamps.len() < threshold {
        return Err(Error::Timestamp(format!(
            "expected {} timestamps, got {}",
            threshold,
            timestamps.len()
        )));
    }

    tracing::debug!("verified {} timestamps", timestamps.len());
    Ok(timestamps)
}

/// Verify an RFC 3161 token over `signature` and return its signing time.
///
/// Candidate authorities are those valid at the signing time whose first
/// certificate matches the token's signer identifier. The first certificate
/// is chained to the rest of its authority's chain; a one-certificate chain
/// is its own anchor.
pub(crate) fn verify_rfc3161_timestamp(
    token: &[u8],
    signature: &[u8],
    authorities: &[CertAuthority],
) -> Result<DateTime<Utc>> {
    let timestamp = Rfc3161Timestamp::from_der(token)
        .map_err(|e| Error::Timestamp(format!("failed to parse timestamp token: {}", e)))?;
    let signing_time = timestamp.signing_time();

    let candidates = authorities
        .iter()
        .filter(|tsa| tsa.valid_for.contains(signing_time))
        .filter(|tsa| {
            tsa.cert_chain.first().is_some_and(|signer| {
                timestamp.signer_serial_number() == Some(signer.serial_number())
                    && timestamp.signer_issuer() == Some(signer.issuer())
            })
        });

    let mut last_error = Error::Timestamp(format!(
        "no trusted timestamp authority issued a token at {}",
        signing_time
    ));
    for tsa in candidates {
        let Some((signer, rest)) = tsa.cert_chain.split_first() else {
            continue;
        };
        let trusted = if rest.is_empty() {
            &tsa.cert_chain[..]
        } else {
            rest
        };

        let result = verify_chain(signer, trusted, signing_time)
            .map_err(|e| Error::Timestamp(e.to_string()))
            .and_then(|_| {
                timestamp
                    .verify(signature, signer.public_key())
                    .map_err(|e| Error::Timestamp(e.to_string()))
            });
        match result {
            Ok(()) => return Ok(signing_time),
            Err(e) => {
                tracing::warn!("timestamp authority rejected the token: {}", e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}
