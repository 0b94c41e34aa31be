//! Certificate path building and validation
//!
//! Paths are built from the leaf towards a self-signed root using only the
//! leaf and the certificates of one trusted chain, then checked against the
//! basic constraints and validity windows of every certificate on them.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sigstore_crypto::Certificate;
use sigstore_trust_root::CertAuthority;
use std::collections::VecDeque;

/// Verify `leaf` against the first certificate authority that yields a
/// valid path at `time`.
///
/// Only authorities whose validity window covers the leaf's whole validity
/// period are considered. Returns the path `[leaf, .., root]`.
pub(crate) fn verify_certificate_chain(
    leaf: &Certificate,
    authorities: &[CertAuthority],
    time: DateTime<Utc>,
) -> Result<Vec<Certificate>> {
    let mut last_error = Error::Certificate(
        "no certificate authority is valid for the certificate's lifetime".to_string(),
    );

    for authority in authorities
        .iter()
        .filter(|ca| ca.valid_for.contains_range(leaf.not_before(), leaf.not_after()))
    {
        match verify_chain(leaf, &authority.cert_chain, time) {
            Ok(path) => return Ok(path),
            Err(e) => {
                tracing::warn!("certificate authority rejected the chain: {}", e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Build the shortest path from `leaf` to a self-signed root through
/// `trusted` and validate it at `time`.
pub(crate) fn verify_chain(
    leaf: &Certificate,
    trusted: &[Certificate],
    time: DateTime<Utc>,
) -> Result<Vec<Certificate>> {
    let pool: Vec<&Certificate> = std::iter::once(leaf).chain(trusted.iter()).collect();
    let issuers: Vec<Vec<usize>> = (0..pool.len()).map(|i| find_issuers(&pool, i)).collect();
    let leaf_trusted = trusted.contains(leaf);

    let path = shortest_path(&issuers, leaf_trusted)
        .ok_or_else(|| Error::Certificate("no valid certificate path found".to_string()))?;

    let path: Vec<Certificate> = path.into_iter().map(|i| pool[i].clone()).collect();
    validate_path(&path, time)?;
    Ok(path)
}

/// Indices of the certificates in `pool` that issued `pool[child]`.
///
/// A self-signed certificate is its own sole issuer.
fn find_issuers(pool: &[&Certificate], child: usize) -> Vec<usize> {
    let cert = pool[child];
    if cert.has_self_issued_name() && cert.verify_signed_by(cert.public_key()).is_ok() {
        return vec![child];
    }

    let authority_key_id = cert.authority_key_identifier();
    pool.iter()
        .enumerate()
        .filter(|(i, _)| *i != child)
        .filter(|(_, candidate)| {
            let names_match = match (&authority_key_id, candidate.subject_key_identifier()) {
                (Some(aki), Some(ski)) => *aki == ski,
                _ => candidate.subject() == cert.issuer(),
            };
            names_match && cert.verify_signed_by(candidate.public_key()).is_ok()
        })
        .map(|(i, _)| i)
        .collect()
}

/// Shortest path from index 0 to a certificate that issued itself.
///
/// Breadth-first over the issuer graph, visiting each certificate once, so
/// the work is bounded by the size of the pool even when the graph has
/// cycles. The leaf only counts as a root when it is itself trusted.
fn shortest_path(issuers: &[Vec<usize>], leaf_trusted: bool) -> Option<Vec<usize>> {
    let mut parent: Vec<Option<usize>> = vec![None; issuers.len()];
    let mut visited = vec![false; issuers.len()];
    let mut queue = VecDeque::from([0usize]);
    visited[0] = true;

    while let Some(current) = queue.pop_front() {
        if issuers[current].contains(&current) && (current != 0 || leaf_trusted) {
            let mut path = vec![current];
            let mut node = current;
            while let Some(child) = parent[node] {
                path.push(child);
                node = child;
            }
            path.reverse();
            return Some(path);
        }

        for &issuer in &issuers[current] {
            if !visited[issuer] {
                visited[issuer] = true;
                parent[issuer] = Some(current);
                queue.push_back(issuer);
            }
        }
    }

    None
}

fn validate_path(path: &[Certificate], time: DateTime<Utc>) -> Result<()> {
    for (i, cert) in path.iter().enumerate() {
        if !cert.is_valid_at(time) {
            return Err(Error::Certificate(format!(
                "certificate at depth {} is not valid at {} (valid {} to {})",
                i,
                time,
                cert.not_before(),
                cert.not_after()
            )));
        }

        if i > 0 {
            if !cert.is_ca() {
                return Err(Error::Certificate(format!(
                    "issuing certificate at depth {} is not a CA",
                    i
                )));
            }
            // pathLenConstraint counts the intermediates below this CA
            if let Some(max) = cert.path_len_constraint() {
                if usize::from(max) + 1 < i {
                    return Err(Error::Certificate(format!(
                        "path length constraint {} of certificate at depth {} exceeded",
                        max, i
                    )));
                }
            }
        }

        if let Some(issuer) = path.get(i + 1) {
            if cert.issuer() != issuer.subject() {
                return Err(Error::Certificate(format!(
                    "issuer of certificate at depth {} does not match its parent's subject",
                    i
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
    use sigstore_trust_root::ValidityPeriod;

    struct TestCa {
        cert: rcgen::Certificate,
        key: KeyPair,
    }

    fn params(cn: &str, ca: Option<u8>) -> CertificateParams {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name.push(DnType::CommonName, cn);
        params.not_before = rcgen::date_time_ymd(2024, 1, 1);
        params.not_after = rcgen::date_time_ymd(2026, 1, 1);
        params.use_authority_key_identifier_extension = true;
        if let Some(path_len) = ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Constrained(path_len));
        }
        params
    }

    fn root(cn: &str, path_len: u8) -> TestCa {
        let key = KeyPair::generate().unwrap();
        let cert = params(cn, Some(path_len)).self_signed(&key).unwrap();
        TestCa { cert, key }
    }

    fn issue(cn: &str, ca: Option<u8>, issuer: &TestCa) -> TestCa {
        let key = KeyPair::generate().unwrap();
        let cert = params(cn, ca)
            .signed_by(&key, &issuer.cert, &issuer.key)
            .unwrap();
        TestCa { cert, key }
    }

    fn parse(ca: &TestCa) -> Certificate {
        Certificate::from_der(ca.cert.der()).unwrap()
    }

    fn at(date: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(date).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_three_certificate_chain() {
        let root = root("root", 1);
        let intermediate = issue("intermediate", Some(0), &root);
        let leaf = issue("leaf", None, &intermediate);

        let trusted = vec![parse(&intermediate), parse(&root)];
        let path = verify_chain(&parse(&leaf), &trusted, at("2025-01-01T00:00:00Z")).unwrap();
        assert_eq!(path, vec![parse(&leaf), parse(&intermediate), parse(&root)]);
    }

    #[test]
    fn test_unrelated_root_rejected() {
        let root_a = root("root a", 1);
        let root_b = root("root b", 1);
        let leaf = issue("leaf", None, &root_a);

        let err = verify_chain(&parse(&leaf), &[parse(&root_b)], at("2025-01-01T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, Error::Certificate(_)));
    }

    #[test]
    fn test_non_ca_issuer_rejected() {
        let root = root("root", 1);
        let not_ca = issue("not a ca", None, &root);
        let leaf = issue("leaf", None, &not_ca);

        let trusted = vec![parse(&not_ca), parse(&root)];
        let err = verify_chain(&parse(&leaf), &trusted, at("2025-01-01T00:00:00Z")).unwrap_err();
        assert!(err.to_string().contains("not a CA"), "{}", err);
    }

    #[test]
    fn test_path_length_violation() {
        let root = root("root", 0);
        let intermediate = issue("intermediate", Some(0), &root);
        let leaf = issue("leaf", None, &intermediate);

        let trusted = vec![parse(&intermediate), parse(&root)];
        let err = verify_chain(&parse(&leaf), &trusted, at("2025-01-01T00:00:00Z")).unwrap_err();
        assert!(err.to_string().contains("path length"), "{}", err);
    }

    #[test]
    fn test_expired_at_verification_time() {
        let root = root("root", 1);
        let leaf = issue("leaf", None, &root);

        let err = verify_chain(&parse(&leaf), &[parse(&root)], at("2027-01-01T00:00:00Z"))
            .unwrap_err();
        assert!(err.to_string().contains("not valid at"), "{}", err);
    }

    #[test]
    fn test_cross_signed_cycle_terminates() {
        // Every "S" certificate holding key A is signed by key B and vice
        // versa, so the issuer graph is dense and cyclic with no root.
        let key_a = KeyPair::generate().unwrap();
        let key_b = KeyPair::generate().unwrap();
        let as_a = params("S", Some(8)).self_signed(&key_a).unwrap();
        let as_b = params("S", Some(8)).self_signed(&key_b).unwrap();

        let mut trusted = Vec::new();
        for _ in 0..8 {
            let a = params("S", Some(8))
                .signed_by(&key_a, &as_b, &key_b)
                .unwrap();
            let b = params("S", Some(8))
                .signed_by(&key_b, &as_a, &key_a)
                .unwrap();
            trusted.push(Certificate::from_der(a.der()).unwrap());
            trusted.push(Certificate::from_der(b.der()).unwrap());
        }
        let leaf_key = KeyPair::generate().unwrap();
        let leaf = params("leaf", None)
            .signed_by(&leaf_key, &as_a, &key_a)
            .unwrap();
        let leaf = Certificate::from_der(leaf.der()).unwrap();

        let err = verify_chain(&leaf, &trusted, at("2025-01-01T00:00:00Z")).unwrap_err();
        assert!(err.to_string().contains("no valid certificate path"), "{}", err);
    }

    #[test]
    fn test_shortest_path_preferred() {
        let root = root("root", 3);
        let bridge = issue("bridge", Some(2), &root);

        // One intermediate key certified twice: directly by the root and
        // through the bridge
        let intermediate_key = KeyPair::generate().unwrap();
        let direct = params("intermediate", Some(1))
            .signed_by(&intermediate_key, &root.cert, &root.key)
            .unwrap();
        let bridged = params("intermediate", Some(1))
            .signed_by(&intermediate_key, &bridge.cert, &bridge.key)
            .unwrap();
        let leaf_key = KeyPair::generate().unwrap();
        let leaf = params("leaf", None)
            .signed_by(&leaf_key, &direct, &intermediate_key)
            .unwrap();

        let direct = Certificate::from_der(direct.der()).unwrap();
        let bridged = Certificate::from_der(bridged.der()).unwrap();
        let leaf = Certificate::from_der(leaf.der()).unwrap();

        // The longer route is listed first
        let trusted = vec![bridged.clone(), parse(&bridge), direct.clone(), parse(&root)];
        let path = verify_chain(&leaf, &trusted, at("2025-01-01T00:00:00Z")).unwrap();
        assert_eq!(path, vec![leaf.clone(), direct, parse(&root)]);

        // Without the direct certificate the bridged route is used
        let trusted = vec![bridged.clone(), parse(&bridge), parse(&root)];
        let path = verify_chain(&leaf, &trusted, at("2025-01-01T00:00:00Z")).unwrap();
        assert_eq!(path, vec![leaf, bridged, parse(&bridge), parse(&root)]);
    }

    #[test]
    fn test_self_signed_leaf_needs_trust() {
        let root = root("root", 1);
        let time = at("2025-01-01T00:00:00Z");

        assert!(verify_chain(&parse(&root), &[], time).is_err());
        let path = verify_chain(&parse(&root), &[parse(&root)], time).unwrap();
        assert_eq!(path, vec![parse(&root)]);
    }

    #[test]
    fn test_authority_must_cover_leaf_lifetime() {
        let root = root("root", 1);
        let leaf = issue("leaf", None, &root);
        let time = at("2025-01-01T00:00:00Z");

        let covering = CertAuthority {
            cert_chain: vec![parse(&root)],
            valid_for: ValidityPeriod::new(Some(at("2023-01-01T00:00:00Z")), None),
        };
        let too_late = CertAuthority {
            cert_chain: vec![parse(&root)],
            valid_for: ValidityPeriod::new(Some(at("2024-06-01T00:00:00Z")), None),
        };

        assert!(verify_certificate_chain(&parse(&leaf), &[covering], time).is_ok());
        assert!(matches!(
            verify_certificate_chain(&parse(&leaf), &[too_late], time),
            Err(Error::Certificate(_))
        ));
    }
}
