//! Digest helpers

use crate::error::{Error, Result};
use aws_lc_rs::digest;
use sigstore_types::{HashAlgorithm, Sha256Hash};
use subtle::ConstantTimeEq;

/// SHA-256 of `data`
pub fn sha256(data: &[u8]) -> Sha256Hash {
    let d = digest::digest(&digest::SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(d.as_ref());
    Sha256Hash::from_bytes(out)
}

/// Digest `data` with the named algorithm
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
    let alg = match algorithm {
        HashAlgorithm::Sha2_256 => &digest::SHA256,
        HashAlgorithm::Sha2_384 => &digest::SHA384,
        HashAlgorithm::Sha2_512 => &digest::SHA512,
        HashAlgorithm::Sha3_256 => &digest::SHA3_256,
        HashAlgorithm::Sha3_384 => &digest::SHA3_384,
        HashAlgorithm::Unspecified => {
            return Err(Error::UnsupportedAlgorithm(
                "unspecified hash algorithm".to_string(),
            ))
        }
    };
    Ok(digest::digest(alg, data).as_ref().to_vec())
}

/// Compare two byte strings without leaking the position of the first difference
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
