//! Hash algorithm identifiers used in bundles

use serde::{Deserialize, Serialize};

/// Digest algorithm named by a `messageSignature.messageDigest`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    #[serde(rename = "HASH_ALGORITHM_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "SHA2_256")]
    Sha2_256,
    #[serde(rename = "SHA2_384")]
    Sha2_384,
    #[serde(rename = "SHA2_512")]
    Sha2_512,
    #[serde(rename = "SHA3_256")]
    Sha3_256,
    #[serde(rename = "SHA3_384")]
    Sha3_384,
}

impl HashAlgorithm {
    /// Digest length in bytes, if the algorithm is known
    pub fn digest_len(&self) -> Option<usize> {
        match self {
            HashAlgorithm::Unspecified => None,
            HashAlgorithm::Sha2_256 | HashAlgorithm::Sha3_256 => Some(32),
            HashAlgorithm::Sha2_384 | HashAlgorithm::Sha3_384 => Some(48),
            HashAlgorithm::Sha2_512 => Some(64),
        }
    }
}
