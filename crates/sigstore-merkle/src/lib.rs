//! RFC 6962 Merkle tree primitives
//!
//! Leaf and interior node hashing with the `0x00` / `0x01` domain separation
//! prefixes, and verification of audit paths (inclusion proofs) as used by
//! Rekor.

use sigstore_crypto::{constant_time_eq, sha256};
use sigstore_types::Sha256Hash;
use thiserror::Error;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Errors for malformed inclusion proofs
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("leaf index {index} is out of range for tree size {tree_size}")]
    IndexOutOfRange { index: u64, tree_size: u64 },

    #[error("inclusion proof has {actual} hashes, expected {expected}")]
    WrongProofSize { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Hash a leaf: `SHA256(0x00 || data)`
pub fn hash_leaf(data: &[u8]) -> Sha256Hash {
    let mut buf = Vec::with_capacity(1 + data.len());
    buf.push(LEAF_PREFIX);
    buf.extend_from_slice(data);
    sha256(&buf)
}

/// Hash an interior node: `SHA256(0x01 || left || right)`
pub fn hash_children(left: &Sha256Hash, right: &Sha256Hash) -> Sha256Hash {
    let mut buf = [0u8; 65];
    buf[0] = NODE_PREFIX;
    buf[1..33].copy_from_slice(left.as_bytes());
    buf[33..].copy_from_slice(right.as_bytes());
    sha256(&buf)
}

/// Split a proof for `index` in a tree of `tree_size` leaves into the number
/// of hashes below the split point ("inner") and along the right border.
fn decompose_inclusion_proof(index: u64, tree_size: u64) -> (usize, usize) {
    let inner = (u64::BITS - (index ^ (tree_size - 1)).leading_zeros()) as usize;
    let border = (index >> inner).count_ones() as usize;
    (inner, border)
}

/// Recompute the tree root from a leaf hash and its audit path
pub fn root_from_inclusion_proof(
    leaf_hash: &Sha256Hash,
    index: u64,
    tree_size: u64,
    proof: &[Sha256Hash],
) -> Result<Sha256Hash> {
    if index >= tree_size {
        return Err(Error::IndexOutOfRange { index, tree_size });
    }

    let (inner, border) = decompose_inclusion_proof(index, tree_size);
    if proof.len() != inner + border {
        return Err(Error::WrongProofSize {
            expected: inner + border,
            actual: proof.len(),
        });
    }

    let mut acc = *leaf_hash;
    for (i, node) in proof[..inner].iter().enumerate() {
        acc = if (index >> i) & 1 == 1 {
            hash_children(node, &acc)
        } else {
            hash_children(&acc, node)
        };
    }
    for node in &proof[inner..] {
        acc = hash_children(node, &acc);
    }

    Ok(acc)
}

/// Verify an inclusion proof against an expected root.
///
/// Malformed indices or proof lengths are errors; a well-formed proof that
/// leads to a different root returns `Ok(false)`.
pub fn verify_inclusion_proof(
    leaf_hash: &Sha256Hash,
    index: u64,
    tree_size: u64,
    proof: &[Sha256Hash],
    expected_root: &Sha256Hash,
) -> Result<bool> {
    let root = root_from_inclusion_proof(leaf_hash, index, tree_size, proof)?;
    Ok(constant_time_eq(root.as_bytes(), expected_root.as_bytes()))
}
