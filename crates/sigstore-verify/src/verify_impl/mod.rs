//! Verification steps, each run by [`Verifier`](crate::Verifier) in order

pub(crate) mod chain;
pub(crate) mod entity;
pub(crate) mod key;
pub(crate) mod policy;
pub(crate) mod rekor;
pub(crate) mod sct;
pub(crate) mod timestamp;
pub(crate) mod tlog;

#[cfg(test)]
pub(crate) mod test_support;
