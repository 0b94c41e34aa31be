//! Encoding helpers for the JSON wire form
//!
//! Byte fields travel as standard base64 strings and 64-bit integers as
//! decimal strings. The newtypes in this module keep the raw bytes in memory
//! and only deal with the textual form at the serde boundary.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! base64_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
        pub struct $name(Vec<u8>);

        impl $name {
            /// Wrap owned bytes
            pub fn new(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }

            /// Copy bytes from a slice
            pub fn from_bytes(bytes: &[u8]) -> Self {
                Self(bytes.to_vec())
            }

            /// Decode from a standard base64 string
            pub fn from_base64(s: &str) -> Result<Self> {
                Ok(Self(STANDARD.decode(s)?))
            }

            /// Encode as a standard base64 string
            pub fn to_base64(&self) -> String {
                STANDARD.encode(&self.0)
            }

            /// Borrow the raw bytes
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Take ownership of the raw bytes
            pub fn into_bytes(self) -> Vec<u8> {
                self.0
            }

            /// Number of raw bytes
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Whether there are no raw bytes
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&STANDARD.encode(&self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                STANDARD
                    .decode(s.as_bytes())
                    .map(Self)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

base64_newtype!(
    /// DER-encoded X.509 certificate
    DerCertificate
);
base64_newtype!(
    /// DER-encoded public key (SubjectPublicKeyInfo or PKCS#1)
    DerPublicKey
);
base64_newtype!(
    /// Raw signature bytes
    SignatureBytes
);
base64_newtype!(
    /// DSSE payload bytes
    PayloadBytes
);
base64_newtype!(
    /// The exact log-entry body bytes that were hashed into the log
    CanonicalizedBody
);
base64_newtype!(
    /// Signed entry timestamp (inclusion promise) signature bytes
    SignedTimestamp
);
base64_newtype!(
    /// DER-encoded RFC 3161 timestamp token or response
    TimestampToken
);
base64_newtype!(
    /// Log identifier bytes (SHA-256 of the log's public key)
    LogKeyId
);
base64_newtype!(
    /// Digest or Merkle node bytes
    HashBytes
);

/// A SHA-256 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Hash([u8; 32]);

impl Sha256Hash {
    /// Wrap a 32-byte digest
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, which must be exactly 32 bytes
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| Error::InvalidHashLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Parse from a hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::try_from_slice(&hex::decode(s)?)
    }

    /// Borrow the digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Serde adapter for int64 fields.
///
/// Emits a decimal string and accepts either a string or a JSON number.
pub mod string_i64 {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        struct I64Visitor;

        impl Visitor<'_> for I64Visitor {
            type Value = i64;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer or a decimal string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
                i64::try_from(v).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(I64Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Wrapper {
        #[serde(with = "string_i64")]
        n: i64,
        sig: SignatureBytes,
    }

    #[test]
    fn test_int64_accepts_string_and_number() {
        let a: Wrapper = serde_json::from_str(r#"{"n":"42","sig":"AAE="}"#).unwrap();
        let b: Wrapper = serde_json::from_str(r#"{"n":42,"sig":"AAE="}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.sig.as_bytes(), &[0, 1]);
        assert_eq!(serde_json::to_string(&a).unwrap(), r#"{"n":"42","sig":"AAE="}"#);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"n":1,"sig":"!!"}"#).is_err());
    }

    #[test]
    fn test_sha256_hash_length() {
        assert!(Sha256Hash::try_from_slice(&[0u8; 31]).is_err());
        let h = Sha256Hash::try_from_slice(&[0xab; 32]).unwrap();
        assert_eq!(h.to_hex(), "ab".repeat(32));
        assert_eq!(Sha256Hash::from_hex(&h.to_hex()).unwrap(), h);
    }
}
