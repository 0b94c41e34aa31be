//! Signed checkpoint (signed note) parsing
//!
//! A checkpoint is a small text document in which a transparency log commits
//! to its tree size and root hash:
//!
//! ```text
//! rekor.sigstore.dev - 1193050959916656506
//! 25915956
//! xNI9atQGlz+VWfO6LRygH4QUfY/8W4RFwiT5i5WRgB0=
//! Timestamp: 1689177396617352539
//!
//! — rekor.sigstore.dev wNI9ajBFAiEA...
//! ```
//!
//! The note (everything up to and including the first newline of the blank
//! separator) is the signed message. Each signature line carries a 4-byte key
//! hint followed by the raw signature.

use crate::encoding::Sha256Hash;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const SIGNATURE_PREFIX: &str = "\u{2014} ";
const TIMESTAMP_PREFIX: &str = "Timestamp: ";

/// A parsed signed checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Origin line identifying the log
    pub origin: String,
    /// Tree size committed to
    pub tree_size: u64,
    /// Root hash committed to
    pub root_hash: Sha256Hash,
    /// Advisory `Timestamp:` value, when the log writes one
    pub timestamp: Option<u64>,
    /// Any further header lines
    pub other_content: Vec<String>,
    /// Signature lines
    pub signatures: Vec<CheckpointSignature>,
    note: String,
}

/// One signature line of a checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSignature {
    /// Signer name as written on the line
    pub name: String,
    /// First four bytes of the signing log's key ID
    pub key_hint: [u8; 4],
    /// Raw signature bytes
    pub signature: Vec<u8>,
}

impl Checkpoint {
    /// Parse a checkpoint from its text form
    pub fn from_text(text: &str) -> Result<Self> {
        let split = text
            .find("\n\n")
            .ok_or_else(|| Error::InvalidCheckpoint("missing blank line separator".into()))?;
        let note = &text[..split + 1];
        let signature_block = &text[split + 2..];

        let header: Vec<&str> = note.trim_end().split('\n').collect();
        if header.len() < 3 {
            return Err(Error::InvalidCheckpoint(format!(
                "header has {} lines, expected at least 3",
                header.len()
            )));
        }

        let origin = header[0];
        if origin.is_empty() {
            return Err(Error::InvalidCheckpoint("empty origin".into()));
        }

        let tree_size = header[1]
            .parse::<u64>()
            .map_err(|e| Error::InvalidCheckpoint(format!("invalid tree size: {}", e)))?;

        let root_bytes = STANDARD
            .decode(header[2])
            .map_err(|e| Error::InvalidCheckpoint(format!("invalid root hash: {}", e)))?;
        let root_hash = Sha256Hash::try_from_slice(&root_bytes)?;

        let mut timestamp = None;
        let mut other_content = Vec::new();
        for line in &header[3..] {
            match line.strip_prefix(TIMESTAMP_PREFIX) {
                Some(ts) => {
                    timestamp = Some(ts.parse::<u64>().map_err(|e| {
                        Error::InvalidCheckpoint(format!("invalid timestamp: {}", e))
                    })?)
                }
                None => other_content.push(line.to_string()),
            }
        }

        let signatures = parse_signatures(signature_block)?;
        if signatures.is_empty() {
            return Err(Error::InvalidCheckpoint("no signatures found".into()));
        }

        Ok(Checkpoint {
            origin: origin.to_string(),
            tree_size,
            root_hash,
            timestamp,
            other_content,
            signatures,
            note: note.to_string(),
        })
    }

    /// The bytes covered by the checkpoint signatures
    pub fn signed_data(&self) -> &[u8] {
        self.note.as_bytes()
    }
}

/// Collect every `— <name> <base64>` line. Lines that do not have this shape
/// are skipped.
fn parse_signatures(block: &str) -> Result<Vec<CheckpointSignature>> {
    let mut signatures = Vec::new();
    for line in block.split_inclusive('\n') {
        let Some(line) = line.strip_suffix('\n') else {
            continue;
        };
        let Some(rest) = line.strip_prefix(SIGNATURE_PREFIX) else {
            continue;
        };
        let mut fields = rest.split(' ');
        let (Some(name), Some(encoded), None) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        if name.is_empty() || encoded.is_empty() {
            continue;
        }

        let raw = STANDARD
            .decode(encoded)
            .map_err(|e| Error::InvalidCheckpoint(format!("invalid signature encoding: {}", e)))?;
        if raw.len() < 5 {
            return Err(Error::InvalidCheckpoint(format!(
                "signature too short: {} bytes",
                raw.len()
            )));
        }

        let mut key_hint = [0u8; 4];
        key_hint.copy_from_slice(&raw[..4]);
        signatures.push(CheckpointSignature {
            name: name.to_string(),
            key_hint,
            signature: raw[4..].to_vec(),
        });
    }
    Ok(signatures)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKPOINT: &str = "rekor.sigstore.dev - 1193050959916656506\n25915956\nxNI9atQGlz+VWfO6LRygH4QUfY/8W4RFwiT5i5WRgB0=\nTimestamp: 1689177396617352539\n\n\u{2014} rekor.sigstore.dev wNI9ajBFAiEA8xsGX6W9ZCnn8Xg63h9Jz1BfUCngNvSn0PdIGg3VdtkCIC4XaHMe8p47D10xA9njTYjLuSFwcqE3vzgfqvl9TU7n\n";

    #[test]
    fn test_parse_checkpoint() {
        let cp = Checkpoint::from_text(CHECKPOINT).unwrap();
        assert_eq!(cp.origin, "rekor.sigstore.dev - 1193050959916656506");
        assert_eq!(cp.tree_size, 25915956);
        assert_eq!(cp.timestamp, Some(1689177396617352539));
        assert!(cp.other_content.is_empty());
        assert_eq!(cp.signatures.len(), 1);
        assert_eq!(cp.signatures[0].name, "rekor.sigstore.dev");
        assert_eq!(cp.signatures[0].key_hint, [0xc0, 0xd2, 0x3d, 0x6a]);
        assert!(cp.signed_data().ends_with(b"Timestamp: 1689177396617352539\n"));
        assert!(!cp.signed_data().ends_with(b"\n\n"));
    }

    #[test]
    fn test_timestamp_line_is_optional() {
        let text = CHECKPOINT.replace("Timestamp: 1689177396617352539\n", "");
        let cp = Checkpoint::from_text(&text).unwrap();
        assert_eq!(cp.timestamp, None);
    }

    #[test]
    fn test_missing_signature_line() {
        let text = CHECKPOINT.split("\u{2014}").next().unwrap();
        assert!(Checkpoint::from_text(text).is_err());
    }

    #[test]
    fn test_missing_separator() {
        assert!(Checkpoint::from_text("origin\n1\nAAAA\n").is_err());
    }

    #[test]
    fn test_short_header() {
        let text = "origin\n1\n\n\u{2014} origin AAAAAAA=\n";
        assert!(Checkpoint::from_text(text).is_err());
    }

    #[test]
    fn test_bad_root_hash_length() {
        let text = CHECKPOINT.replace("xNI9atQGlz+VWfO6LRygH4QUfY/8W4RFwiT5i5WRgB0=", "AAAA");
        assert!(Checkpoint::from_text(&text).is_err());
    }

    #[test]
    fn test_signature_too_short() {
        let text = CHECKPOINT.replace(
            "wNI9ajBFAiEA8xsGX6W9ZCnn8Xg63h9Jz1BfUCngNvSn0PdIGg3VdtkCIC4XaHMe8p47D10xA9njTYjLuSFwcqE3vzgfqvl9TU7n",
            "AAAAAA==",
        );
        assert!(Checkpoint::from_text(&text).is_err());
    }
}
