//! Hashing utilities for rule snapshots.

use crate::error::Result;
use crate::types::Rule;
use sha2::{Digest, Sha256};

/// Fingerprint of the empty rule list.
pub const EMPTY_FINGERPRINT: &str = "r:empty";

/// Computes SHA-256 hash of data and returns hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Computes a fingerprint identifying a rule list.
///
/// Two lists share a fingerprint exactly when they serialize identically,
/// which covers order as well as content.
pub fn fingerprint(rules: &[Rule]) -> Result<String> {
    if rules.is_empty() {
        return Ok(EMPTY_FINGERPRINT.to_string());
    }
    let bytes = serde_json::to_vec(rules)?;
    Ok(format!("r:{}", sha256_hex(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let hash = sha256_hex(b"hello");
        assert_eq!(hash.len(), 64); // SHA-256 is 32 bytes = 64 hex chars
    }

    #[test]
    fn test_empty_fingerprint() {
        assert_eq!(fingerprint(&[]).unwrap(), EMPTY_FINGERPRINT);
    }

    #[test]
    fn test_fingerprint_tracks_order() {
        let a = Rule::block("https://a.com/*");
        let b = Rule::redirect("https://b.com/*", "https://c.com/*");

        let forward = fingerprint(&[a.clone(), b.clone()]).unwrap();
        let again = fingerprint(&[a.clone(), b.clone()]).unwrap();
        let reversed = fingerprint(&[b, a]).unwrap();

        assert!(forward.starts_with("r:"));
        assert_eq!(forward, again);
        assert_ne!(forward, reversed);
    }

    #[test]
    fn test_fingerprint_keeps_unknown_types_apart() {
        let allow: Vec<Rule> = serde_json::from_str(r#"[{"from": "*", "type": "allow"}]"#).unwrap();
        let skip: Vec<Rule> = serde_json::from_str(r#"[{"from": "*", "type": "skip"}]"#).unwrap();
        assert_ne!(fingerprint(&allow).unwrap(), fingerprint(&skip).unwrap());
    }
}
