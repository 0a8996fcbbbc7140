//! Content hashing using SHA-256.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of arbitrary bytes as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Compute the SHA-256 digest of a string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_bytes(b"hello world"), hash_bytes(b"hello world"));
    }

    #[test]
    fn test_hash_distinguishes_inputs() {
        assert_ne!(hash_str("hello"), hash_str("world"));
    }

    #[test]
    fn test_hash_is_64_hex_chars() {
        let h = hash_bytes(b"anything");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
