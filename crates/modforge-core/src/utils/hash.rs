//! Blake3 hashing helpers.
//!
//! Used to derive stable on-disk names for mirrors from their source URLs.

/// Compute the hex Blake3 hash of data
pub fn blake3_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// First `len` hex characters of the Blake3 hash of data
pub fn short_digest(data: &[u8], len: usize) -> String {
    let mut hex = blake3_hash(data);
    hex.truncate(len);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_hash() {
        let hash = blake3_hash(b"hello world");

        // 32 bytes = 64 hex chars
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, blake3_hash(b"hello world"));
    }

    #[test]
    fn test_short_digest() {
        let a = short_digest(b"https://example.com/a.git", 16);
        let b = short_digest(b"https://example.com/b.git", 16);
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
        assert!(blake3_hash(b"https://example.com/a.git").starts_with(&a));
    }
}
