pub mod ip;
pub mod url_validator;

use sha2::{Digest, Sha256};

/// Generate a random slug of mixed-case letters and digits.
///
/// Uniqueness is the caller's job: regenerate in a loop until the store
/// reports the slug unused.
pub fn generate_slug(length: usize) -> String {
    use std::iter;

    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

/// Anonymize a client IP before storage: truncated SHA-256 hex.
///
/// The raw address never reaches the database.
pub fn hash_ip(ip: &str) -> String {
    let digest = Sha256::digest(ip.as_bytes());
    let mut out = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_slug_length() {
        assert_eq!(generate_slug(7).len(), 7);
        assert_eq!(generate_slug(12).len(), 12);
        assert_eq!(generate_slug(0).len(), 0);
    }

    #[test]
    fn test_generate_slug_charset() {
        let slug = generate_slug(200);
        let valid: HashSet<char> =
            "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
                .chars()
                .collect();
        for ch in slug.chars() {
            assert!(valid.contains(&ch), "Invalid character: {}", ch);
        }
    }

    #[test]
    fn test_generate_slug_uniqueness() {
        let mut slugs = HashSet::new();
        for _ in 0..1000 {
            slugs.insert(generate_slug(7));
        }
        assert!(slugs.len() > 990, "Generated slugs lack sufficient randomness");
    }

    #[test]
    fn test_hash_ip_is_not_raw() {
        let hashed = hash_ip("203.0.113.42");
        assert_ne!(hashed, "203.0.113.42");
        assert_eq!(hashed.len(), 16);
        assert!(hashed.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_ip_deterministic() {
        assert_eq!(hash_ip("10.0.0.1"), hash_ip("10.0.0.1"));
        assert_ne!(hash_ip("10.0.0.1"), hash_ip("10.0.0.2"));
    }
}
