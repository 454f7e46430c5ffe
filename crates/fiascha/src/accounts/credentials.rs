//! Salted, iterated SHA-256 credential hashes encoded as `sha256$<iterations>$<salt>$<digest>`.

use rand::RngCore;
use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256";
const DEFAULT_ITERATIONS: u32 = 10_000;
const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    hash_with(password, &salt, DEFAULT_ITERATIONS)
}

pub fn hash_with(password: &str, salt: &[u8], iterations: u32) -> String {
    let digest = stretch(password.as_bytes(), salt, iterations.max(1));
    format!(
        "{SCHEME}${iterations}${}${}",
        hex::encode(salt),
        hex::encode(digest)
    )
}

/// Check `password` against an encoded hash. Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };

    let actual = stretch(password.as_bytes(), &salt, iterations.max(1));
    constant_time_eq(&actual, &expected)
}

fn stretch(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut digest: [u8; 32] = Sha256::new()
        .chain_update(salt)
        .chain_update(password)
        .finalize()
        .into();
    for _ in 1..iterations {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(salt)
            .chain_update(password)
            .finalize()
            .into();
    }
    digest
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_matching_password_only() {
        let encoded = hash_password("correct horse battery");
        assert!(encoded.starts_with("sha256$10000$"));
        assert!(verify_password("correct horse battery", &encoded));
        assert!(!verify_password("correct horse battery!", &encoded));
    }

    #[test]
    fn fresh_salt_per_hash() {
        assert_ne!(hash_password("same-password"), hash_password("same-password"));
    }

    #[test]
    fn deterministic_for_fixed_salt() {
        let first = hash_with("password123", b"fixed-salt", 3);
        let second = hash_with("password123", b"fixed-salt", 3);
        assert_eq!(first, second);
        assert!(verify_password("password123", &first));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "sha256$abc$00$00"));
        assert!(!verify_password("anything", "md5$1$00$00"));
        assert!(!verify_password("anything", "sha256$1$zz$00"));
        assert!(!verify_password("anything", "sha256$1$00$00$extra"));
    }
}
