//! Secret generation and at-rest hashing.
//!
//! Every credential the server mints (client secrets, access tokens, refresh
//! tokens, authorization codes) is a cryptographically random byte string.
//! The plaintext is hex-encoded and handed to the caller exactly once; only
//! the SHA-256 hex digest is ever persisted, and the digest doubles as the
//! lookup key.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Client secrets are 32 random bytes (64 hex characters).
pub const CLIENT_SECRET_BYTES: usize = 32;

/// Access tokens, refresh tokens, and authorization codes are 40 random
/// bytes (80 hex characters).
pub const TOKEN_SECRET_BYTES: usize = 40;

/// Generate a random secret of `len` bytes from the thread-local CSPRNG,
/// hex-encoded.
pub fn generate_secret(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn generate_client_secret() -> String {
    generate_secret(CLIENT_SECRET_BYTES)
}

pub fn generate_token_secret() -> String {
    generate_secret(TOKEN_SECRET_BYTES)
}

/// SHA-256 digest of a plaintext secret, hex-encoded. This is the only form
/// in which secrets reach durable storage.
pub fn hash_secret(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a plaintext secret against a stored digest without early exit.
pub fn verify_secret(plain: &str, stored_hash: &str) -> bool {
    constant_time_eq(&hash_secret(plain), stored_hash)
}

/// Constant-time string comparison to prevent timing attacks.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_secret_is_64_hex_chars() {
        let secret = generate_client_secret();
        assert_eq!(secret.len(), CLIENT_SECRET_BYTES * 2);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn token_secret_is_80_hex_chars() {
        let secret = generate_token_secret();
        assert_eq!(secret.len(), TOKEN_SECRET_BYTES * 2);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_secrets_are_unique() {
        assert_ne!(generate_token_secret(), generate_token_secret());
        assert_ne!(generate_client_secret(), generate_client_secret());
    }

    #[test]
    fn hash_is_hex_sha256() {
        // SHA-256("abc")
        assert_eq!(
            hash_secret("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_secret("abc").len(), 64);
    }

    #[test]
    fn hash_is_deterministic_and_irreversible_shape() {
        let plain = generate_token_secret();
        let h1 = hash_secret(&plain);
        let h2 = hash_secret(&plain);
        assert_eq!(h1, h2);
        assert_ne!(h1, plain);
    }

    #[test]
    fn verify_accepts_only_the_original_plaintext() {
        let plain = generate_token_secret();
        let stored = hash_secret(&plain);
        assert!(verify_secret(&plain, &stored));
        assert!(!verify_secret(&generate_token_secret(), &stored));
        assert!(!verify_secret("", &stored));
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq("hello", "hello"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("hello", "world"));
        assert!(!constant_time_eq("hello", "hell"));
        assert!(!constant_time_eq("hello", "hello!"));
    }
}
