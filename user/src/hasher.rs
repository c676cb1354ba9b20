//! Credential hashing boundary.
//!
//! The lifecycle services only ever call `hash` at registration and
//! `verify` at login; they never inspect the digest format.

use sha2::{Digest, Sha256};

pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> String;
    fn verify(&self, plaintext: &str, digest: &str) -> bool;
}

/// SHA-256 digest rendered as lowercase hex.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl CredentialHasher for Sha256Hasher {
    fn hash(&self, plaintext: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(plaintext.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        self.hash(plaintext) == digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_hex() {
        let hasher = Sha256Hasher;
        let digest = hasher.hash("hunter2");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hasher.hash("hunter2"));
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_matches_only_same_plaintext() {
        let hasher = Sha256Hasher;
        let digest = hasher.hash("hunter2");
        assert!(hasher.verify("hunter2", &digest));
        assert!(!hasher.verify("hunter3", &digest));
    }
}
