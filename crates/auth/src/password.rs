//! Credential verification capability.
//!
//! Storage only ever sees the hash; the plaintext lives for the duration of one
//! call.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("failed to hash credential: {0}")]
    Hash(String),
}

/// One-way hash/verify of account passwords.
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, CredentialError>;

    /// `false` on mismatch and on an unparseable stored hash.
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Verifier;

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, plain: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| CredentialError::Hash(e.to_string()))
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok()
    }
}
