//! Security Utilities
//!
//! Password hashing, reset-token generation and related helpers.

use bcrypt::{hash, verify};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

/// Default bcrypt cost for password hashing
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Length of the raw password reset token handed out by email
pub const RESET_TOKEN_LENGTH: usize = 40;

/// Generate a cryptographically secure random string
pub fn generate_secure_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Hash a password with custom bcrypt cost
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

/// SHA-256 hex digest used to store reset tokens at rest
pub fn hash_sensitive_data(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}
