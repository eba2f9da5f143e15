//! Credential primitives for the clinic's users and sessions.
//!
//! Passwords are stored as Argon2id PHC strings in `users.password_hash`.
//! Bearer tokens are handed to the client once at login; `session_token`
//! only ever stores their SHA-256 digest.

use argon2::password_hash::{SaltString, rand_core::OsRng as SaltRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

const ACCESS_TOKEN_BYTES: usize = 32;

/// True when `password` matches the stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash a password chosen at registration.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut SaltRng);
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::BadRequest(format!("password could not be hashed: {e}")))?;
    Ok(phc.to_string())
}

/// A fresh session token for a patient, doctor or admin who just logged in.
pub fn generate_access_token() -> String {
    let mut raw = [0u8; ACCESS_TOKEN_BYTES];
    OsRng.fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}

/// Lookup key for a session: hex SHA-256 of the bearer token.
pub fn hash_access_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
