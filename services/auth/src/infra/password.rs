//! Password hashing and verification using argon2id.
//!
//! The salt is stored alongside the hash on the account row; verification
//! recomputes the hash under the stored salt and compares digests in
//! constant time.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, SaltString};

/// Hash a password with a fresh random salt. Returns `(hash, salt)` as they
/// are persisted on the account row.
pub fn hash_password(password: &str) -> Result<(String, String), argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?.to_string();
    Ok((hash, salt.as_str().to_owned()))
}

/// Verify a password against the stored salt and hash.
pub fn verify_password(
    password: &str,
    salt: &str,
    hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let salt = SaltString::from_b64(salt)?;
    let recomputed = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    let stored = PasswordHash::new(hash)?;
    // Output's PartialEq is constant-time (subtle::ConstantTimeEq).
    match (recomputed.hash, stored.hash) {
        (Some(a), Some(b)) => Ok(a == b),
        _ => Ok(false),
    }
}
