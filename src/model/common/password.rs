//! One-way password hashing with Argon2.

use argon2::Config;
use rand::Rng;

use crate::error::Result;

/// 16 bytes is recommended for password hashing:
///  https://en.wikipedia.org/wiki/Argon2
const SALT_LENGTH: usize = 16;

/// Hash a plaintext password with a fresh random salt, producing a
/// self-describing encoded hash.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0_u8; SALT_LENGTH];
    rand::thread_rng().fill(&mut salt);
    let hash = argon2::hash_encoded(password.as_bytes(), &salt, &Config::default())?;
    Ok(hash)
}

/// Check a plaintext password against an encoded hash.
///
/// A malformed hash never verifies.
pub fn verify_password(password: &str, encoded_hash: &str) -> bool {
    argon2::verify_encoded(encoded_hash, password.as_bytes()).unwrap_or_else(|err| {
        error!("Stored password hash is malformed: {err}");
        false
    })
}
