//! Password hashing via bcrypt.
//!
//! Hashes use the self-describing modular crypt format
//! (`$2b$<cost>$<salt><digest>`), so the cost can be raised later and old
//! hashes upgraded on the next successful login.

use bcrypt::HashParts;

use super::AuthError;

/// bcrypt cost factor.
pub const BCRYPT_COST: u32 = 10;

/// Longest password bcrypt digests without truncation.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// A mismatch is `Ok(false)`; only a hash that cannot be parsed is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::MalformedHash(e.to_string()))
}

/// Whether a stored hash should be replaced with one at the current cost.
///
/// Unparseable hashes return `false`; `verify_password` reports those.
pub fn needs_rehash(hash: &str) -> bool {
    if !hash.starts_with("$2b$") {
        return hash.parse::<HashParts>().is_ok();
    }
    match hash.parse::<HashParts>() {
        Ok(parts) => parts.get_cost() != BCRYPT_COST,
        Err(_) => false,
    }
}
