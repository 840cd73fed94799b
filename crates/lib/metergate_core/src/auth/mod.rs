//! Authentication logic.
//!
//! Provides password hashing, JWT issuance/validation, and the refresh token
//! registry shared by the API layer.

pub mod jwt;
pub mod password;
pub mod registry;

use thiserror::Error;

/// Authentication errors.
///
/// `InvalidToken` deliberately carries no detail: a bad signature, an expired
/// token, a wrong token kind and a revoked refresh token are indistinguishable
/// to the caller.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
