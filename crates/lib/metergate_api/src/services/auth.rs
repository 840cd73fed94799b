//! Authentication service: signup, login, refresh and logout flows.
//!
//! Password hashing is CPU-bound and runs on the blocking pool, never while a
//! connection or registry entry is held.

use std::sync::LazyLock;

use metergate_core::auth::AuthError;
use metergate_core::auth::jwt::TokenService;
use metergate_core::auth::password::{hash_password, needs_rehash, verify_password};
use metergate_core::models::auth::{NewUser, TokenPair, User};
use metergate_core::store::{CredentialStore, StoreError};
use tracing::{error, info, warn};

use super::validation;
use crate::error::{AppError, AppResult};
use crate::models::{LogoutResponse, RefreshResponse, TokenResponse};

const TOKEN_TYPE: &str = "bearer";

/// Hash verified against when the email is unknown, so both failure paths cost
/// one bcrypt verification.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("metergate-unknown-user").ok());

/// Run CPU-bound work on the blocking pool.
async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task: {e}")))
}

fn invalid_credentials() -> AppError {
    AppError::from(AuthError::InvalidCredentials)
}

/// Register a new user account.
pub async fn signup(
    users: &dyn CredentialStore,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<User> {
    let username = username.trim();
    let email = email.trim();
    validation::username(username)?;
    validation::email(email)?;
    validation::password(password)?;

    let password = password.to_string();
    let password_hash = run_blocking(move || hash_password(&password)).await??;

    let new_user = NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
    };
    match users.insert_user(&new_user).await {
        Ok(user) => {
            info!(user_id = user.id, "user registered");
            Ok(user)
        }
        Err(StoreError::Conflict(constraint)) => {
            info!(%constraint, "signup rejected: already registered");
            Err(AppError::Conflict("User already exists".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Authenticate with email + password and issue a token pair.
///
/// Unknown email, wrong password and an unreadable stored hash all produce the
/// same `Invalid credentials` response.
pub async fn login(
    users: &dyn CredentialStore,
    tokens: &TokenService,
    email: &str,
    password: &str,
) -> AppResult<TokenResponse> {
    let email = email.trim();
    let record = users.find_user_by_email(email).await?;

    let Some(record) = record else {
        let password = password.to_string();
        run_blocking(move || {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&password, hash);
            }
        })
        .await?;
        return Err(invalid_credentials());
    };

    let verdict = {
        let password = password.to_string();
        let hash = record.password_hash.clone();
        run_blocking(move || verify_password(&password, &hash)).await?
    };
    match verdict {
        Ok(true) => {}
        Ok(false) => return Err(invalid_credentials()),
        Err(AuthError::MalformedHash(detail)) => {
            error!(user_id = record.user.id, %detail, "stored password hash is unreadable");
            return Err(invalid_credentials());
        }
        Err(e) => return Err(e.into()),
    }

    if needs_rehash(&record.password_hash) {
        upgrade_hash(users, record.user.id, password).await;
    }

    let pair = tokens.issue_pair(&record.user.id.to_string(), &record.user.email)?;
    info!(user_id = record.user.id, "login succeeded");
    Ok(build_token_response(&record.user, pair))
}

/// Replace an outdated hash. Failure is logged; the login still succeeds.
async fn upgrade_hash(users: &dyn CredentialStore, user_id: i64, password: &str) {
    let password = password.to_string();
    let rehashed = run_blocking(move || hash_password(&password))
        .await
        .and_then(|hashed| hashed.map_err(AppError::from));
    let rehashed = match rehashed {
        Ok(hash) => hash,
        Err(e) => {
            warn!(user_id, error = ?e, "password rehash failed");
            return;
        }
    };
    match users.update_password_hash(user_id, &rehashed).await {
        Ok(()) => info!(user_id, "password hash upgraded"),
        Err(e) => warn!(user_id, error = %e, "could not store upgraded password hash"),
    }
}

/// Exchange a refresh token for a new pair. The presented token is consumed.
pub fn refresh(tokens: &TokenService, refresh_token: &str) -> AppResult<RefreshResponse> {
    let pair = tokens.refresh(refresh_token)?;
    Ok(RefreshResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: pair.expires_in,
    })
}

/// Logout: revoke a specific refresh token.
pub fn logout(tokens: &TokenService, refresh_token: Option<&str>) -> LogoutResponse {
    if let Some(token) = refresh_token {
        tokens.revoke(token);
    }
    LogoutResponse { success: true }
}

/// Logout all sessions: revoke all refresh tokens for a user.
pub fn logout_all(tokens: &TokenService, user_id: &str) -> LogoutResponse {
    let revoked = tokens.revoke_all(user_id);
    info!(user_id, revoked, "revoked all sessions");
    LogoutResponse { success: true }
}

fn build_token_response(user: &User, pair: TokenPair) -> TokenResponse {
    TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: pair.expires_in,
        username: user.username.clone(),
        user_id: user.id,
    }
}
