//! Authentication request handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use metergate_core::auth::AuthError;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{AppForm, AppJson};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    LoginRequest, LogoutRequest, LogoutResponse, RefreshRequest, RefreshResponse, SignupRequest,
    SignupResponse, TokenForm, TokenResponse,
};
use crate::services::auth;

/// `POST /signup`: create a new user account.
pub async fn signup_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<SignupRequest>,
) -> AppResult<Json<SignupResponse>> {
    auth::signup(
        state.users.as_ref(),
        &body.username,
        &body.email,
        &body.password,
    )
    .await?;
    Ok(Json(SignupResponse {
        message: "User created successfully".into(),
    }))
}

/// `POST /token`: OAuth2 password-grant form; `username` carries the email.
pub async fn token_handler(
    State(state): State<AppState>,
    AppForm(form): AppForm<TokenForm>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(
        state.users.as_ref(),
        &state.tokens,
        &form.username,
        &form.password,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /login`: authenticate with a JSON email + password body.
pub async fn login_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(
        state.users.as_ref(),
        &state.tokens,
        &body.email,
        &body.password,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /refresh-token`: exchange a refresh token for a new token pair.
///
/// An unreadable body is answered like any other unusable refresh token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<Json<RefreshResponse>> {
    let Json(body) = body.map_err(|rejection| {
        debug!(detail = %rejection.body_text(), "refresh body rejected");
        AppError::from(AuthError::InvalidToken)
    })?;
    let resp = auth::refresh(&state.tokens, &body.refresh_token)?;
    Ok(Json(resp))
}

/// `POST /logout`: revoke a refresh token.
pub async fn logout_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<LogoutRequest>,
) -> Json<LogoutResponse> {
    Json(auth::logout(&state.tokens, body.refresh_token.as_deref()))
}

/// `POST /logout-all`: revoke every refresh token of the authenticated user.
pub async fn logout_all_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<LogoutResponse> {
    Json(auth::logout_all(&state.tokens, &user.0.sub))
}
