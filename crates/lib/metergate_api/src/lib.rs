//! # metergate_api
//!
//! HTTP API library for Metergate.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metergate_core::auth::jwt::TokenService;
use metergate_core::routing::SourceRouter;
use metergate_core::store::{CredentialStore, MeterStore};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, hello, meters};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// User accounts.
    pub users: Arc<dyn CredentialStore>,
    /// Meter lookups across data sources.
    pub meters: Arc<dyn MeterStore>,
    /// Token issuance and the refresh token registry.
    pub tokens: Arc<TokenService>,
    /// Package tag → data source.
    pub sources: SourceRouter,
}

impl AppState {
    /// Wire state from configuration and a store serving both users and meters.
    pub fn new<S>(config: &ApiConfig, store: Arc<S>) -> Self
    where
        S: CredentialStore + MeterStore + 'static,
    {
        let tokens = TokenService::new(
            config.jwt_secret.as_bytes(),
            config.access_token_ttl,
            config.refresh_token_ttl,
        );
        Self {
            sources: SourceRouter::new(&store.sources()),
            users: store.clone(),
            meters: store,
            tokens: Arc::new(tokens),
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_ROOT, get(hello::root))
        .route(routes::POST_SIGNUP, post(auth::signup_handler))
        .route(routes::POST_TOKEN, post(auth::token_handler))
        .route(routes::POST_LOGIN, post(auth::login_handler))
        .route(routes::POST_REFRESH_TOKEN, post(auth::refresh_handler))
        .route(routes::POST_LOGOUT, post(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_METER_STATUS, get(meters::meter_status_handler))
        .route(routes::POST_LOGOUT_ALL, post(auth::logout_all_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
