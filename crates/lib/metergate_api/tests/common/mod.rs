//! Shared helpers for router-level tests: an in-memory store and request helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::NaiveDateTime;
use metergate_api::AppState;
use metergate_api::config::ApiConfig;
use metergate_core::models::auth::{NewUser, User, UserWithPassword};
use metergate_core::models::meter::MeterRecord;
use metergate_core::routing::DataSource;
use metergate_core::store::{CredentialStore, MeterStore, StoreError};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-signing-secret";

/// In-memory stand-in for the PostgreSQL store.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserWithPassword>>,
    meters: Mutex<HashMap<(DataSource, String), MeterRecord>>,
    sources: Vec<DataSource>,
    hang: AtomicBool,
}

impl MemoryStore {
    pub fn new(sources: &[DataSource]) -> Self {
        Self {
            sources: sources.to_vec(),
            ..Self::default()
        }
    }

    /// Both sources configured.
    pub fn dual() -> Self {
        Self::new(&DataSource::ALL)
    }

    pub fn add_meter(&self, source: DataSource, meter_id: &str, last: Option<NaiveDateTime>) {
        self.meters.lock().unwrap().insert(
            (source, meter_id.to_string()),
            MeterRecord {
                meter_id: meter_id.to_string(),
                last_communication: last,
                meter_type: Some("Smart Meter".into()),
                communication_medium: Some("GPRS".into()),
                ctwc: Some("100/5".into()),
            },
        );
    }

    /// Insert a user with a precomputed hash.
    pub fn add_user(&self, username: &str, email: &str, password_hash: &str) -> i64 {
        let mut users = self.users.lock().unwrap();
        let id = users.len() as i64 + 1;
        users.push(UserWithPassword {
            user: User {
                id,
                username: username.into(),
                email: email.into(),
            },
            password_hash: password_hash.into(),
        });
        id
    }

    pub fn password_hash(&self, email: &str) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user.email == email)
            .map(|u| u.password_hash.clone())
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Make every subsequent meter lookup time out.
    pub fn hang_lookups(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_user(&self, new_user: &NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.user.username == new_user.username) {
            return Err(StoreError::Conflict("users_username_key".into()));
        }
        if users.iter().any(|u| u.user.email == new_user.email) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        let user = User {
            id: users.len() as i64 + 1,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
        };
        users.push(UserWithPassword {
            user: user.clone(),
            password_hash: new_user.password_hash.clone(),
        });
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user.email == email)
            .cloned())
    }

    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> Result<(), StoreError> {
        if let Some(u) = self
            .users
            .lock()
            .unwrap()
            .iter_mut()
            .find(|u| u.user.id == user_id)
        {
            u.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl MeterStore for MemoryStore {
    async fn find_meter(
        &self,
        source: DataSource,
        meter_id: &str,
    ) -> Result<Option<MeterRecord>, StoreError> {
        if self.hang.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout(Duration::from_secs(5)));
        }
        if !self.sources.contains(&source) {
            return Err(StoreError::UnknownSource(source));
        }
        Ok(self
            .meters
            .lock()
            .unwrap()
            .get(&(source, meter_id.to_string()))
            .cloned())
    }

    fn sources(&self) -> Vec<DataSource> {
        self.sources.clone()
    }
}

pub fn test_config() -> ApiConfig {
    ApiConfig::new("postgres://unused/db", TEST_SECRET)
}

pub fn test_state(store: Arc<MemoryStore>) -> AppState {
    AppState::new(&test_config(), store)
}

pub fn test_app(store: Arc<MemoryStore>) -> Router {
    metergate_api::router(test_state(store))
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Send a request and parse the JSON body (`Null` for empty bodies).
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("parse JSON")
    };
    (status, json)
}

pub async fn signup(app: &Router, username: &str, email: &str, password: &str) -> StatusCode {
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/signup",
            serde_json::json!({"username": username, "email": email, "password": password}),
        ),
    )
    .await;
    status
}

/// Sign up and log in, returning the login response body.
pub async fn signup_and_login(app: &Router, username: &str, email: &str, password: &str) -> Value {
    assert_eq!(signup(app, username, email, password).await, StatusCode::OK);
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/login",
            serde_json::json!({"email": email, "password": password}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body
}
