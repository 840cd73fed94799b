//! API server configuration.

use std::fmt;
use std::time::Duration;

use metergate_core::auth::jwt::{DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_REFRESH_TOKEN_TTL};
use metergate_core::routing::DataSource;
use metergate_core::store::PgStoreOptions;
use thiserror::Error;

/// Shortest signing secret accepted at startup.
pub const MIN_SECRET_BYTES: usize = 16;

/// Longest accepted access token lifetime.
pub const MAX_ACCESS_TOKEN_TTL: chrono::Duration = chrono::Duration::days(1);

/// Longest accepted refresh token lifetime.
pub const MAX_REFRESH_TOKEN_TTL: chrono::Duration = chrono::Duration::days(365);

/// Configuration errors. Any of these aborts startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Missing(&'static str),

    #[error("signing secret must be at least {MIN_SECRET_BYTES} bytes (got {0})")]
    WeakSecret(usize),

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("{0} is out of range")]
    OutOfRange(&'static str),
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// Connection URL for the primary source (`PKG1`, users).
    pub primary_db_url: String,
    /// Connection URL for the secondary source (`PKG3`). Absent means single-source.
    pub secondary_db_url: Option<String>,
    /// JWT signing secret.
    pub jwt_secret: String,
    pub access_token_ttl: chrono::Duration,
    pub refresh_token_ttl: chrono::Duration,
    /// Bound on each store call.
    pub query_timeout: Duration,
    /// Pool size per data source.
    pub max_connections: u32,
}

impl ApiConfig {
    /// Configuration with default TTLs and timeouts for the given sources and secret.
    pub fn new(primary_db_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        let store = PgStoreOptions::default();
        Self {
            bind_addr: "127.0.0.1:8000".into(),
            primary_db_url: primary_db_url.into(),
            secondary_db_url: None,
            jwt_secret: jwt_secret.into(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            query_timeout: store.query_timeout,
            max_connections: store.max_connections,
        }
    }

    /// Reject configurations the server must not run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_db_url.trim().is_empty() {
            return Err(ConfigError::Missing("primary database URL"));
        }
        if self
            .secondary_db_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Missing("secondary database URL"));
        }
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("signing secret"));
        }
        if self.jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::WeakSecret(self.jwt_secret.len()));
        }
        if self.access_token_ttl <= chrono::Duration::zero() {
            return Err(ConfigError::NonPositive("access token TTL"));
        }
        if self.refresh_token_ttl <= chrono::Duration::zero() {
            return Err(ConfigError::NonPositive("refresh token TTL"));
        }
        if self.access_token_ttl > MAX_ACCESS_TOKEN_TTL {
            return Err(ConfigError::OutOfRange("access token TTL"));
        }
        if self.refresh_token_ttl > MAX_REFRESH_TOKEN_TTL {
            return Err(ConfigError::OutOfRange("refresh token TTL"));
        }
        if self.query_timeout.is_zero() {
            return Err(ConfigError::NonPositive("query timeout"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::NonPositive("max connections"));
        }
        Ok(())
    }

    /// Connection URL for each configured data source.
    pub fn data_source_urls(&self) -> Vec<(DataSource, String)> {
        let mut urls = vec![(DataSource::Primary, self.primary_db_url.clone())];
        if let Some(url) = &self.secondary_db_url {
            urls.push((DataSource::Secondary, url.clone()));
        }
        urls
    }

    pub fn store_options(&self) -> PgStoreOptions {
        PgStoreOptions {
            max_connections: self.max_connections,
            query_timeout: self.query_timeout,
        }
    }
}

// Connection URLs and the secret are credentials; keep them out of logs.
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("primary_db_url", &"<redacted>")
            .field(
                "secondary_db_url",
                &self.secondary_db_url.as_ref().map(|_| "<redacted>"),
            )
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("query_timeout", &self.query_timeout)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}
