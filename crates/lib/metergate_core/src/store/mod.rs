//! Store adapters.
//!
//! The gateway talks to storage only through [`CredentialStore`] and
//! [`MeterStore`]. [`PgStore`] is the PostgreSQL implementation.

mod postgres;

pub use postgres::{PgStore, PgStoreOptions};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{NewUser, User, UserWithPassword};
use crate::models::meter::MeterRecord;
use crate::routing::DataSource;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict on {0}")]
    Conflict(String),

    #[error("Store call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Data source '{0}' is not configured")]
    UnknownSource(DataSource),

    #[error("SQL error: {0}")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && db.is_unique_violation()
        {
            return StoreError::Conflict(db.constraint().unwrap_or("unique key").to_string());
        }
        StoreError::Sql(e)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// User account persistence.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user. Duplicate username or email fails with [`StoreError::Conflict`]
    /// and leaves no partial row.
    async fn insert_user(&self, new_user: &NewUser) -> Result<User>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithPassword>>;

    /// Replace a user's password hash (re-hash on login).
    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> Result<()>;
}

/// Meter status lookups across data sources.
#[async_trait]
pub trait MeterStore: Send + Sync {
    async fn find_meter(&self, source: DataSource, meter_id: &str) -> Result<Option<MeterRecord>>;

    /// Data sources this store can answer for.
    fn sources(&self) -> Vec<DataSource>;
}
