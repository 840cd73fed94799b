//! PostgreSQL store adapter.
//!
//! Holds one connection pool per configured [`DataSource`]. Every call acquires
//! a pooled connection, runs a single parameterized statement (writes inside a
//! transaction) and returns the connection on every exit path. Calls are
//! bounded by the configured query timeout.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use super::{CredentialStore, MeterStore, Result, StoreError};
use crate::models::auth::{NewUser, User, UserWithPassword};
use crate::models::meter::MeterRecord;
use crate::routing::DataSource;

/// Default bound on a single store call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool sizing and timeouts.
#[derive(Debug, Clone)]
pub struct PgStoreOptions {
    /// Maximum connections per data source.
    pub max_connections: u32,
    /// Bound on acquiring a connection and on each query.
    pub query_timeout: Duration,
}

impl Default for PgStoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// PostgreSQL-backed [`CredentialStore`] and [`MeterStore`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pools: HashMap<DataSource, PgPool>,
    query_timeout: Duration,
}

impl PgStore {
    /// Connect a pool for each `(source, url)` pair. Fails if any source is unreachable.
    pub async fn connect(urls: &[(DataSource, String)], options: &PgStoreOptions) -> Result<Self> {
        let mut pools = HashMap::new();
        for (source, url) in urls {
            let pool = PgPoolOptions::new()
                .max_connections(options.max_connections)
                .acquire_timeout(options.query_timeout)
                .connect(url)
                .await?;
            info!(%source, max_connections = options.max_connections, "connected data source");
            pools.insert(*source, pool);
        }
        Ok(Self::from_pools(pools, options.query_timeout))
    }

    /// Build a store from existing pools.
    pub fn from_pools(pools: HashMap<DataSource, PgPool>, query_timeout: Duration) -> Self {
        Self {
            pools,
            query_timeout,
        }
    }

    /// The pool for `source`.
    pub fn pool(&self, source: DataSource) -> Result<&PgPool> {
        self.pools
            .get(&source)
            .ok_or(StoreError::UnknownSource(source))
    }

    /// Run the schema bootstrap against every configured source.
    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        for source in self.sources() {
            if let Some(pool) = self.pools.get(&source) {
                info!(%source, "running schema bootstrap");
                crate::migrate::bootstrap(pool).await?;
            }
        }
        Ok(())
    }

    /// Close every pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        for pool in self.pools.values() {
            pool.close().await;
        }
    }
}

/// Bound a store future by `limit`, mapping elapsed time to [`StoreError::Timeout`].
///
/// Dropping the inner future on timeout drops any open transaction, which
/// rolls it back and returns the connection to its pool.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn insert_user(&self, new_user: &NewUser) -> Result<User> {
        let pool = self.pool(DataSource::default())?;
        let id = with_timeout(self.query_timeout, async {
            let mut tx = pool.begin().await?;
            let id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO users (username, email, password) VALUES ($1, $2, $3) \
                 RETURNING id::bigint",
            )
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(id)
        })
        .await?;

        Ok(User {
            id,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithPassword>> {
        let pool = self.pool(DataSource::default())?;
        let row = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, (i64, String, String, String)>(
                "SELECT id::bigint, username, email, password FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(pool),
        )
        .await?;

        Ok(row.map(|(id, username, email, password_hash)| UserWithPassword {
            user: User {
                id,
                username,
                email,
            },
            password_hash,
        }))
    }

    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> Result<()> {
        let pool = self.pool(DataSource::default())?;
        with_timeout(
            self.query_timeout,
            sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
                .bind(password_hash)
                .bind(user_id)
                .execute(pool),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MeterStore for PgStore {
    async fn find_meter(&self, source: DataSource, meter_id: &str) -> Result<Option<MeterRecord>> {
        let pool = self.pool(source)?;
        let row = with_timeout(
            self.query_timeout,
            sqlx::query_as::<
                _,
                (
                    Option<NaiveDateTime>,
                    Option<String>,
                    Option<String>,
                    Option<String>,
                ),
            >(
                r#"SELECT "LastCommunicationDatetime", "MeterType", "CommunicationMedium", "CTWC"
                   FROM "MeterData"
                   WHERE "MeterId" = $1"#,
            )
            .bind(meter_id)
            .fetch_optional(pool),
        )
        .await?;

        Ok(row.map(
            |(last_communication, meter_type, communication_medium, ctwc)| MeterRecord {
                meter_id: meter_id.to_string(),
                last_communication,
                meter_type,
                communication_medium,
                ctwc,
            },
        ))
    }

    fn sources(&self) -> Vec<DataSource> {
        DataSource::ALL
            .into_iter()
            .filter(|s| self.pools.contains_key(s))
            .collect()
    }
}
