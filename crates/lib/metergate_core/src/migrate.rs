//! Schema bootstrap for the data sources.
//!
//! The embedded migrations only create missing tables, so running them against
//! a populated meter database leaves existing rows untouched.

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Bring one data source's schema up to date.
pub async fn bootstrap(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}
