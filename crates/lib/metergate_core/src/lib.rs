//! # metergate_core
//!
//! Core domain logic for Metergate: password hashing, token lifecycle,
//! data source routing and the PostgreSQL store adapter.

pub mod auth;
pub mod hello;
pub mod migrate;
pub mod models;
pub mod routing;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
