//! Domain models.

pub mod auth;
pub mod meter;
