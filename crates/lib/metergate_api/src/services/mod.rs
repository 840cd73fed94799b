//! Gateway services: the flows behind each endpoint.

pub mod auth;
pub mod meters;
mod validation;
