//! Body extractors whose rejections go through [`AppError`].

use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json<T>` with malformed bodies reported as a validation error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Form<T>` with malformed bodies reported as a validation error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct AppForm<T>(pub T);
