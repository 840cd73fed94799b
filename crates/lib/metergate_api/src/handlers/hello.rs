//! Root endpoint: liveness check.

use axum::Json;

use crate::models::RootResponse;

/// `GET /`: reports that the service is running.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: metergate_core::hello::running_message(),
        version: metergate_core::version().to_string(),
    })
}
