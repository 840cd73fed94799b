//! Meter status handler.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::Local;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{MeterStatusQuery, MeterStatusResponse};
use crate::services::meters;

/// `GET /meter-status?meter_id=..&package=..`: communication status of one meter.
pub async fn meter_status_handler(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthenticatedUser>,
    Query(query): Query<MeterStatusQuery>,
) -> AppResult<Json<MeterStatusResponse>> {
    let resp = meters::meter_status(
        state.meters.as_ref(),
        &state.sources,
        query.meter_id.as_deref(),
        query.package.as_deref(),
        Local::now().date_naive(),
    )
    .await?;
    Ok(Json(resp))
}
