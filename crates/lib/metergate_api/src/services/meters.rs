//! Meter status lookups.

use chrono::NaiveDate;
use metergate_core::routing::SourceRouter;
use metergate_core::store::MeterStore;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::MeterStatusResponse;

/// Look up a meter on the source selected by `package` and derive its status
/// relative to `today`.
pub async fn meter_status(
    meters: &dyn MeterStore,
    sources: &SourceRouter,
    meter_id: Option<&str>,
    package: Option<&str>,
    today: NaiveDate,
) -> AppResult<MeterStatusResponse> {
    let meter_id = meter_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("meter_id is required".into()))?;

    let source = sources.resolve(package);
    debug!(meter_id, ?package, %source, "resolved data source");

    let record = meters
        .find_meter(source, meter_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Meter not found".into()))?;

    Ok(MeterStatusResponse {
        status: record.status(today),
        last_communication: record.last_communication_display(),
        meter_id: record.meter_id,
        meter_type: record.meter_type,
        communication_medium: record.communication_medium,
        ctwc: record.ctwc,
    })
}
