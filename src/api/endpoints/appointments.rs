use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use crate::api::params::RecentParams;
use crate::api::{ApiContext, ApiError};
use crate::rollup::Appointment;

/// `GET /api/appointments/recent?clinic_id&limit`: newest bookings first.
pub async fn recent(
    State(ctx): State<ApiContext>,
    params: Result<Query<RecentParams>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let Query(params) = params?;
    let (clinic_id, limit) = params.validate()?;

    let appointments = ctx
        .appointments
        .recent_appointments(clinic_id, limit)
        .await
        .map_err(|e| ctx.api_error(e))?;
    Ok(Json(appointments))
}
