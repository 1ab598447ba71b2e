use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use crate::api::params::{SummaryParams, TimeseriesParams};
use crate::api::{ApiContext, ApiError};
use crate::date_util::today_at_offset;
use crate::metrics::{self, PeriodSummary, TimeseriesPoint};

/// `GET /api/metrics/summary?clinic_id&from&to`
pub async fn summary(
    State(ctx): State<ApiContext>,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> Result<Json<PeriodSummary>, ApiError> {
    let Query(params) = params?;
    let range = params.validate()?;
    let today = today_at_offset(ctx.config.tz_offset_minutes).map_err(|e| ctx.api_error(e))?;

    let summary = metrics::summarize(
        ctx.rollups.as_ref(),
        range.clinic_id,
        range.from,
        range.to,
        today,
    )
    .await
    .map_err(|e| ctx.api_error(e))?;
    Ok(Json(summary))
}

/// `GET /api/metrics/timeseries?clinic_id&metric&from&to`
pub async fn timeseries(
    State(ctx): State<ApiContext>,
    params: Result<Query<TimeseriesParams>, QueryRejection>,
) -> Result<Json<Vec<TimeseriesPoint>>, ApiError> {
    let Query(params) = params?;
    let (range, metric) = params.validate()?;

    let points = metrics::project(
        ctx.rollups.as_ref(),
        range.clinic_id,
        range.from,
        range.to,
        metric,
    )
    .await
    .map_err(|e| ctx.api_error(e))?;
    Ok(Json(points))
}
