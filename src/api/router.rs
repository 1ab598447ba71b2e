//! Composable API router. All routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Request logger → 2. CORS → 3. Security headers

use axum::http::header::{
    AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::{ApiContext, ApiError};
use crate::error::{Error, Result};

/// Build the API router.
///
/// Fails only if the configured CORS origin is not a valid header value.
pub fn api_router(ctx: ApiContext) -> Result<Router> {
    let origin = HeaderValue::from_str(&ctx.config.allowed_origin).map_err(|_| {
        Error::Config(format!(
            "ALLOWED_ORIGIN is not a valid origin: {:?}",
            ctx.config.allowed_origin
        ))
    })?;

    // Echoed back only when the request origin matches
    let cors = CorsLayer::new()
        .allow_origin([origin])
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true);

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/metrics/summary", get(endpoints::metrics::summary))
        .route("/metrics/timeseries", get(endpoints::metrics::timeseries))
        .route("/appointments/recent", get(endpoints::appointments::recent))
        .with_state(ctx);

    Ok(Router::new()
        .nest("/api", api)
        .fallback(not_found)
        // Layers run bottom-up on the way in
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::log_request)))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".into())
}
