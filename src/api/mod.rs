//! HTTP boundary: decodes and validates query parameters, calls into the
//! metrics core, and encodes results (or errors) as JSON.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod params;
pub mod router;
pub mod server;

use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::error::Error;
use crate::source::{AppointmentSource, DailyRollupSource};

pub use error::ApiError;
pub use router::api_router;
pub use server::serve;

/// Shared state handed to every endpoint.
#[derive(Clone)]
pub struct ApiContext {
    pub rollups: Arc<dyn DailyRollupSource>,
    pub appointments: Arc<dyn AppointmentSource>,
    pub config: Arc<ServerConfig>,
    pub started_at: Instant,
}

impl ApiContext {
    pub fn new(
        rollups: Arc<dyn DailyRollupSource>,
        appointments: Arc<dyn AppointmentSource>,
        config: ServerConfig,
    ) -> Self {
        Self {
            rollups,
            appointments,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Convert a core error, exposing internal detail only in development.
    pub fn api_error(&self, err: Error) -> ApiError {
        ApiError::from_core(err, self.config.is_development())
    }
}
