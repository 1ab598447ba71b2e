pub mod api;
pub mod config;
pub mod date_util;
pub mod error;
pub mod metrics;
pub mod rollup;
pub mod source;
pub mod storage;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use metrics::{
    project, summarize, Metric, MetricValue, PeriodSummary, TimeseriesPoint,
};
pub use rollup::{Appointment, DailyRollupRow, ImportBatch};
pub use source::{AppointmentSource, DailyRollupSource, StaticRollupSource};
pub use storage::Database;
