use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Error;

/// Single-period summary for one clinic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub appts_today: i64,
    pub appts_in_period: i64,
    /// Conversation-weighted mean of the daily averages, in whole seconds.
    pub avg_response_sec_weighted: i64,
    /// Lower median of the daily p50s, in whole seconds. This is a median of
    /// daily medians, not a median over individual conversations.
    pub p50_response_sec_period: i64,
    /// Responded / total conversations, as a percentage with two decimals.
    pub response_rate_percent: f64,
    pub no_shows_in_period: i64,
    pub rescheduled_from_no_show_in_period: i64,
}

/// The series a time-series request can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Appointments,
    MedianResponseTime,
    AverageResponseTime,
    /// Raw daily no-show count. The name says "rate" but the values are counts.
    NoShowRate,
    ResponseRate,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Appointments,
        Metric::MedianResponseTime,
        Metric::AverageResponseTime,
        Metric::NoShowRate,
        Metric::ResponseRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Appointments => "appointments",
            Metric::MedianResponseTime => "medianResponseTime",
            Metric::AverageResponseTime => "averageResponseTime",
            Metric::NoShowRate => "noShowRate",
            Metric::ResponseRate => "responseRate",
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Metric::ALL.iter().map(|m| m.as_str()).collect();
                Error::InvalidInput(format!(
                    "unknown metric {s:?}, expected one of: {}",
                    names.join(", ")
                ))
            })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-series value: whole counts stay integers on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(i64),
    Decimal(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{n}"),
            MetricValue::Decimal(x) => write!(f, "{x:.2}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeseriesPoint {
    pub day: NaiveDate,
    pub value: MetricValue,
}
