//! Query-string decoding and validation for the metrics endpoints.
//!
//! Every field arrives as an optional string so that missing and malformed
//! parameters both surface as `Error::InvalidInput`. Query strings the
//! extractor itself rejects (duplicated keys) become `ApiError::BadRequest`
//! in the handlers, so every 400 carries the same JSON body.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::date_util::{parse_day, validate_range};
use crate::error::{Error, Result};
use crate::metrics::Metric;

pub const DEFAULT_RECENT_LIMIT: u32 = 10;
pub const MAX_RECENT_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub clinic_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimeseriesParams {
    pub clinic_id: Option<String>,
    pub metric: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentParams {
    pub clinic_id: Option<String>,
    pub limit: Option<String>,
}

/// A validated clinic and closed date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinicRange {
    pub clinic_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl SummaryParams {
    pub fn validate(&self) -> Result<ClinicRange> {
        clinic_range(&self.clinic_id, &self.from, &self.to)
    }
}

impl TimeseriesParams {
    pub fn validate(&self) -> Result<(ClinicRange, Metric)> {
        let range = clinic_range(&self.clinic_id, &self.from, &self.to)?;
        let metric = required(&self.metric, "metric")?.parse()?;
        Ok((range, metric))
    }
}

impl RecentParams {
    pub fn validate(&self) -> Result<(Uuid, u32)> {
        let clinic_id = parse_clinic_id(required(&self.clinic_id, "clinic_id")?)?;
        let limit = match self.limit.as_deref() {
            None => DEFAULT_RECENT_LIMIT,
            Some(s) => s
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=MAX_RECENT_LIMIT).contains(n))
                .ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "limit must be an integer between 1 and {MAX_RECENT_LIMIT}, got {s:?}"
                    ))
                })?,
        };
        Ok((clinic_id, limit))
    }
}

/// Accept only the canonical hyphenated UUID form.
pub fn parse_clinic_id(s: &str) -> Result<Uuid> {
    let s = s.trim();
    let invalid = || Error::InvalidInput(format!("clinic_id is not a valid UUID: {s:?}"));
    if s.len() != 36 {
        return Err(invalid());
    }
    Uuid::parse_str(s).map_err(|_| invalid())
}

fn clinic_range(
    clinic_id: &Option<String>,
    from: &Option<String>,
    to: &Option<String>,
) -> Result<ClinicRange> {
    let clinic_id = parse_clinic_id(required(clinic_id, "clinic_id")?)?;
    let from = parse_day(required(from, "from")?)?;
    let to = parse_day(required(to, "to")?)?;
    validate_range(from, to)?;
    Ok(ClinicRange { clinic_id, from, to })
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::InvalidInput(format!("missing required parameter: {name}"))),
    }
}
