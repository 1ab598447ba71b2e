//! Collaborator seams the aggregation core reads through.
//!
//! The metrics functions never touch storage directly; they are handed a
//! [`DailyRollupSource`] and only ever call its two fetches. A missing row is
//! an empty result, never an error; `Error::SourceUnavailable` is reserved for
//! fetches that could not be executed at all.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::rollup::{Appointment, DailyRollupRow};

#[async_trait]
pub trait DailyRollupSource: Send + Sync {
    /// Rows for `clinic_id` with `from <= day <= to`, ascending by day,
    /// at most one per day. Days with no recorded activity are simply absent.
    async fn fetch_range(
        &self,
        clinic_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyRollupRow>>;

    /// The row for exactly `day`, if one exists.
    async fn fetch_day(&self, clinic_id: Uuid, day: NaiveDate) -> Result<Option<DailyRollupRow>>;
}

#[async_trait]
pub trait AppointmentSource: Send + Sync {
    /// Most recently booked appointments first.
    async fn recent_appointments(&self, clinic_id: Uuid, limit: u32) -> Result<Vec<Appointment>>;
}

/// Fixed in-memory rows, for tests and offline tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticRollupSource {
    rows: Vec<DailyRollupRow>,
}

impl StaticRollupSource {
    pub fn new(rows: Vec<DailyRollupRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl DailyRollupSource for StaticRollupSource {
    async fn fetch_range(
        &self,
        clinic_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyRollupRow>> {
        let mut rows: Vec<DailyRollupRow> = self
            .rows
            .iter()
            .filter(|r| r.clinic_id == clinic_id && r.day >= from && r.day <= to)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.day);
        rows.dedup_by_key(|r| r.day);
        Ok(rows)
    }

    async fn fetch_day(&self, clinic_id: Uuid, day: NaiveDate) -> Result<Option<DailyRollupRow>> {
        Ok(self
            .rows
            .iter()
            .find(|r| r.clinic_id == clinic_id && r.day == day)
            .cloned())
    }
}
