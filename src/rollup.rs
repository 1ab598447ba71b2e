use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// One precomputed aggregate per (clinic, calendar day).
///
/// Every measure is optional: a missing value means the upstream rollup
/// recorded nothing for it, and consumers substitute zero (or skip the row)
/// rather than treat it as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRollupRow {
    pub clinic_id: Uuid,
    pub day: NaiveDate,
    #[serde(default)]
    pub appts_total: Option<i64>,
    #[serde(default)]
    pub conversations_total: Option<i64>,
    #[serde(default)]
    pub conversations_responded: Option<i64>,
    #[serde(default)]
    pub avg_response_sec: Option<f64>,
    #[serde(default)]
    pub p50_response_sec: Option<f64>,
    #[serde(default)]
    pub no_shows: Option<i64>,
    /// May refer to a no-show recorded on an earlier day.
    #[serde(default)]
    pub rescheduled_from_no_show: Option<i64>,
}

impl DailyRollupRow {
    /// A row with every measure absent.
    pub fn empty(clinic_id: Uuid, day: NaiveDate) -> Self {
        Self {
            clinic_id,
            day,
            appts_total: None,
            conversations_total: None,
            conversations_responded: None,
            avg_response_sec: None,
            p50_response_sec: None,
            no_shows: None,
            rescheduled_from_no_show: None,
        }
    }

    /// Reject rows whose measures cannot describe a real day: negative
    /// counts or durations, or more responded conversations than total.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("appts_total", self.appts_total),
            ("conversations_total", self.conversations_total),
            ("conversations_responded", self.conversations_responded),
            ("no_shows", self.no_shows),
            ("rescheduled_from_no_show", self.rescheduled_from_no_show),
        ];
        for (name, value) in counts {
            if let Some(n) = value.filter(|n| *n < 0) {
                return Err(self.invalid(format!("{name} is negative ({n})")));
            }
        }

        let seconds = [
            ("avg_response_sec", self.avg_response_sec),
            ("p50_response_sec", self.p50_response_sec),
        ];
        for (name, value) in seconds {
            if let Some(x) = value.filter(|x| x.is_nan() || *x < 0.0) {
                return Err(self.invalid(format!("{name} is not a non-negative number ({x})")));
            }
        }

        if let (Some(total), Some(responded)) =
            (self.conversations_total, self.conversations_responded)
        {
            if responded > total {
                return Err(self.invalid(format!(
                    "conversations_responded ({responded}) exceeds conversations_total ({total})"
                )));
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidInput(format!("rollup {} {}: {reason}", self.clinic_id, self.day))
    }
}

/// A scheduled appointment, as listed by the recent-appointments view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    #[serde(skip_serializing)]
    pub clinic_id: Uuid,
    pub patient_id: Option<String>,
    pub status: String,
    /// When the appointment takes place.
    pub scheduled_for: String,
    /// When the booking was made.
    pub scheduled_at: String,
}

/// Contents of a file accepted by `clinic-metrics import`.
#[derive(Debug, Default, Deserialize)]
pub struct ImportBatch {
    #[serde(default)]
    pub rollups: Vec<DailyRollupRow>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_deserializes_with_missing_measures() {
        let json = r#"{
            "clinic_id": "550e8400-e29b-41d4-a716-446655440000",
            "day": "2025-01-02",
            "appts_total": 8,
            "p50_response_sec": null
        }"#;
        let row: DailyRollupRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.day, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert_eq!(row.appts_total, Some(8));
        assert_eq!(row.p50_response_sec, None);
        assert_eq!(row.conversations_total, None);
    }

    #[test]
    fn test_validate_accepts_sparse_and_consistent_rows() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert!(DailyRollupRow::empty(Uuid::nil(), day).validate().is_ok());

        let row = DailyRollupRow {
            conversations_total: Some(4),
            conversations_responded: Some(4),
            avg_response_sec: Some(0.0),
            ..DailyRollupRow::empty(Uuid::nil(), day)
        };
        assert!(row.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_impossible_measures() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let negative = DailyRollupRow {
            no_shows: Some(-1),
            ..DailyRollupRow::empty(Uuid::nil(), day)
        };
        let slow = DailyRollupRow {
            p50_response_sec: Some(-3.5),
            ..DailyRollupRow::empty(Uuid::nil(), day)
        };
        let overcounted = DailyRollupRow {
            conversations_total: Some(3),
            conversations_responded: Some(5),
            ..DailyRollupRow::empty(Uuid::nil(), day)
        };

        for row in [negative, slow, overcounted] {
            let err = row.validate().unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{err}");
            assert!(err.to_string().contains("2025-01-02"), "{err}");
        }
    }

    #[test]
    fn test_import_batch_sections_are_optional() {
        let batch: ImportBatch = serde_json::from_str("{}").unwrap();
        assert!(batch.rollups.is_empty());
        assert!(batch.appointments.is_empty());
    }

    #[test]
    fn test_appointment_omits_clinic_id_when_serialized() {
        let appt = Appointment {
            id: "a1".into(),
            clinic_id: Uuid::nil(),
            patient_id: Some("p1".into()),
            status: "scheduled".into(),
            scheduled_for: "2025-01-03T09:00:00Z".into(),
            scheduled_at: "2025-01-01T12:00:00Z".into(),
        };
        let value = serde_json::to_value(&appt).unwrap();
        assert!(value.get("clinic_id").is_none());
        assert_eq!(value["status"], "scheduled");
    }
}
