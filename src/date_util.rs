use chrono::{FixedOffset, NaiveDate, Utc};

use crate::error::{Error, Result};

pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO calendar day (`YYYY-MM-DD`).
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    // chrono accepts unpadded fields; the wire format does not
    if s.len() != 10 {
        return Err(Error::InvalidInput(format!("invalid date: {s:?}")));
    }
    NaiveDate::parse_from_str(s, DAY_FORMAT)
        .map_err(|_| Error::InvalidInput(format!("invalid date: {s:?}")))
}

/// Reject ranges whose start falls after their end.
pub fn validate_range(from: NaiveDate, to: NaiveDate) -> Result<()> {
    if from > to {
        return Err(Error::InvalidInput(format!(
            "range start {from} is after range end {to}"
        )));
    }
    Ok(())
}

/// The current calendar day at a fixed UTC offset.
pub fn today_at_offset(offset_minutes: i32) -> Result<NaiveDate> {
    let offset = FixedOffset::east_opt(offset_minutes * 60)
        .ok_or_else(|| Error::Config(format!("UTC offset out of range: {offset_minutes} minutes")))?;
    Ok(Utc::now().with_timezone(&offset).date_naive())
}
