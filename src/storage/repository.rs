use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::date_util::DAY_FORMAT;
use crate::rollup::{Appointment, DailyRollupRow};

const ROLLUP_COLUMNS: &str = "clinic_id, day, appts_total, conversations_total, \
     conversations_responded, avg_response_sec, p50_response_sec, no_shows, \
     rescheduled_from_no_show";

// ── Daily rollups ──────────────────────────────────────────────────

pub fn fetch_range(
    conn: &Connection,
    clinic_id: &Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyRollupRow>, rusqlite::Error> {
    let sql = format!(
        "SELECT {ROLLUP_COLUMNS} FROM daily_rollups
         WHERE clinic_id = ?1 AND day >= ?2 AND day <= ?3
         ORDER BY day ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![clinic_id.to_string(), day_key(from), day_key(to)],
        rollup_from_row,
    )?;
    let rollups = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(rollups)
}

pub fn fetch_day(
    conn: &Connection,
    clinic_id: &Uuid,
    day: NaiveDate,
) -> Result<Option<DailyRollupRow>, rusqlite::Error> {
    let sql = format!("SELECT {ROLLUP_COLUMNS} FROM daily_rollups WHERE clinic_id = ?1 AND day = ?2");
    conn.query_row(&sql, params![clinic_id.to_string(), day_key(day)], rollup_from_row)
        .optional()
}

/// Insert a rollup row, replacing any existing row for the same clinic and day.
pub fn upsert_rollup(conn: &Connection, row: &DailyRollupRow) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO daily_rollups (
            clinic_id, day, appts_total, conversations_total, conversations_responded,
            avg_response_sec, p50_response_sec, no_shows, rescheduled_from_no_show
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(clinic_id, day) DO UPDATE SET
            appts_total=excluded.appts_total,
            conversations_total=excluded.conversations_total,
            conversations_responded=excluded.conversations_responded,
            avg_response_sec=excluded.avg_response_sec,
            p50_response_sec=excluded.p50_response_sec,
            no_shows=excluded.no_shows,
            rescheduled_from_no_show=excluded.rescheduled_from_no_show",
        params![
            row.clinic_id.to_string(),
            day_key(row.day),
            row.appts_total,
            row.conversations_total,
            row.conversations_responded,
            row.avg_response_sec,
            row.p50_response_sec,
            row.no_shows,
            row.rescheduled_from_no_show,
        ],
    )?;
    Ok(())
}

pub fn rollup_count(conn: &Connection) -> Result<i64, rusqlite::Error> {
    conn.query_row("SELECT COUNT(*) FROM daily_rollups", [], |row| row.get(0))
}

fn rollup_from_row(row: &Row<'_>) -> Result<DailyRollupRow, rusqlite::Error> {
    Ok(DailyRollupRow {
        clinic_id: parse_uuid_column(row, 0)?,
        day: parse_day_column(row, 1)?,
        appts_total: row.get(2)?,
        conversations_total: row.get(3)?,
        conversations_responded: row.get(4)?,
        avg_response_sec: row.get(5)?,
        p50_response_sec: row.get(6)?,
        no_shows: row.get(7)?,
        rescheduled_from_no_show: row.get(8)?,
    })
}

// ── Appointments ───────────────────────────────────────────────────

pub fn upsert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO appointments (id, clinic_id, patient_id, status, scheduled_for, scheduled_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            clinic_id=excluded.clinic_id, patient_id=excluded.patient_id,
            status=excluded.status, scheduled_for=excluded.scheduled_for,
            scheduled_at=excluded.scheduled_at",
        params![
            appt.id,
            appt.clinic_id.to_string(),
            appt.patient_id,
            appt.status,
            appt.scheduled_for,
            appt.scheduled_at,
        ],
    )?;
    Ok(())
}

pub fn recent_appointments(
    conn: &Connection,
    clinic_id: &Uuid,
    limit: u32,
) -> Result<Vec<Appointment>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, clinic_id, patient_id, status, scheduled_for, scheduled_at
         FROM appointments
         WHERE clinic_id = ?1
         ORDER BY scheduled_at DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![clinic_id.to_string(), limit], |row| {
        Ok(Appointment {
            id: row.get(0)?,
            clinic_id: parse_uuid_column(row, 1)?,
            patient_id: row.get(2)?,
            status: row.get(3)?,
            scheduled_for: row.get(4)?,
            scheduled_at: row.get(5)?,
        })
    })?;
    let appointments = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(appointments)
}

// ── Column helpers ─────────────────────────────────────────────────

fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

fn parse_uuid_column(row: &Row<'_>, idx: usize) -> Result<Uuid, rusqlite::Error> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_day_column(row: &Row<'_>, idx: usize) -> Result<NaiveDate, rusqlite::Error> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, DAY_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
