pub mod repository;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite_migration::{Migrations, M};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::rollup::{Appointment, DailyRollupRow, ImportBatch};
use crate::source::{AppointmentSource, DailyRollupSource};

/// Database wraps two `tokio_rusqlite::Connection` instances (writer + reader)
/// using WAL mode for concurrent access. The writer serializes imports via
/// `tokio_rusqlite`'s internal channel; request handlers read through the
/// reader without blocking on it.
#[derive(Clone)]
pub struct Database {
    writer: tokio_rusqlite::Connection,
    reader: tokio_rusqlite::Connection,
}

/// Default store location (`~/.clinic-metrics/rollups.db`).
pub fn default_path() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
        .join(".clinic-metrics");
    Ok(dir.join("rollups.db"))
}

impl Database {
    /// Open the database at the default path.
    pub async fn open() -> Result<Self> {
        let path = default_path()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::Config(e.to_string()))?;
        }
        Self::open_at(path).await
    }

    /// Open the database at the given path.
    pub async fn open_at(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening rollup store at {}", path.display());

        let writer = tokio_rusqlite::Connection::open(&path).await?;
        Self::init_writer(&writer).await?;

        let reader = tokio_rusqlite::Connection::open(&path).await?;
        Self::init_reader(&reader).await?;

        Ok(Self { writer, reader })
    }

    /// Open an in-memory database (for testing).
    pub async fn open_memory() -> Result<Self> {
        let writer = tokio_rusqlite::Connection::open_in_memory().await?;
        Self::init_writer(&writer).await?;

        // For in-memory, we share the same connection for reader/writer
        // since in-memory DBs are per-connection.
        Ok(Self {
            reader: writer.clone(),
            writer,
        })
    }

    async fn init_writer(conn: &tokio_rusqlite::Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;\
                 PRAGMA busy_timeout=5000;",
            )
            .map_err(|e| e.to_string())?;
            let migrations = Migrations::new(vec![M::up(include_str!("migrations/001_initial.sql"))]);
            migrations.to_latest(conn).map_err(|e| e.to_string())?;
            Ok::<(), String>(())
        })
        .await
        .map_err(|e| Error::Migration(e.to_string()))
    }

    async fn init_reader(conn: &tokio_rusqlite::Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;\
                 PRAGMA busy_timeout=5000;",
            )?;
            Ok::<(), rusqlite::Error>(())
        })
        .await?;
        Ok(())
    }

    /// Write every row of an import batch in one transaction.
    /// Returns (rollups written, appointments written).
    ///
    /// Rows are validated first; one bad row rejects the whole batch with
    /// `Error::InvalidInput` and nothing is written.
    pub async fn import(&self, batch: ImportBatch) -> Result<(usize, usize)> {
        for row in &batch.rollups {
            row.validate()?;
        }

        let counts = self
            .writer
            .call(move |conn| {
                let tx = conn.transaction()?;
                for row in &batch.rollups {
                    repository::upsert_rollup(&tx, row)?;
                }
                for appt in &batch.appointments {
                    repository::upsert_appointment(&tx, appt)?;
                }
                tx.commit()?;
                Ok::<(usize, usize), rusqlite::Error>((
                    batch.rollups.len(),
                    batch.appointments.len(),
                ))
            })
            .await?;
        log::info!(
            "Imported {} rollup rows and {} appointments",
            counts.0,
            counts.1
        );
        Ok(counts)
    }

    pub async fn rollup_count(&self) -> Result<i64> {
        let count = self
            .reader
            .call(|conn| repository::rollup_count(conn))
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl DailyRollupSource for Database {
    async fn fetch_range(
        &self,
        clinic_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyRollupRow>> {
        let rows = self
            .reader
            .call(move |conn| repository::fetch_range(conn, &clinic_id, from, to))
            .await?;
        Ok(rows)
    }

    async fn fetch_day(&self, clinic_id: Uuid, day: NaiveDate) -> Result<Option<DailyRollupRow>> {
        let row = self
            .reader
            .call(move |conn| repository::fetch_day(conn, &clinic_id, day))
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl AppointmentSource for Database {
    async fn recent_appointments(&self, clinic_id: Uuid, limit: u32) -> Result<Vec<Appointment>> {
        let appointments = self
            .reader
            .call(move |conn| repository::recent_appointments(conn, &clinic_id, limit))
            .await?;
        Ok(appointments)
    }
}
