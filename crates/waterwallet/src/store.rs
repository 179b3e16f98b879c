//! SQLite persistence for sensor readings and usage entries.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Row, params};
use thiserror::Error;
use tracing::info;

use crate::records::{SensorReading, StoredReading, StoredUsage, UsageEntry};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported database url '{0}'; expected sqlite://<path> or sqlite::memory:")]
    UnsupportedUrl(String),
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS water_data (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp         TEXT    NOT NULL,
    flow_rate         REAL    NOT NULL,
    total_consumption REAL    NOT NULL,
    pipe_pressure     REAL    NOT NULL,
    leak_detected     INTEGER NOT NULL DEFAULT 0,
    prediction        REAL
);
CREATE INDEX IF NOT EXISTS water_data_timestamp ON water_data (timestamp);

CREATE TABLE IF NOT EXISTS water_usage (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp   TEXT    NOT NULL,
    kitchen     REAL    NOT NULL,
    bathroom    REAL    NOT NULL,
    outdoor     REAL    NOT NULL,
    weather     TEXT,
    rainfall    REAL,
    temperature REAL
);
CREATE INDEX IF NOT EXISTS water_usage_timestamp ON water_usage (timestamp);
";

/// Record store backed by a single SQLite connection.
///
/// The connection sits behind a mutex; every method holds it for one short
/// statement.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open from a `sqlite://` URL, creating tables as needed.
    ///
    /// Accepts `sqlite://relative.db`, `sqlite:///absolute/path.db`,
    /// `sqlite::memory:`, or a bare filesystem path.
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        if matches!(database_url, "sqlite::memory:" | ":memory:") {
            return Self::open_in_memory();
        }
        match database_url.strip_prefix("sqlite://") {
            Some("") => Err(StoreError::UnsupportedUrl(database_url.to_string())),
            Some(path) => Self::open_path(path),
            None if database_url.contains("://") => {
                Err(StoreError::UnsupportedUrl(database_url.to_string()))
            }
            None => Self::open_path(database_url),
        }
    }

    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!("Opened record store at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Sensor readings ────────────────────────────────────────────

    pub fn insert_reading(
        &self,
        reading: &SensorReading,
        prediction: Option<f64>,
    ) -> Result<StoredReading, StoreError> {
        let timestamp = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO water_data
                (timestamp, flow_rate, total_consumption, pipe_pressure, leak_detected, prediction)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                format_timestamp(&timestamp),
                reading.flow_rate,
                reading.total_consumption,
                reading.pipe_pressure,
                reading.leak_detected,
                prediction,
            ],
        )?;
        Ok(StoredReading {
            id: conn.last_insert_rowid(),
            timestamp,
            reading: reading.clone(),
            prediction,
        })
    }

    /// Newest readings first, at most `limit`.
    pub fn list_readings(
        &self,
        limit: usize,
        leak_only: bool,
    ) -> Result<Vec<StoredReading>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, flow_rate, total_consumption, pipe_pressure, leak_detected, prediction
             FROM water_data
             WHERE (?1 = 0 OR leak_detected = 1)
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![leak_only, limit], reading_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Usage entries ──────────────────────────────────────────────

    pub fn insert_usage(&self, entry: &UsageEntry) -> Result<StoredUsage, StoreError> {
        let timestamp = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO water_usage
                (timestamp, kitchen, bathroom, outdoor, weather, rainfall, temperature)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                format_timestamp(&timestamp),
                entry.kitchen,
                entry.bathroom,
                entry.outdoor,
                entry.weather,
                entry.rainfall,
                entry.temperature,
            ],
        )?;
        Ok(StoredUsage {
            id: conn.last_insert_rowid(),
            timestamp,
            entry: entry.clone(),
        })
    }

    /// All usage entries, newest first.
    pub fn list_usage(&self) -> Result<Vec<StoredUsage>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, kitchen, bathroom, outdoor, weather, rainfall, temperature
             FROM water_usage
             ORDER BY timestamp DESC, id DESC",
        )?;
        let rows = stmt.query_map([], usage_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Fixed-width RFC 3339 so that text ordering is chronological.
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<StoredReading> {
    Ok(StoredReading {
        id: row.get(0)?,
        timestamp: parse_timestamp(row, 1)?,
        reading: SensorReading {
            flow_rate: row.get(2)?,
            total_consumption: row.get(3)?,
            pipe_pressure: row.get(4)?,
            leak_detected: row.get(5)?,
        },
        prediction: row.get(6)?,
    })
}

fn usage_from_row(row: &Row<'_>) -> rusqlite::Result<StoredUsage> {
    Ok(StoredUsage {
        id: row.get(0)?,
        timestamp: parse_timestamp(row, 1)?,
        entry: UsageEntry {
            kitchen: row.get(2)?,
            bathroom: row.get(3)?,
            outdoor: row.get(4)?,
            weather: row
                .get::<_, Option<String>>(5)?
                .unwrap_or_else(|| "unknown".to_string()),
            rainfall: row.get(6)?,
            temperature: row.get(7)?,
        },
    })
}
