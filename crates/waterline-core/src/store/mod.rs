use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::error::WaterlineError;
use crate::model::{CandidateRecord, CanonicalRecord, FailureKind, Measurement};

/// Result of writing one canonical record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    /// Same natural key, same value; silently idempotent.
    Duplicate,
    /// Same natural key, different value; the stored row is untouched and
    /// the new record belongs in quarantine.
    Conflict { existing_value: Decimal },
}

/// Query filters for the measurements table. All optional, ANDed together.
#[derive(Debug, Default, Clone)]
pub struct MeasurementFilter {
    pub site: Option<String>,
    pub parameter_code: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// One quarantined record as stored.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QuarantineEntry {
    pub id: i64,
    pub raw_fields: String,
    pub failure_kind: FailureKind,
    pub failure_detail: String,
    pub source_document_ref: String,
    pub quarantined_at: String,
}

const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS measurements (
    site_identifier      TEXT NOT NULL,
    report_date          TEXT NOT NULL,
    parameter_code       TEXT NOT NULL,
    value                TEXT NOT NULL,
    unit                 TEXT NOT NULL,
    source_document_ref  TEXT NOT NULL,
    ingested_at          TEXT NOT NULL,
    PRIMARY KEY (site_identifier, report_date, parameter_code)
);

CREATE TABLE IF NOT EXISTS quarantine (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    raw_fields           TEXT NOT NULL,
    failure_kind         TEXT NOT NULL,
    failure_detail       TEXT NOT NULL,
    source_document_ref  TEXT NOT NULL,
    quarantined_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_quarantine_kind ON quarantine (failure_kind);
";

/// SQLite-backed record store. Measurements are append-only: an existing
/// (site, date, parameter) row is never overwritten.
pub struct MeasurementStore {
    conn: Connection,
}

impl MeasurementStore {
    pub fn open(path: &Path) -> Result<Self, WaterlineError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, WaterlineError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, WaterlineError> {
        conn.execute_batch(SCHEMA)?;
        Ok(MeasurementStore { conn })
    }

    /// Insert a canonical record, honoring the never-overwrite rule.
    pub fn write(&mut self, record: &CanonicalRecord) -> Result<WriteOutcome, WaterlineError> {
        let tx = self.conn.transaction()?;
        let date = record.report_date.to_string();
        let value = record.value.normalize().to_string();

        let existing: Option<String> = tx
            .query_row(
                "SELECT value FROM measurements
                 WHERE site_identifier = ?1 AND report_date = ?2 AND parameter_code = ?3",
                params![record.site_identifier, date, record.parameter_code],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(existing) = existing {
            let existing_value = Decimal::from_str(&existing).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
            })?;
            tx.commit()?;
            return Ok(if existing_value == record.value.normalize() {
                WriteOutcome::Duplicate
            } else {
                WriteOutcome::Conflict { existing_value }
            });
        }

        tx.execute(
            "INSERT INTO measurements
             (site_identifier, report_date, parameter_code, value, unit,
              source_document_ref, ingested_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.site_identifier,
                date,
                record.parameter_code,
                value,
                record.unit,
                record.source_document_ref,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(WriteOutcome::Inserted)
    }

    /// File a candidate that could not be normalized (or conflicted).
    /// The raw fields are kept verbatim as JSON so nothing is lost.
    pub fn quarantine(
        &mut self,
        candidate: &CandidateRecord,
        kind: FailureKind,
        detail: &str,
    ) -> Result<(), WaterlineError> {
        let raw_fields = serde_json::to_string(candidate)?;
        self.conn.execute(
            "INSERT INTO quarantine
             (raw_fields, failure_kind, failure_detail, source_document_ref, quarantined_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                raw_fields,
                kind.as_str(),
                detail,
                candidate.source_document_ref,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn query_measurements(
        &self,
        filter: &MeasurementFilter,
    ) -> Result<Vec<Measurement>, WaterlineError> {
        let mut sql = String::from(
            "SELECT site_identifier, report_date, parameter_code, value, unit,
                    source_document_ref, ingested_at
             FROM measurements WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();

        if let Some(site) = &filter.site {
            args.push(site.clone());
            sql.push_str(&format!(" AND site_identifier = ?{}", args.len()));
        }
        if let Some(code) = &filter.parameter_code {
            args.push(code.clone());
            sql.push_str(&format!(" AND parameter_code = ?{}", args.len()));
        }
        if let Some(from) = &filter.from {
            args.push(from.to_string());
            sql.push_str(&format!(" AND report_date >= ?{}", args.len()));
        }
        if let Some(to) = &filter.to {
            args.push(to.to_string());
            sql.push_str(&format!(" AND report_date <= ?{}", args.len()));
        }
        sql.push_str(" ORDER BY site_identifier, report_date, parameter_code");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            let date: String = row.get(1)?;
            let value: String = row.get(3)?;
            Ok(Measurement {
                site_identifier: row.get(0)?,
                report_date: NaiveDate::from_str(&date).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
                })?,
                parameter_code: row.get(2)?,
                value: Decimal::from_str(&value).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
                })?,
                unit: row.get(4)?,
                source_document_ref: row.get(5)?,
                ingested_at: row.get(6)?,
            })
        })?;

        let mut measurements = Vec::new();
        for row in rows {
            measurements.push(row?);
        }
        Ok(measurements)
    }

    pub fn list_quarantine(
        &self,
        kind: Option<FailureKind>,
    ) -> Result<Vec<QuarantineEntry>, WaterlineError> {
        let mut sql = String::from(
            "SELECT id, raw_fields, failure_kind, failure_detail,
                    source_document_ref, quarantined_at
             FROM quarantine",
        );
        let mut args: Vec<String> = Vec::new();
        if let Some(kind) = kind {
            args.push(kind.as_str().to_string());
            sql.push_str(" WHERE failure_kind = ?1");
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            let kind: String = row.get(2)?;
            Ok(QuarantineEntry {
                id: row.get(0)?,
                raw_fields: row.get(1)?,
                failure_kind: FailureKind::parse(&kind).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        Type::Text,
                        format!("unknown failure kind '{kind}'").into(),
                    )
                })?,
                failure_detail: row.get(3)?,
                source_document_ref: row.get(4)?,
                quarantined_at: row.get(5)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    pub fn measurement_count(&self) -> Result<u64, WaterlineError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}
