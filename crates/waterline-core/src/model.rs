use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::WaterlineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => write!(f, "pdf"),
            DocumentFormat::Docx => write!(f, "docx"),
        }
    }
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<DocumentFormat> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("pdf") {
            Some(DocumentFormat::Pdf)
        } else if ext.eq_ignore_ascii_case("docx") {
            Some(DocumentFormat::Docx)
        } else {
            None
        }
    }
}

/// A source document as read from disk. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    /// Read a document from disk. The extension decides the format tag;
    /// anything other than .pdf/.docx is `UnsupportedFormat`.
    pub fn from_path(path: &Path) -> Result<RawDocument, WaterlineError> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            WaterlineError::UnsupportedFormat {
                path: path.to_path_buf(),
            }
        })?;
        let bytes = std::fs::read(path).map_err(|e| WaterlineError::UnreadableDocument {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(RawDocument {
            path: path.to_path_buf(),
            format,
            bytes,
        })
    }

    /// Stable reference string stored alongside every record from this document.
    pub fn source_ref(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Paragraph,
    /// A table row; cell texts joined with tabs, preserving column order.
    TableRow,
}

/// One unit of extracted text, in source order.
#[derive(Debug, Clone)]
pub struct Segment {
    pub index: usize,
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    pub fn paragraph(index: usize, text: impl Into<String>) -> Segment {
        Segment {
            index,
            kind: SegmentKind::Paragraph,
            text: text.into(),
        }
    }

    pub fn table_row(index: usize, cells: &[&str]) -> Segment {
        Segment {
            index,
            kind: SegmentKind::TableRow,
            text: cells.join("\t"),
        }
    }
}

/// The parser's per-data-point output. Fields are raw text and may be
/// malformed; the normalizer decides what survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub report_date_raw: Option<String>,
    pub site_identifier_raw: String,
    pub parameter_name_raw: String,
    pub value_raw: String,
    pub unit_raw: Option<String>,
    pub source_document_ref: String,
}

/// A fully normalized record, ready for the store. parameter_code and unit
/// are always drawn from the vocabulary; value is a finite decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub report_date: NaiveDate,
    pub site_identifier: String,
    pub parameter_code: String,
    pub value: Decimal,
    pub unit: String,
    pub source_document_ref: String,
}

/// One persisted measurement row, keyed by (site, date, parameter).
#[derive(Debug, Clone, Serialize)]
pub struct Measurement {
    pub site_identifier: String,
    pub report_date: NaiveDate,
    pub parameter_code: String,
    pub value: Decimal,
    pub unit: String,
    pub source_document_ref: String,
    pub ingested_at: String,
}

/// Why a record was quarantined instead of persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownParameter,
    IncompatibleUnit,
    InvalidValue,
    ConflictingMeasurement,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UnknownParameter => "unknown_parameter",
            FailureKind::IncompatibleUnit => "incompatible_unit",
            FailureKind::InvalidValue => "invalid_value",
            FailureKind::ConflictingMeasurement => "conflicting_measurement",
        }
    }

    pub fn parse(s: &str) -> Option<FailureKind> {
        match s {
            "unknown_parameter" => Some(FailureKind::UnknownParameter),
            "incompatible_unit" => Some(FailureKind::IncompatibleUnit),
            "invalid_value" => Some(FailureKind::InvalidValue),
            "conflicting_measurement" => Some(FailureKind::ConflictingMeasurement),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document that failed at the reader level. The run continues without it.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    pub document: String,
    pub kind: String,
    pub message: String,
}

/// Aggregated counts for one ingestion run, enumerated per error kind so an
/// operator can triage without re-reading source documents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub documents_read: u64,
    pub documents_failed: u64,
    pub records_extracted: u64,
    pub records_inserted: u64,
    pub records_duplicate: u64,
    pub records_quarantined: u64,
    pub quarantined_by_kind: BTreeMap<FailureKind, u64>,
    pub malformed_segments: u64,
    pub low_yield_documents: Vec<String>,
    pub document_failures: Vec<DocumentFailure>,
}

impl RunSummary {
    pub fn record_quarantined(&mut self, kind: FailureKind) {
        self.records_quarantined += 1;
        *self.quarantined_by_kind.entry(kind).or_insert(0) += 1;
    }

    pub fn quarantined_count(&self, kind: FailureKind) -> u64 {
        self.quarantined_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// True when any document failed with UnsupportedFormat/UnreadableDocument.
    /// The CLI exits non-zero in that case.
    pub fn has_document_failures(&self) -> bool {
        self.documents_failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("report.pdf")),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("report.DOCX")),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("report.xlsx")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("report")), None);
    }

    #[test]
    fn test_failure_kind_round_trip() {
        for kind in [
            FailureKind::UnknownParameter,
            FailureKind::IncompatibleUnit,
            FailureKind::InvalidValue,
            FailureKind::ConflictingMeasurement,
        ] {
            assert_eq!(FailureKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FailureKind::parse("nonsense"), None);
    }

    #[test]
    fn test_summary_quarantine_counters() {
        let mut s = RunSummary::default();
        s.record_quarantined(FailureKind::InvalidValue);
        s.record_quarantined(FailureKind::InvalidValue);
        s.record_quarantined(FailureKind::UnknownParameter);
        assert_eq!(s.records_quarantined, 3);
        assert_eq!(s.quarantined_count(FailureKind::InvalidValue), 2);
        assert_eq!(s.quarantined_count(FailureKind::UnknownParameter), 1);
        assert_eq!(s.quarantined_count(FailureKind::IncompatibleUnit), 0);
    }
}
