//! Extraction and normalization pipeline for legacy water-quality reports.
//!
//! The pipeline runs in stages: a [`extraction::DocumentReader`] turns a
//! PDF or DOCX file into text segments, the layout [`parsing`] rules lift
//! candidate records out of them, the [`normalize::Normalizer`] maps each
//! candidate onto the parameter vocabulary, and the
//! [`store::MeasurementStore`] persists what survives. Candidates that fail
//! normalization are quarantined with a reason, never dropped.

pub mod error;
pub mod extraction;
pub mod model;
pub mod normalize;
pub mod parsing;
pub mod store;
pub mod vocab;

use std::path::PathBuf;

use error::WaterlineError;
use extraction::ReaderRegistry;
use model::{DocumentFailure, RawDocument, RunSummary};
use normalize::Normalizer;
use store::{MeasurementStore, WriteOutcome};

/// Ingest a batch of documents. A failure scoped to one document (bad file,
/// unreadable archive) is recorded in the summary and the run continues;
/// systemic failures (store errors, missing pdftotext) abort the run.
pub fn ingest_documents(
    paths: &[PathBuf],
    readers: &ReaderRegistry,
    normalizer: &Normalizer,
    store: &mut MeasurementStore,
) -> Result<RunSummary, WaterlineError> {
    let mut summary = RunSummary::default();

    for path in paths {
        match ingest_one(path, readers, normalizer, store, &mut summary) {
            Ok(()) => summary.documents_read += 1,
            Err(err) if err.is_document_scoped() => {
                summary.documents_failed += 1;
                summary.document_failures.push(DocumentFailure {
                    document: path.display().to_string(),
                    kind: err
                        .document_failure_kind()
                        .unwrap_or("unreadable_document")
                        .to_string(),
                    message: err.to_string(),
                });
                tracing::warn!(document = %path.display(), error = %err, "document skipped");
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        documents_read = summary.documents_read,
        documents_failed = summary.documents_failed,
        records_inserted = summary.records_inserted,
        records_quarantined = summary.records_quarantined,
        "ingestion run complete"
    );
    Ok(summary)
}

fn ingest_one(
    path: &PathBuf,
    readers: &ReaderRegistry,
    normalizer: &Normalizer,
    store: &mut MeasurementStore,
    summary: &mut RunSummary,
) -> Result<(), WaterlineError> {
    let doc = RawDocument::from_path(path)?;
    let reader = readers.reader_for(doc.format);
    let segments = reader.read_segments(&doc)?;

    let parsed = parsing::parse_document(&doc, &segments);
    summary.malformed_segments += parsed.malformed_segments;

    tracing::debug!(
        document = %doc.source_ref(),
        vintage = %parsed.vintage,
        backend = reader.backend_name(),
        segments = segments.len(),
        candidates = parsed.candidates.len(),
        "document parsed"
    );

    if parsed.candidates.is_empty() {
        // Readable but yielded nothing: usually a layout the rules don't
        // know yet. Flagged for an operator, not an error.
        summary.low_yield_documents.push(doc.source_ref());
        tracing::warn!(document = %doc.source_ref(), "document yielded no candidate records");
        return Ok(());
    }

    for candidate in &parsed.candidates {
        summary.records_extracted += 1;
        match normalizer.normalize(candidate) {
            Ok(record) => match store.write(&record)? {
                WriteOutcome::Inserted => summary.records_inserted += 1,
                WriteOutcome::Duplicate => summary.records_duplicate += 1,
                WriteOutcome::Conflict { existing_value } => {
                    let detail = format!(
                        "existing value {existing_value} != new value {} for ({}, {}, {})",
                        record.value, record.site_identifier, record.report_date,
                        record.parameter_code
                    );
                    store.quarantine(
                        candidate,
                        model::FailureKind::ConflictingMeasurement,
                        &detail,
                    )?;
                    summary.record_quarantined(model::FailureKind::ConflictingMeasurement);
                }
            },
            Err(failure) => {
                store.quarantine(candidate, failure.kind, &failure.detail)?;
                summary.record_quarantined(failure.kind);
            }
        }
    }

    Ok(())
}
