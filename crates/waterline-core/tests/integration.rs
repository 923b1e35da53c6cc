//! End-to-end pipeline tests using a mock document reader, so no pdftotext
//! binary or real Office files are needed.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use rust_decimal_macros::dec;

use waterline_core::error::WaterlineError;
use waterline_core::extraction::{DocumentReader, ReaderRegistry};
use waterline_core::ingest_documents;
use waterline_core::model::{FailureKind, RawDocument, Segment};
use waterline_core::normalize::Normalizer;
use waterline_core::store::{MeasurementFilter, MeasurementStore};
use waterline_core::vocab::builtin::load_preset;

/// Serves canned segments keyed by file stem. Stems absent from the map
/// fail as unreadable, mimicking a corrupt file.
struct MockReader {
    canned: HashMap<String, Vec<Segment>>,
}

impl MockReader {
    fn new(canned: HashMap<String, Vec<Segment>>) -> Self {
        MockReader { canned }
    }
}

impl DocumentReader for MockReader {
    fn read_segments(&self, doc: &RawDocument) -> Result<Vec<Segment>, WaterlineError> {
        let stem = doc
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.canned
            .get(&stem)
            .cloned()
            .ok_or_else(|| WaterlineError::UnreadableDocument {
                path: doc.path.clone(),
                reason: "mock: corrupt file".to_string(),
            })
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    registry: ReaderRegistry,
    normalizer: Normalizer,
    store: MeasurementStore,
}

impl Fixture {
    fn new(canned: HashMap<String, Vec<Segment>>) -> Fixture {
        let registry = ReaderRegistry::new(
            Box::new(MockReader::new(canned.clone())),
            Box::new(MockReader::new(canned)),
        );
        Fixture {
            dir: tempfile::tempdir().unwrap(),
            registry,
            normalizer: Normalizer::new(&load_preset("standard").unwrap()),
            store: MeasurementStore::open_in_memory().unwrap(),
        }
    }

    /// Create a placeholder file so RawDocument::from_path succeeds; the
    /// mock reader ignores the bytes.
    fn file(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, b"placeholder").unwrap();
        path
    }
}

fn site_visit_segments(facility: &str, date: &str, readings: &[(&str, &str)]) -> Vec<Segment> {
    let mut segs = vec![
        Segment::paragraph(0, format!("Facility: {facility}")),
        Segment::paragraph(1, format!("Date: {date}")),
    ];
    for (param, value) in readings {
        let idx = segs.len();
        segs.push(Segment::paragraph(idx, format!("{param}: {value}")));
    }
    segs
}

#[test]
fn test_reingestion_is_idempotent() {
    let mut canned = HashMap::new();
    canned.insert(
        "visit".to_string(),
        site_visit_segments("Plant A", "3/14/23", &[("pH", "7.5"), ("Chloride", "45 mg/L")]),
    );
    let mut fx = Fixture::new(canned);
    let paths = vec![fx.file("visit.pdf")];

    let first =
        ingest_documents(&paths, &fx.registry, &fx.normalizer, &mut fx.store).unwrap();
    assert_eq!(first.records_inserted, 2);
    assert_eq!(first.records_duplicate, 0);

    let second =
        ingest_documents(&paths, &fx.registry, &fx.normalizer, &mut fx.store).unwrap();
    assert_eq!(second.records_inserted, 0);
    assert_eq!(second.records_duplicate, 2);
    assert_eq!(second.records_quarantined, 0);
    assert_eq!(fx.store.measurement_count().unwrap(), 2);
}

#[test]
fn test_conflicting_value_quarantined_and_original_kept() {
    let mut canned = HashMap::new();
    canned.insert(
        "first".to_string(),
        site_visit_segments("Plant A", "3/14/23", &[("pH", "7.5")]),
    );
    canned.insert(
        "second".to_string(),
        site_visit_segments("Plant A", "3/14/23", &[("pH", "8.1")]),
    );
    let mut fx = Fixture::new(canned);
    let paths = vec![fx.file("first.pdf"), fx.file("second.pdf")];

    let summary =
        ingest_documents(&paths, &fx.registry, &fx.normalizer, &mut fx.store).unwrap();
    assert_eq!(summary.records_inserted, 1);
    assert_eq!(
        summary.quarantined_count(FailureKind::ConflictingMeasurement),
        1
    );

    let rows = fx
        .store
        .query_measurements(&MeasurementFilter::default())
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, dec!(7.5));

    let quarantined = fx
        .store
        .list_quarantine(Some(FailureKind::ConflictingMeasurement))
        .unwrap();
    assert_eq!(quarantined.len(), 1);
    assert!(quarantined[0].failure_detail.contains("7.5"));
    assert!(quarantined[0].failure_detail.contains("8.1"));
}

#[test]
fn test_converted_unit_duplicates_canonical_value() {
    // 500 µg/L iron and 0.5 mg/L iron are the same measurement.
    let mut canned = HashMap::new();
    canned.insert(
        "micrograms".to_string(),
        site_visit_segments("Plant A", "3/14/23", &[("Iron", "500 µg/L")]),
    );
    canned.insert(
        "milligrams".to_string(),
        site_visit_segments("Plant A", "3/14/23", &[("Iron", "0.5 mg/L")]),
    );
    let mut fx = Fixture::new(canned);
    let paths = vec![fx.file("micrograms.pdf"), fx.file("milligrams.pdf")];

    let summary =
        ingest_documents(&paths, &fx.registry, &fx.normalizer, &mut fx.store).unwrap();
    assert_eq!(summary.records_inserted, 1);
    assert_eq!(summary.records_duplicate, 1);
    assert_eq!(summary.records_quarantined, 0);

    let rows = fx
        .store
        .query_measurements(&MeasurementFilter::default())
        .unwrap();
    assert_eq!(rows[0].value, dec!(0.5));
    assert_eq!(rows[0].unit, "mg/L");
}

#[test]
fn test_out_of_range_value_quarantined() {
    let mut canned = HashMap::new();
    canned.insert(
        "visit".to_string(),
        site_visit_segments("Plant A", "3/14/23", &[("pH", "15"), ("Chloride", "45")]),
    );
    let mut fx = Fixture::new(canned);
    let paths = vec![fx.file("visit.pdf")];

    let summary =
        ingest_documents(&paths, &fx.registry, &fx.normalizer, &mut fx.store).unwrap();
    assert_eq!(summary.records_inserted, 1);
    assert_eq!(summary.quarantined_count(FailureKind::InvalidValue), 1);

    let entries = fx
        .store
        .list_quarantine(Some(FailureKind::InvalidValue))
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].raw_fields.contains("15"));
}

#[test]
fn test_unknown_table_column_quarantined_once() {
    // A field-log table with a column the vocabulary does not know.
    let mut canned = HashMap::new();
    canned.insert(
        "log".to_string(),
        vec![
            Segment::paragraph(0, "Facility: Plant A"),
            Segment::paragraph(1, "Date: 3/14/23"),
            Segment::table_row(2, &["GWT Names", "pH", "Turbidity (NTU)"]),
            Segment::table_row(3, &["Cold Dist", "7.5", "3"]),
        ],
    );
    let mut fx = Fixture::new(canned);
    let paths = vec![fx.file("log.docx")];

    let summary =
        ingest_documents(&paths, &fx.registry, &fx.normalizer, &mut fx.store).unwrap();
    assert_eq!(summary.records_inserted, 1);
    assert_eq!(summary.quarantined_count(FailureKind::UnknownParameter), 1);

    let entries = fx
        .store
        .list_quarantine(Some(FailureKind::UnknownParameter))
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].failure_detail.contains("Turbidity"));
}

#[test]
fn test_corrupt_document_does_not_abort_the_run() {
    let mut canned = HashMap::new();
    for i in 0..4 {
        canned.insert(
            format!("ok{i}"),
            site_visit_segments(&format!("Plant {i}"), "3/14/23", &[("pH", "7.5")]),
        );
    }
    // "broken" is absent from the canned map -> mock unreadable error
    let mut fx = Fixture::new(canned);
    let paths = vec![
        fx.file("ok0.pdf"),
        fx.file("ok1.pdf"),
        fx.file("broken.pdf"),
        fx.file("ok2.pdf"),
        fx.file("ok3.pdf"),
    ];

    let summary =
        ingest_documents(&paths, &fx.registry, &fx.normalizer, &mut fx.store).unwrap();
    assert_eq!(summary.documents_read, 4);
    assert_eq!(summary.documents_failed, 1);
    assert_eq!(summary.records_inserted, 4);
    assert!(summary.has_document_failures());
    assert_eq!(summary.document_failures.len(), 1);
    assert!(summary.document_failures[0].document.contains("broken"));
    assert_eq!(summary.document_failures[0].kind, "unreadable_document");
}

#[test]
fn test_low_yield_document_flagged() {
    let mut canned = HashMap::new();
    canned.insert(
        "narrative".to_string(),
        vec![Segment::paragraph(0, "General comments, nothing tabular.")],
    );
    let mut fx = Fixture::new(canned);
    let paths = vec![fx.file("narrative.pdf")];

    let summary =
        ingest_documents(&paths, &fx.registry, &fx.normalizer, &mut fx.store).unwrap();
    assert_eq!(summary.documents_read, 1);
    assert_eq!(summary.documents_failed, 0);
    assert_eq!(summary.low_yield_documents, vec!["narrative.pdf"]);
}

#[test]
fn test_unsupported_extension_is_document_failure() {
    let canned = HashMap::new();
    let mut fx = Fixture::new(canned);
    let paths = vec![fx.file("notes.txt")];

    let summary =
        ingest_documents(&paths, &fx.registry, &fx.normalizer, &mut fx.store).unwrap();
    assert_eq!(summary.documents_failed, 1);
    assert_eq!(summary.document_failures[0].kind, "unsupported_format");
}
