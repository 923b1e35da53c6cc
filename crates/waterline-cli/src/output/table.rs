use waterline_core::model::{Measurement, RunSummary};
use waterline_core::store::QuarantineEntry;
use waterline_core::vocab::VocabularyDef;

pub fn print_summary(summary: &RunSummary) {
    println!("Ingestion summary:\n");
    println!("  Documents read:        {}", summary.documents_read);
    println!("  Documents failed:      {}", summary.documents_failed);
    println!("  Records extracted:     {}", summary.records_extracted);
    println!("  Records inserted:      {}", summary.records_inserted);
    println!("  Duplicates skipped:    {}", summary.records_duplicate);
    println!("  Records quarantined:   {}", summary.records_quarantined);
    println!("  Malformed segments:    {}", summary.malformed_segments);

    if !summary.quarantined_by_kind.is_empty() {
        println!("\n  Quarantined by kind:");
        for (kind, count) in &summary.quarantined_by_kind {
            println!("    {:<26} {}", kind.as_str(), count);
        }
    }

    if !summary.low_yield_documents.is_empty() {
        println!("\n  Documents with no extractable records:");
        for doc in &summary.low_yield_documents {
            println!("    {doc}");
        }
    }

    if !summary.document_failures.is_empty() {
        println!("\n  Failed documents:");
        for failure in &summary.document_failures {
            println!("    {} ({})", failure.document, failure.kind);
            println!("      {}", failure.message);
        }
    }
}

pub fn print_measurements(measurements: &[Measurement]) {
    if measurements.is_empty() {
        println!("No measurements match the given filters.");
        return;
    }

    let site_width = measurements
        .iter()
        .map(|m| m.site_identifier.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let param_width = measurements
        .iter()
        .map(|m| m.parameter_code.len())
        .max()
        .unwrap_or(9)
        .max(9);

    println!(
        "{:<site_width$}  {:<10}  {:<param_width$}  {:>12}  {:<8}  Source",
        "Site", "Date", "Parameter", "Value", "Unit"
    );
    for m in measurements {
        println!(
            "{:<site_width$}  {:<10}  {:<param_width$}  {:>12}  {:<8}  {}",
            m.site_identifier, m.report_date, m.parameter_code, m.value, m.unit,
            m.source_document_ref
        );
    }
    println!("\n{} measurement(s)", measurements.len());
}

pub fn print_quarantine(entries: &[QuarantineEntry]) {
    if entries.is_empty() {
        println!("Quarantine is empty.");
        return;
    }

    for entry in entries {
        println!(
            "#{} [{}] {}",
            entry.id, entry.failure_kind, entry.source_document_ref
        );
        println!("    {}", entry.failure_detail);
        println!("    raw: {}", entry.raw_fields);
        println!();
    }
    println!("{} quarantined record(s)", entries.len());
}

pub fn print_vocabulary(vocab: &VocabularyDef) {
    println!("{} (v{})\n", vocab.name, vocab.version);
    if let Some(ref desc) = vocab.description {
        println!("{desc}\n");
    }

    let code_width = vocab
        .parameters
        .iter()
        .map(|p| p.code.len())
        .max()
        .unwrap_or(9)
        .max(9);

    println!(
        "{:<code_width$}  {:<8}  {:<14}  Synonyms",
        "Parameter", "Unit", "Range"
    );
    for param in &vocab.parameters {
        let range = match &param.range {
            Some(r) => format!("{}..={}", r.min, r.max),
            None => "-".to_string(),
        };
        println!(
            "{:<code_width$}  {:<8}  {:<14}  {}",
            param.code,
            param.canonical_unit,
            range,
            param.synonyms.join(", ")
        );
    }
}
