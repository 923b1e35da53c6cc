use std::path::{Path, PathBuf};

use waterline_core::error::WaterlineError;
use waterline_core::extraction::ReaderRegistry;
use waterline_core::normalize::Normalizer;
use waterline_core::store::MeasurementStore;
use waterline_core::vocab;

use crate::output;

pub fn run(
    inputs: Vec<PathBuf>,
    db: &Path,
    vocab_file: Option<PathBuf>,
    output_format: &str,
) -> Result<i32, WaterlineError> {
    let vocabulary = match vocab_file {
        Some(path) => vocab::load_vocabulary(&path)?,
        None => vocab::builtin::load_preset("standard")?,
    };
    let normalizer = Normalizer::new(&vocabulary);
    let readers = ReaderRegistry::default();
    let mut store = MeasurementStore::open(db)?;

    let paths = expand_inputs(&inputs)?;
    if paths.is_empty() {
        eprintln!("No .pdf or .docx files found in the given inputs");
        return Ok(1);
    }

    let summary = waterline_core::ingest_documents(&paths, &readers, &normalizer, &mut store)?;

    match output_format {
        "json" => output::json::print(&summary)?,
        _ => output::table::print_summary(&summary),
    }

    // Per-document failures are recoverable but the exit code must still
    // tell a calling script something went unprocessed.
    Ok(if summary.has_document_failures() { 1 } else { 0 })
}

/// Expand directories into their .pdf/.docx files (sorted, non-recursive
/// entries first); plain file paths pass through untouched so an explicit
/// argument with a wrong extension still reaches the pipeline and is
/// reported as unsupported.
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, WaterlineError> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(input)? {
                let path = entry?.path();
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_ascii_lowercase());
                if matches!(ext.as_deref(), Some("pdf") | Some("docx")) {
                    found.push(path);
                }
            }
            found.sort();
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_inputs_scans_directories() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.docx", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let paths = expand_inputs(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.docx", "b.pdf"]);
    }

    #[test]
    fn test_expand_inputs_passes_files_through() {
        let paths = expand_inputs(&[PathBuf::from("report.txt")]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("report.txt")]);
    }
}
