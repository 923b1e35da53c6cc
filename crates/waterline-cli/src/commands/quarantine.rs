use std::path::Path;

use waterline_core::error::WaterlineError;
use waterline_core::model::FailureKind;
use waterline_core::store::MeasurementStore;

use crate::output;

pub fn run(db: &Path, kind: Option<String>, output_format: &str) -> Result<i32, WaterlineError> {
    let kind = match kind {
        Some(s) => Some(
            FailureKind::parse(&s).ok_or_else(|| WaterlineError::UnknownFailureKind(s.clone()))?,
        ),
        None => None,
    };

    let store = MeasurementStore::open(db)?;
    let entries = store.list_quarantine(kind)?;

    match output_format {
        "json" => output::json::print(&entries)?,
        _ => output::table::print_quarantine(&entries),
    }
    Ok(0)
}
