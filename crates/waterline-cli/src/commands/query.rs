use std::path::Path;

use chrono::NaiveDate;

use waterline_core::error::WaterlineError;
use waterline_core::store::{MeasurementFilter, MeasurementStore};

use crate::output;

pub fn run(
    db: &Path,
    site: Option<String>,
    parameter: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    output_format: &str,
) -> Result<i32, WaterlineError> {
    let store = MeasurementStore::open(db)?;
    let filter = MeasurementFilter {
        site,
        parameter_code: parameter,
        from,
        to,
    };
    let measurements = store.query_measurements(&filter)?;

    match output_format {
        "json" => output::json::print(&measurements)?,
        _ => output::table::print_measurements(&measurements),
    }
    Ok(0)
}
