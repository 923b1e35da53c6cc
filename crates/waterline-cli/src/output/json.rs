use serde::Serialize;
use waterline_core::error::WaterlineError;

pub fn print<T: Serialize>(value: &T) -> Result<(), WaterlineError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
