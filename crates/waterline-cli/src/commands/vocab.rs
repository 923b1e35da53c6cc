use std::path::Path;

use waterline_core::error::WaterlineError;
use waterline_core::vocab::{self, builtin};

use crate::output;

pub fn list() -> Result<i32, WaterlineError> {
    println!("Available vocabularies:\n");
    for name in builtin::PRESETS {
        let vocab = builtin::load_preset(name)?;
        println!(
            "  {:<10} v{} ({} parameters)",
            name,
            vocab.version,
            vocab.parameters.len()
        );
        if let Some(ref desc) = vocab.description {
            println!("             {}", desc);
        }
        println!();
    }
    Ok(0)
}

pub fn show(preset: &str) -> Result<i32, WaterlineError> {
    let vocab = builtin::load_preset(preset)?;
    output::table::print_vocabulary(&vocab);
    Ok(0)
}

pub fn validate(file: &Path) -> Result<i32, WaterlineError> {
    let vocab = vocab::load_vocabulary(file)?;
    println!(
        "OK: '{}' (v{}) defines {} parameters",
        vocab.name,
        vocab.version,
        vocab.parameters.len()
    );
    Ok(0)
}
