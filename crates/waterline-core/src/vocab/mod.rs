pub mod builtin;
pub mod schema;

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;

use crate::error::WaterlineError;
pub use schema::{ParameterDef, PhysicalRange, VocabularyDef};

/// Load and validate a vocabulary from a JSON file.
pub fn load_vocabulary(path: &Path) -> Result<VocabularyDef, WaterlineError> {
    let json = std::fs::read_to_string(path).map_err(|e| WaterlineError::VocabularyLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_vocabulary_str(&json)
}

/// Parse and validate a vocabulary from a JSON string.
pub fn parse_vocabulary_str(json: &str) -> Result<VocabularyDef, WaterlineError> {
    let vocab: VocabularyDef = serde_json::from_str(json)?;
    validate_vocabulary(&vocab)?;
    Ok(vocab)
}

/// Structural checks beyond what deserialization enforces.
pub fn validate_vocabulary(vocab: &VocabularyDef) -> Result<(), WaterlineError> {
    let invalid = |msg: String| Err(WaterlineError::VocabularyInvalid(msg));

    if vocab.parameters.is_empty() {
        return invalid(format!("vocabulary '{}' defines no parameters", vocab.name));
    }

    let mut codes = HashSet::new();
    let mut names = HashSet::new();
    for param in &vocab.parameters {
        if param.code.trim().is_empty() {
            return invalid("parameter with empty code".to_string());
        }
        if !codes.insert(param.code.as_str()) {
            return invalid(format!("duplicate parameter code '{}'", param.code));
        }
        if param.canonical_unit.trim().is_empty() {
            return invalid(format!("parameter '{}' has empty canonical unit", param.code));
        }
        if let Some(range) = &param.range {
            if range.min > range.max {
                return invalid(format!(
                    "parameter '{}' range min {} exceeds max {}",
                    param.code, range.min, range.max
                ));
            }
        }
        for (unit, factor) in &param.conversions {
            if *factor <= Decimal::ZERO {
                return invalid(format!(
                    "parameter '{}' conversion '{unit}' has non-positive factor {factor}",
                    param.code
                ));
            }
        }
        // A synonym pointing at two codes would make resolution ambiguous
        for syn in param.synonyms.iter().chain(std::iter::once(&param.code)) {
            let key = syn.trim().to_lowercase();
            if !names.insert(key) {
                return invalid(format!(
                    "name '{syn}' maps to more than one parameter (second: '{}')",
                    param.code
                ));
            }
        }
    }

    Ok(())
}
