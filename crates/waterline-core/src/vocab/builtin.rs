use crate::error::WaterlineError;
use crate::vocab::schema::VocabularyDef;

/// The built-in vocabulary covering the parameters seen across the legacy
/// report corpus.
const STANDARD_JSON: &str = include_str!("../../../../vocab/standard.json");

pub const PRESETS: &[&str] = &["standard"];

pub fn load_preset(name: &str) -> Result<VocabularyDef, WaterlineError> {
    let json = match name {
        "standard" => STANDARD_JSON,
        _ => {
            return Err(WaterlineError::VocabularyInvalid(format!(
                "unknown vocabulary preset '{name}' (available: {})",
                PRESETS.join(", ")
            )))
        }
    };
    crate::vocab::parse_vocabulary_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_preset_loads_and_validates() {
        let vocab = load_preset("standard").unwrap();
        assert_eq!(vocab.name, "standard");
        assert!(vocab.parameters.iter().any(|p| p.code == "ph"));
        assert!(vocab.parameters.iter().any(|p| p.code == "conductivity"));
    }

    #[test]
    fn test_unknown_preset_rejected() {
        assert!(load_preset("nope").is_err());
    }
}
