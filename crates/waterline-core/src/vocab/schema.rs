use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parameter vocabulary: the canonical catalogue of measurable water
/// parameters, their units, and plausibility ranges. Loaded from JSON so
/// operators can extend it without recompiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub parameters: Vec<ParameterDef>,
}

/// One canonical parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Stable canonical code, e.g. "conductivity".
    pub code: String,
    /// The unit all stored values are expressed in.
    pub canonical_unit: String,
    /// Spellings that mean the canonical unit (factor 1).
    #[serde(default)]
    pub unit_aliases: Vec<String>,
    /// Convertible units: multiply the value by the factor to reach the
    /// canonical unit. Units absent here (and from the aliases) are
    /// incompatible.
    #[serde(default)]
    pub conversions: BTreeMap<String, Decimal>,
    /// Physical plausibility bounds in the canonical unit, inclusive.
    #[serde(default)]
    pub range: Option<PhysicalRange>,
    /// Names and abbreviations the reports use for this parameter.
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalRange {
    pub min: Decimal,
    pub max: Decimal,
}
