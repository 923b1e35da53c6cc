use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::{CandidateRecord, CanonicalRecord, FailureKind};
use crate::parsing::values;
use crate::vocab::VocabularyDef;

/// Why a candidate could not be normalized. Carries enough detail for the
/// quarantine table to be actionable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl NormalizeFailure {
    fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        NormalizeFailure {
            kind,
            detail: detail.into(),
        }
    }
}

struct ParameterEntry {
    code: String,
    canonical_unit: String,
    /// Canonicalized unit spelling -> multiplier to the canonical unit.
    unit_factors: HashMap<String, Decimal>,
    range: Option<(Decimal, Decimal)>,
}

/// Turns candidate records into canonical ones against a vocabulary.
/// Pure: same candidate in, same canonical record (or failure) out.
pub struct Normalizer {
    parameters: Vec<ParameterEntry>,
    /// Canonicalized parameter name -> index into `parameters`.
    synonym_index: HashMap<String, usize>,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%m-%d-%Y", "%m-%d-%y"];

impl Normalizer {
    pub fn new(vocab: &VocabularyDef) -> Self {
        let mut parameters = Vec::with_capacity(vocab.parameters.len());
        let mut synonym_index = HashMap::new();

        for (idx, param) in vocab.parameters.iter().enumerate() {
            let mut unit_factors = HashMap::new();
            unit_factors.insert(canonicalize_unit(&param.canonical_unit), Decimal::ONE);
            for alias in &param.unit_aliases {
                unit_factors.insert(canonicalize_unit(alias), Decimal::ONE);
            }
            for (unit, factor) in &param.conversions {
                unit_factors.insert(canonicalize_unit(unit), *factor);
            }

            synonym_index.insert(canonicalize_parameter_name(&param.code), idx);
            for syn in &param.synonyms {
                synonym_index.insert(canonicalize_parameter_name(syn), idx);
            }

            parameters.push(ParameterEntry {
                code: param.code.clone(),
                canonical_unit: param.canonical_unit.clone(),
                unit_factors,
                range: param.range.as_ref().map(|r| (r.min, r.max)),
            });
        }

        Normalizer {
            parameters,
            synonym_index,
        }
    }

    pub fn normalize(
        &self,
        candidate: &CandidateRecord,
    ) -> Result<CanonicalRecord, NormalizeFailure> {
        let report_date = self.resolve_date(candidate)?;
        let param = self.resolve_parameter(candidate)?;
        let (raw, implied_unit) = self.resolve_value(candidate)?;
        let factor = self.resolve_unit(candidate, param, implied_unit)?;

        let value = (raw.numeric() * factor).normalize();

        if let Some((min, max)) = param.range {
            if value < min || value > max {
                return Err(NormalizeFailure::new(
                    FailureKind::InvalidValue,
                    format!(
                        "{} {} outside physical range {min}..={max} {}",
                        param.code, value, param.canonical_unit
                    ),
                ));
            }
        }

        Ok(CanonicalRecord {
            report_date,
            site_identifier: candidate.site_identifier_raw.trim().to_string(),
            parameter_code: param.code.clone(),
            value,
            unit: param.canonical_unit.clone(),
            source_document_ref: candidate.source_document_ref.clone(),
        })
    }

    fn resolve_date(&self, candidate: &CandidateRecord) -> Result<NaiveDate, NormalizeFailure> {
        let raw = candidate
            .report_date_raw
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                NormalizeFailure::new(FailureKind::InvalidValue, "report date missing")
            })?;

        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
                return Ok(date);
            }
        }
        Err(NormalizeFailure::new(
            FailureKind::InvalidValue,
            format!("unparseable report date '{raw}'"),
        ))
    }

    fn resolve_parameter(
        &self,
        candidate: &CandidateRecord,
    ) -> Result<&ParameterEntry, NormalizeFailure> {
        let key = canonicalize_parameter_name(&candidate.parameter_name_raw);
        self.synonym_index
            .get(&key)
            .map(|&idx| &self.parameters[idx])
            .ok_or_else(|| {
                NormalizeFailure::new(
                    FailureKind::UnknownParameter,
                    format!(
                        "parameter '{}' not in vocabulary",
                        candidate.parameter_name_raw.trim()
                    ),
                )
            })
    }

    /// Lex the raw value. A trailing "%" glued to the number ("42%") acts as
    /// an implied unit.
    fn resolve_value(
        &self,
        candidate: &CandidateRecord,
    ) -> Result<(values::RawValue, Option<&'static str>), NormalizeFailure> {
        let mut raw = candidate.value_raw.trim();
        let mut implied_unit = None;
        if let Some(stripped) = raw.strip_suffix('%') {
            raw = stripped.trim_end();
            implied_unit = Some("%");
        }

        match values::parse_value(raw) {
            Ok(Some(v)) => Ok((v, implied_unit)),
            Ok(None) => Err(NormalizeFailure::new(
                FailureKind::InvalidValue,
                format!("absent value marker '{}'", candidate.value_raw.trim()),
            )),
            Err(reason) => Err(NormalizeFailure::new(FailureKind::InvalidValue, reason)),
        }
    }

    fn resolve_unit(
        &self,
        candidate: &CandidateRecord,
        param: &ParameterEntry,
        implied_unit: Option<&str>,
    ) -> Result<Decimal, NormalizeFailure> {
        let unit = candidate
            .unit_raw
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .or(implied_unit);

        // Reports routinely omit the unit; the canonical one is assumed.
        let Some(unit) = unit else {
            return Ok(Decimal::ONE);
        };

        param
            .unit_factors
            .get(&canonicalize_unit(unit))
            .copied()
            .ok_or_else(|| {
                NormalizeFailure::new(
                    FailureKind::IncompatibleUnit,
                    format!(
                        "unit '{unit}' is not convertible to {} for {}",
                        param.canonical_unit, param.code
                    ),
                )
            })
    }
}

/// Collapse a parameter spelling to a lookup key: lowercase, trailing
/// dots stripped, separators folded to underscores.
pub fn canonicalize_parameter_name(name: &str) -> String {
    let lower = name.trim().trim_end_matches('.').to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut last_sep = false;
    for c in lower.chars() {
        if c == ' ' || c == '-' || c == '_' || c == '/' {
            if !last_sep && !out.is_empty() {
                out.push('_');
            }
            last_sep = true;
        } else {
            out.push(c);
            last_sep = false;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Collapse a unit spelling: lowercase, micro sign variants folded to "u",
/// internal whitespace removed.
pub fn canonicalize_unit(unit: &str) -> String {
    unit.trim()
        .to_lowercase()
        .replace(['µ', 'μ'], "u")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("")
}
