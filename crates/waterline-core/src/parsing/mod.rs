pub mod rules;
pub mod values;

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{CandidateRecord, RawDocument, Segment, SegmentKind};
use rules::{LayoutRule, RuleAction, Vintage};

/// Everything the parser extracted from one document.
pub struct ParsedDocument {
    pub vintage: Vintage,
    pub candidates: Vec<CandidateRecord>,
    /// Segments that matched a rule but lacked required sub-fields.
    /// Skipped and logged, never fatal.
    pub malformed_segments: u64,
}

/// Document-level context accumulated while scanning segments.
#[derive(Default)]
struct DocContext {
    facility: Option<String>,
    date_raw: Option<String>,
    system: Option<String>,
    /// Parameter columns of the current measurement table, with any unit
    /// split off a "(unit)" suffix in the header cell.
    columns: Option<Vec<(String, Option<String>)>>,
    /// Set by a bare banner line; the next paragraph is the facility name.
    expect_facility: bool,
}

/// One extracted data point before document context is attached.
struct DataPoint {
    parameter: String,
    value: String,
    unit: Option<String>,
    system: Option<String>,
}

/// Apply the vintage's layout rules to the segment sequence and emit
/// candidate records. Unmatched segments are dropped (logged at debug).
pub fn parse_document(doc: &RawDocument, segments: &[Segment]) -> ParsedDocument {
    let vintage = rules::detect_vintage(doc.format, segments);
    let rule_set = rules::rule_set_for(vintage);
    let source_ref = doc.source_ref();
    let fallback_date = date_from_filename(&source_ref);
    let fallback_site = file_stem(&source_ref);

    let mut ctx = DocContext::default();
    let mut candidates = Vec::new();
    let mut malformed = 0u64;

    for seg in segments {
        if ctx.expect_facility && seg.kind == SegmentKind::Paragraph {
            ctx.expect_facility = false;
            let text = seg.text.trim();
            if !text.is_empty() {
                ctx.facility = Some(text.to_string());
                continue;
            }
        }

        let Some(rule) = rule_set.rules.iter().find(|r| r.matches(seg)) else {
            tracing::debug!(
                document = %source_ref,
                segment = seg.index,
                "segment matched no layout rule, dropped"
            );
            continue;
        };

        match apply_rule(rule, seg, &mut ctx) {
            Ok(points) => {
                for point in points {
                    candidates.push(build_candidate(
                        &ctx,
                        point,
                        &source_ref,
                        fallback_date.as_deref(),
                        &fallback_site,
                    ));
                }
            }
            Err(reason) => {
                malformed += 1;
                tracing::warn!(
                    document = %source_ref,
                    segment = seg.index,
                    rule = rule.name,
                    %reason,
                    "malformed segment skipped"
                );
            }
        }
    }

    ParsedDocument {
        vintage,
        candidates,
        malformed_segments: malformed,
    }
}

fn apply_rule(
    rule: &LayoutRule,
    seg: &Segment,
    ctx: &mut DocContext,
) -> Result<Vec<DataPoint>, String> {
    match rule.action {
        RuleAction::Facility => {
            ctx.facility = capture(rule, seg, "value");
            Ok(vec![])
        }
        RuleAction::FacilityBanner => {
            match capture(rule, seg, "value") {
                Some(name) => ctx.facility = Some(name),
                None => ctx.expect_facility = true,
            }
            Ok(vec![])
        }
        RuleAction::ReportDate => {
            ctx.date_raw = capture(rule, seg, "value");
            Ok(vec![])
        }
        RuleAction::SystemBlock => {
            ctx.system = capture(rule, seg, "value");
            Ok(vec![])
        }
        RuleAction::LabeledMetric => {
            let caps = rule
                .pattern
                .captures(&seg.text)
                .ok_or_else(|| "rule matched but captured nothing".to_string())?;
            let parameter = caps["param"].trim().to_string();
            let rest = caps.name("rest").map(|m| m.as_str().trim()).unwrap_or("");
            if rest.is_empty() {
                return Err(format!("parameter row '{parameter}' has no value token"));
            }
            let (value, unit) = match rest.split_once(char::is_whitespace) {
                Some((v, u)) => (v.to_string(), Some(u.trim().to_string())),
                None => (rest.to_string(), None),
            };
            Ok(vec![DataPoint {
                parameter,
                value,
                unit: unit.filter(|u| !u.is_empty()),
                system: None,
            }])
        }
        RuleAction::GapMetric => {
            let cols = split_by_gaps(&seg.text);
            if cols.len() < 2 {
                return Err("parameter row has no value column".to_string());
            }
            Ok(vec![DataPoint {
                parameter: cols[0].trim().to_string(),
                value: cols[1].trim().to_string(),
                unit: cols.get(2).map(|u| u.trim().to_string()),
                system: None,
            }])
        }
        RuleAction::TableHeader => {
            let cells: Vec<&str> = seg.text.split('\t').collect();
            ctx.columns = Some(
                cells[1..]
                    .iter()
                    .map(|c| split_column_header(c))
                    .collect(),
            );
            Ok(vec![])
        }
        RuleAction::TableData => {
            let Some(columns) = ctx.columns.clone() else {
                // Rows before the header carry no column mapping; drop them
                // like any unmatched segment.
                return Ok(vec![]);
            };
            let cells: Vec<&str> = seg.text.split('\t').collect();
            let system = cells[0].trim();
            if system.is_empty() {
                return Ok(vec![]);
            }
            let mut points = Vec::new();
            for (i, (name, unit)) in columns.iter().enumerate() {
                let Some(cell) = cells.get(i + 1) else { break };
                let value = cell.trim();
                if value.is_empty() {
                    continue;
                }
                points.push(DataPoint {
                    parameter: name.clone(),
                    value: value.to_string(),
                    unit: unit.clone(),
                    system: Some(system.to_string()),
                });
            }
            if points.is_empty() {
                return Err(format!("data row for '{system}' has no value cells"));
            }
            Ok(points)
        }
    }
}

fn build_candidate(
    ctx: &DocContext,
    point: DataPoint,
    source_ref: &str,
    fallback_date: Option<&str>,
    fallback_site: &str,
) -> CandidateRecord {
    let facility = ctx.facility.as_deref().unwrap_or(fallback_site);
    let system = point.system.as_deref().or(ctx.system.as_deref());
    let site_identifier_raw = match system {
        Some(system) => format!("{facility}/{system}"),
        None => facility.to_string(),
    };
    CandidateRecord {
        report_date_raw: ctx
            .date_raw
            .clone()
            .or_else(|| fallback_date.map(|d| d.to_string())),
        site_identifier_raw,
        parameter_name_raw: point.parameter,
        value_raw: point.value,
        unit_raw: point.unit,
        source_document_ref: source_ref.to_string(),
    }
}

fn capture(rule: &LayoutRule, seg: &Segment, group: &str) -> Option<String> {
    rule.pattern
        .captures(&seg.text)
        .and_then(|c| c.name(group))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Split a line by gaps of 2+ whitespace characters (pdftotext -layout
/// preserves column alignment this way).
fn split_by_gaps(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = None;
    let mut gap_start = 0;
    let mut space_count = 0;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if space_count == 0 {
                // Byte offset, not i - 1: whitespace may be multi-byte
                // (pdftotext emits non-breaking spaces in aligned columns)
                gap_start = i;
            }
            space_count += 1;
            if space_count == 2 {
                if let Some(s) = start {
                    segments.push(&line[s..gap_start]);
                    start = None;
                }
            }
        } else {
            if start.is_none() {
                start = Some(i);
            }
            space_count = 0;
        }
    }

    if let Some(s) = start {
        segments.push(&line[s..]);
    }

    segments
}

/// "P Alkalinity (mg/L)" -> ("P Alkalinity", Some("mg/L"))
fn split_column_header(header: &str) -> (String, Option<String>) {
    let header = header.trim();
    if let Some(idx) = header.rfind('(') {
        if header.ends_with(')') {
            let name = header[..idx].trim_end();
            let unit = header[idx + 1..header.len() - 1].trim();
            if !name.is_empty() && !unit.is_empty() {
                return (name.to_string(), Some(unit.to_string()));
            }
        }
    }
    (header.to_string(), None)
}

static FILENAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{1,2}-\d{1,2})|(\d{1,2}[-_.]\d{1,2}[-_.]\d{2,4})")
        .expect("valid filename date pattern")
});

/// Legacy reports often carry the visit date only in the filename
/// ("Giant City 3-14-23.pdf").
fn date_from_filename(name: &str) -> Option<String> {
    FILENAME_DATE
        .find(name)
        .map(|m| m.as_str().replace(['_', '.'], "-"))
}

fn file_stem(name: &str) -> String {
    let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name);
    stem.trim().to_string()
}
