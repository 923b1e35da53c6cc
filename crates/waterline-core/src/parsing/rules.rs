use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::model::{DocumentFormat, Segment, SegmentKind};

/// A distinguishable historical layout generation of the source reports.
/// Each vintage gets its own ordered rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vintage {
    /// PDF-era "SITE VISITATION REPORT" layouts: labeled metric lines and
    /// whitespace-aligned tables.
    SiteVisit,
    /// DOCX-era field logs: a measurement table with one column per
    /// parameter and one row per water system.
    FieldLog,
}

impl fmt::Display for Vintage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vintage::SiteVisit => write!(f, "site-visit"),
            Vintage::FieldLog => write!(f, "field-log"),
        }
    }
}

/// What a matched rule contributes: document context or data points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// "Facility: X" -> document context
    Facility,
    /// "SITE VISITATION REPORT" banner; the facility name follows on the
    /// banner line itself or the next paragraph
    FacilityBanner,
    /// "Date: X" -> document context
    ReportDate,
    /// "System: X" or a bare system block header -> row context
    SystemBlock,
    /// "pH: 7.5 SU" -> one candidate
    LabeledMetric,
    /// "pH      7.5      SU" (2+ space gaps) -> one candidate
    GapMetric,
    /// Table row naming the parameter columns
    TableHeader,
    /// Table row with a system name and one value cell per column
    TableData,
}

/// One layout extraction rule: a pattern plus a field mapping (the action).
/// Rules are data, tried in priority order; first match wins per segment.
pub struct LayoutRule {
    pub name: &'static str,
    /// Restrict the rule to one segment kind, or None for any.
    pub applies: Option<SegmentKind>,
    pub pattern: Regex,
    pub action: RuleAction,
}

impl LayoutRule {
    pub fn matches(&self, seg: &Segment) -> bool {
        if let Some(kind) = self.applies {
            if seg.kind != kind {
                return false;
            }
        }
        self.pattern.is_match(&seg.text)
    }
}

pub struct LayoutRuleSet {
    pub vintage: Vintage,
    pub rules: Vec<LayoutRule>,
}

/// Metric labels seen across the report corpus. Keeps the labeled/gap rules
/// from swallowing arbitrary "Label: value" lines (technician names,
/// signatures); unknown parameters still surface through table columns.
const METRIC_KEYWORDS: &str = "cond\\.?|conductivity|ph|temp(?:erature)?\\.?|max temp\\.?|\
p[ -]?alk(?:alinity)?|m[ -]?alk(?:alinity)?|total alkalinity|chloride|hardness|calcium|\
po4|phosphate|so2|sulfite|molybdate|mo|no2|nitrite|glycol|free chlorine|total chlorine|\
copper|iron|live atp";

fn rule(
    name: &'static str,
    applies: Option<SegmentKind>,
    pattern: &str,
    action: RuleAction,
) -> LayoutRule {
    LayoutRule {
        name,
        applies,
        pattern: Regex::new(pattern).expect("valid layout rule pattern"),
        action,
    }
}

static RULE_SETS: LazyLock<Vec<LayoutRuleSet>> = LazyLock::new(|| {
    let para = Some(SegmentKind::Paragraph);
    let row = Some(SegmentKind::TableRow);

    let site_visit = LayoutRuleSet {
        vintage: Vintage::SiteVisit,
        rules: vec![
            rule(
                "facility_label",
                para,
                r"(?i)^\s*(?:facility|site)\s*[:=]\s*(?P<value>.+)$",
                RuleAction::Facility,
            ),
            rule(
                "visit_banner",
                para,
                r"(?i)site visitation report\s*[:\-]?\s*(?P<value>.*)$",
                RuleAction::FacilityBanner,
            ),
            rule(
                "date_label",
                para,
                r"(?i)^\s*(?:date|sample date|visit date)\s*[:=]\s*(?P<value>.+)$",
                RuleAction::ReportDate,
            ),
            rule(
                "system_label",
                para,
                r"(?i)^\s*system(?: name)?\s*[:=]\s*(?P<value>.+)$",
                RuleAction::SystemBlock,
            ),
            rule(
                "labeled_metric",
                para,
                &format!(r"(?i)^\s*(?P<param>{METRIC_KEYWORDS})\s*[:=]\s*(?P<rest>.*)$"),
                RuleAction::LabeledMetric,
            ),
            rule(
                "gap_table_metric",
                para,
                &format!(r"(?i)^\s*(?P<param>{METRIC_KEYWORDS})\s{{2,}}(?P<rest>\S.*)$"),
                RuleAction::GapMetric,
            ),
            rule(
                "system_block_header",
                para,
                r"(?i)^\s*(?P<value>(?:cold|hot) dist\.?|cooling tower|chilled water system|closed loop heating system|city water|pool loop|recirc\.? domestic hot)\s*$",
                RuleAction::SystemBlock,
            ),
        ],
    };

    let field_log = LayoutRuleSet {
        vintage: Vintage::FieldLog,
        rules: vec![
            rule(
                "measurement_table_header",
                row,
                r"(?i)^(?:gwt names|system names?|distribution)[^\t]*\t",
                RuleAction::TableHeader,
            ),
            rule("measurement_table_row", row, r"\t", RuleAction::TableData),
            rule(
                "facility_label",
                para,
                r"(?i)^\s*(?:facility|site)\s*[:=]\s*(?P<value>.+)$",
                RuleAction::Facility,
            ),
            rule(
                "date_label",
                para,
                r"(?i)^\s*(?:date|sample date|visit date)\s*[:=]\s*(?P<value>.+)$",
                RuleAction::ReportDate,
            ),
            rule(
                "labeled_metric",
                para,
                &format!(r"(?i)^\s*(?P<param>{METRIC_KEYWORDS})\s*[:=]\s*(?P<rest>.*)$"),
                RuleAction::LabeledMetric,
            ),
        ],
    };

    vec![site_visit, field_log]
});

pub fn rule_set_for(vintage: Vintage) -> &'static LayoutRuleSet {
    RULE_SETS
        .iter()
        .find(|rs| rs.vintage == vintage)
        .expect("rule set exists for every vintage")
}

/// Detect the report vintage from header text in the leading segments,
/// falling back on the document format tag.
pub fn detect_vintage(format: DocumentFormat, segments: &[Segment]) -> Vintage {
    for seg in segments.iter().take(40) {
        let lower = seg.text.to_lowercase();
        if lower.contains("site visitation report") {
            return Vintage::SiteVisit;
        }
        if lower.contains("gwt names") {
            return Vintage::FieldLog;
        }
    }
    match format {
        DocumentFormat::Pdf => Vintage::SiteVisit,
        DocumentFormat::Docx => Vintage::FieldLog,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_vintage_by_banner() {
        let segs = vec![Segment::paragraph(0, "IWT   SITE VISITATION REPORT")];
        assert_eq!(
            detect_vintage(DocumentFormat::Docx, &segs),
            Vintage::SiteVisit
        );
    }

    #[test]
    fn test_detect_vintage_by_table_header() {
        let segs = vec![Segment::table_row(0, &["GWT Names", "pH"])];
        assert_eq!(
            detect_vintage(DocumentFormat::Pdf, &segs),
            Vintage::FieldLog
        );
    }

    #[test]
    fn test_detect_vintage_format_fallback() {
        assert_eq!(
            detect_vintage(DocumentFormat::Pdf, &[]),
            Vintage::SiteVisit
        );
        assert_eq!(
            detect_vintage(DocumentFormat::Docx, &[]),
            Vintage::FieldLog
        );
    }

    #[test]
    fn test_first_match_wins_order() {
        // "Cond.: 1200" must hit labeled_metric before gap_table_metric
        let rs = rule_set_for(Vintage::SiteVisit);
        let seg = Segment::paragraph(0, "Cond.: 1200");
        let hit = rs.rules.iter().find(|r| r.matches(&seg)).unwrap();
        assert_eq!(hit.name, "labeled_metric");
    }

    #[test]
    fn test_metric_keywords_do_not_swallow_labels() {
        let rs = rule_set_for(Vintage::SiteVisit);
        let seg = Segment::paragraph(0, "Technician: Albert Rios");
        assert!(rs.rules.iter().all(|r| !r.matches(&seg)));
    }

    #[test]
    fn test_table_rules_require_table_rows() {
        let rs = rule_set_for(Vintage::FieldLog);
        let para = Segment::paragraph(0, "GWT Names\tpH");
        assert!(!rs.rules[0].matches(&para));
        let row = Segment::table_row(0, &["GWT Names", "pH"]);
        assert!(rs.rules[0].matches(&row));
    }
}
