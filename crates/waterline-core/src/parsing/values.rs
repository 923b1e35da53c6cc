use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// A lexed reading from a report cell or line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Measured(Decimal),
    /// "< 0.5" style below-detection-limit readings; carries the limit.
    BelowDetection(Decimal),
}

impl RawValue {
    /// The numeric value (the measurement or the detection limit).
    pub fn numeric(&self) -> Decimal {
        match self {
            RawValue::Measured(v) => *v,
            RawValue::BelowDetection(v) => *v,
        }
    }

    pub fn is_below_detection(&self) -> bool {
        matches!(self, RawValue::BelowDetection(_))
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Measured(v) => write!(f, "{v}"),
            RawValue::BelowDetection(v) => write!(f, "< {v}"),
        }
    }
}

/// Parse a value string from a report into a RawValue.
///
/// Handles formats like:
/// - "7.5" -> Measured(7.5)
/// - "1,250" -> Measured(1250) (thousands separator)
/// - "< 0.5" / "<0.5" -> BelowDetection(0.5)
/// - "", "-", "*", "—" are absent-value markers (returns None)
///
/// Non-numeric readings ("OK", "Light Orange") are errors; the caller
/// quarantines them rather than dropping them.
pub fn parse_value(s: &str) -> Result<Option<RawValue>, String> {
    let s = s.trim();

    if s.is_empty() || s == "-" || s == "*" || s == "—" || s.eq_ignore_ascii_case("n/a") {
        return Ok(None);
    }

    if let Some(rest) = s.strip_prefix('<') {
        let decimal = parse_decimal(rest.trim())?;
        return Ok(Some(RawValue::BelowDetection(decimal)));
    }

    let decimal = parse_decimal(s)?;
    Ok(Some(RawValue::Measured(decimal)))
}

/// Parse a decimal, tolerating thousands separators ("1,250") and a bare
/// comma decimal point ("7,5") as found in older hand-typed reports.
fn parse_decimal(s: &str) -> Result<Decimal, String> {
    let s = s.trim();
    if let Ok(d) = Decimal::from_str(s) {
        return Ok(d);
    }
    // "1,250" -> 1250 ; "7,5" -> 7.5
    let candidate = if s.matches(',').count() == 1 && !s.contains('.') {
        let (head, tail) = s.split_once(',').unwrap_or((s, ""));
        if tail.len() == 3 && tail.chars().all(|c| c.is_ascii_digit()) {
            format!("{head}{tail}")
        } else {
            s.replace(',', ".")
        }
    } else {
        s.replace(',', "")
    };
    Decimal::from_str(&candidate).map_err(|e| format!("invalid number '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_measured_integer() {
        let v = parse_value("1200").unwrap().unwrap();
        assert_eq!(v, RawValue::Measured(dec!(1200)));
    }

    #[test]
    fn test_measured_decimal() {
        let v = parse_value("7.5").unwrap().unwrap();
        assert_eq!(v, RawValue::Measured(dec!(7.5)));
    }

    #[test]
    fn test_thousands_separator() {
        let v = parse_value("1,250").unwrap().unwrap();
        assert_eq!(v, RawValue::Measured(dec!(1250)));
    }

    #[test]
    fn test_comma_decimal_point() {
        let v = parse_value("7,5").unwrap().unwrap();
        assert_eq!(v, RawValue::Measured(dec!(7.5)));
    }

    #[test]
    fn test_below_detection_with_space() {
        let v = parse_value("< 0.5").unwrap().unwrap();
        assert_eq!(v, RawValue::BelowDetection(dec!(0.5)));
        assert!(v.is_below_detection());
    }

    #[test]
    fn test_below_detection_no_space() {
        let v = parse_value("<0.5").unwrap().unwrap();
        assert_eq!(v, RawValue::BelowDetection(dec!(0.5)));
    }

    #[test]
    fn test_absent_markers_return_none() {
        assert!(parse_value("").unwrap().is_none());
        assert!(parse_value("-").unwrap().is_none());
        assert!(parse_value("*").unwrap().is_none());
        assert!(parse_value("N/A").unwrap().is_none());
    }

    #[test]
    fn test_non_numeric_reading_is_error() {
        assert!(parse_value("OK").is_err());
        assert!(parse_value("Light Orange").is_err());
    }

    #[test]
    fn test_numeric_accessor() {
        assert_eq!(parse_value("< 2").unwrap().unwrap().numeric(), dec!(2));
        assert_eq!(parse_value("2").unwrap().unwrap().numeric(), dec!(2));
    }
}
