//! Coercion of loosely typed export values.
//!
//! The fidelity export was produced by an Italian point-of-sale system: amounts
//! use a comma as decimal separator (and sometimes dots as thousands
//! separators), counts and flags are strings, dates are compact `YYYYMMDD`.
//! The same field may also arrive as a JSON number or boolean depending on the
//! exporter version, so every function here accepts any [`Value`].
//!
//! None of these functions fail: unusable input becomes the type's default
//! (`0.0`, `0`, `false`, `""`).

use chrono::NaiveDate;
use serde_json::Value;

/// Convert an amount to `f64`.
///
/// - `"1980,53"` and `"1.980,53"` → `1980.53`
/// - `"100.01"` → `100.01` (no comma: the dot is the decimal separator)
/// - JSON numbers pass through
/// - empty, non-numeric and non-finite input → `0.0`
#[must_use]
pub fn parse_decimal(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Value::String(s) => try_decimal(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse an Italian-locale decimal string, `None` if it is not a finite number.
#[must_use]
pub fn try_decimal(s: &str) -> Option<f64> {
    let compact: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\''))
        .collect();

    if compact.is_empty() {
        return None;
    }

    let canonical = if compact.contains(',') {
        compact.replace('.', "").replace(',', ".")
    } else {
        compact
    };

    canonical.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Convert a count (bollini, children, household size) to `i64`.
///
/// Integral decimals such as `"25,0"` are accepted; fractional, empty and
/// invalid input → `0`.
#[must_use]
pub fn parse_count(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| try_decimal(trimmed).and_then(integral))
        }
        _ => None,
    }
    .unwrap_or(0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Convert a flag to `bool`.
///
/// `"1"`, `1`, `1.0` and `true` are set, as are the spellings `si`/`sì`/`s`/`y`/
/// `yes`/`true` in any case. `"0"`, absent, `null` and anything else are unset.
#[must_use]
pub fn parse_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n
            .as_f64()
            .is_some_and(|f| (f - 1.0).abs() < f64::EPSILON),
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "si" | "sì" | "s" | "y" | "yes"
        ),
        _ => false,
    }
}

/// Convert a date to `YYYY-MM-DD`.
///
/// Accepts the export's `YYYYMMDD` (string or number), ISO `YYYY-MM-DD` and
/// `DD/MM/YYYY`. Anything else, including the `00000000` placeholder, → `""`.
#[must_use]
pub fn parse_date(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => return String::new(),
    };

    parse_date_str(&text).map_or_else(String::new, |date| date.format("%Y-%m-%d").to_string())
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s.get(0..4)?.parse::<i32>().ok()?;
        let month = s.get(4..6)?.parse::<u32>().ok()?;
        let day = s.get(6..8)?.parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

/// Convert a text field to a trimmed `String`.
///
/// Numbers are rendered without a trailing `.0`, since card numbers and postal
/// codes occasionally arrive as JSON numbers.
#[must_use]
pub fn parse_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|i| i.to_string())
            .or_else(|| n.as_u64().map(|u| u.to_string()))
            .or_else(|| n.as_f64().and_then(integral).map(|i| i.to_string()))
            .unwrap_or_else(|| n.to_string()),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_decimal_comma_notation() {
        assert!(approx(parse_decimal(&json!("1980,53")), 1980.53));
        assert!(approx(parse_decimal(&json!("1.980,53")), 1980.53));
        assert!(approx(parse_decimal(&json!("100,01")), 100.01));
        assert!(approx(parse_decimal(&json!("0,5")), 0.5));
        assert!(approx(parse_decimal(&json!("-12,30")), -12.3));
    }

    #[test]
    fn test_decimal_matches_replace_then_parse() {
        for raw in ["0,01", "7,5", "123456,78", "3,14159", "42"] {
            let expected: f64 = raw.replace(',', ".").parse().unwrap_or_default();
            assert!(approx(parse_decimal(&json!(raw)), expected), "{raw}");
        }
    }

    #[test]
    fn test_decimal_dot_notation_and_numbers() {
        assert!(approx(parse_decimal(&json!("100.01")), 100.01));
        assert!(approx(parse_decimal(&json!(12.5)), 12.5));
        assert!(approx(parse_decimal(&json!(3)), 3.0));
        assert!(approx(parse_decimal(&json!("1 980,53")), 1980.53));
    }

    #[test]
    fn test_decimal_defaults() {
        assert!(approx(parse_decimal(&json!("")), 0.0));
        assert!(approx(parse_decimal(&json!("   ")), 0.0));
        assert!(approx(parse_decimal(&json!("n/d")), 0.0));
        assert!(approx(parse_decimal(&json!("NaN")), 0.0));
        assert!(approx(parse_decimal(&json!("inf")), 0.0));
        assert!(approx(parse_decimal(&json!("1,2,3")), 0.0));
        assert!(approx(parse_decimal(&Value::Null), 0.0));
        assert!(approx(parse_decimal(&json!(true)), 0.0));
    }

    #[test]
    fn test_count() {
        assert_eq!(parse_count(&json!("25")), 25);
        assert_eq!(parse_count(&json!(" 3 ")), 3);
        assert_eq!(parse_count(&json!(7)), 7);
        assert_eq!(parse_count(&json!("25,0")), 25);
        assert_eq!(parse_count(&json!(4.0)), 4);
    }

    #[test]
    fn test_count_defaults() {
        assert_eq!(parse_count(&json!("")), 0);
        assert_eq!(parse_count(&json!("abc")), 0);
        assert_eq!(parse_count(&json!("2,5")), 0);
        assert_eq!(parse_count(&Value::Null), 0);
        assert_eq!(parse_count(&json!(1e300)), 0);
    }

    #[test]
    fn test_flag() {
        assert!(parse_flag(Some(&json!("1"))));
        assert!(!parse_flag(Some(&json!("0"))));
        assert!(!parse_flag(None));
        assert!(!parse_flag(Some(&Value::Null)));
        assert!(parse_flag(Some(&json!(1))));
        assert!(!parse_flag(Some(&json!(0))));
        assert!(parse_flag(Some(&json!(true))));
        assert!(parse_flag(Some(&json!(1.0))));
        assert!(!parse_flag(Some(&json!(0.0))));
        assert!(!parse_flag(Some(&json!(2))));
        assert!(parse_flag(Some(&json!("S"))));
        assert!(parse_flag(Some(&json!("Sì"))));
        assert!(!parse_flag(Some(&json!("N"))));
        assert!(!parse_flag(Some(&json!(""))));
    }

    #[test]
    fn test_date() {
        assert_eq!(parse_date(&json!("19850412")), "1985-04-12");
        assert_eq!(parse_date(&json!(20231231)), "2023-12-31");
        assert_eq!(parse_date(&json!("2023-12-31")), "2023-12-31");
        assert_eq!(parse_date(&json!("31/12/2023")), "2023-12-31");
    }

    #[test]
    fn test_date_defaults() {
        assert_eq!(parse_date(&json!("")), "");
        assert_eq!(parse_date(&json!("00000000")), "");
        assert_eq!(parse_date(&json!("20230231")), "");
        assert_eq!(parse_date(&json!("ieri")), "");
        assert_eq!(parse_date(&Value::Null), "");
    }

    #[test]
    fn test_text() {
        assert_eq!(parse_text(Some(&json!("  ROSSI "))), "ROSSI");
        assert_eq!(parse_text(Some(&json!(2_020_000_028_284_u64))), "2020000028284");
        assert_eq!(parse_text(Some(&json!(20121.0))), "20121");
        assert_eq!(parse_text(Some(&Value::Null)), "");
        assert_eq!(parse_text(None), "");
    }
}
