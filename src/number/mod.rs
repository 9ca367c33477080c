//! Locale-aware number parsing, rounding, and formatting.
//!
//! Every numeric value that crosses the boundary between user text and the
//! pricing engine goes through this module. Malformed input never produces an
//! error: it degrades to `0.0` and callers decide how to surface it.

pub mod expression;

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub use expression::evaluate_expression;

/// Absolute values above this bound are treated as typos and parse to zero.
pub const MAGNITUDE_LIMIT: f64 = 1e15;

/// Thousands/decimal separator convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    /// `1 234.56`
    #[default]
    Intl,
    /// `1,234.56`
    Latam,
    /// `1.234,56`
    Euro,
    /// `1234.56`
    Raw,
}

impl NumberFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            NumberFormat::Intl => "intl",
            NumberFormat::Latam => "latam",
            NumberFormat::Euro => "euro",
            NumberFormat::Raw => "raw",
        }
    }

    fn grouping_separator(self) -> Option<char> {
        match self {
            NumberFormat::Intl => Some(' '),
            NumberFormat::Latam => Some(','),
            NumberFormat::Euro => Some('.'),
            NumberFormat::Raw => None,
        }
    }

    fn decimal_separator(self) -> char {
        match self {
            NumberFormat::Euro => ',',
            _ => '.',
        }
    }

    /// Rewrites user text so that `.` is the only decimal mark and no
    /// grouping characters remain.
    pub(crate) fn normalize(self, text: &str) -> String {
        match self {
            NumberFormat::Euro => text.replace('.', "").replace(',', "."),
            NumberFormat::Latam => text.replace(',', ""),
            NumberFormat::Intl | NumberFormat::Raw => text
                .chars()
                .filter(|ch| !ch.is_whitespace())
                .map(|ch| if ch == ',' { '.' } else { ch })
                .collect(),
        }
    }
}

impl FromStr for NumberFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intl" => Ok(NumberFormat::Intl),
            "latam" => Ok(NumberFormat::Latam),
            "euro" => Ok(NumberFormat::Euro),
            "raw" => Ok(NumberFormat::Raw),
            other => Err(format!("unknown number format `{other}`")),
        }
    }
}

/// Numeric field families, each with its own configured decimal count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Yield,
    Price,
    Partial,
    Total,
    Quantity,
    /// Integer display with no separators.
    Code,
}

/// Decimal digits per [`Category`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Precision {
    #[serde(rename = "decimals_yield")]
    pub yield_digits: u32,
    #[serde(rename = "decimals_price")]
    pub price: u32,
    #[serde(rename = "decimals_partial")]
    pub partial: u32,
    #[serde(rename = "decimals_total")]
    pub total: u32,
    #[serde(rename = "decimals_qty")]
    pub quantity: u32,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            yield_digits: 5,
            price: 3,
            partial: 4,
            total: 2,
            quantity: 2,
        }
    }
}

impl Precision {
    pub fn digits(&self, category: Category) -> u32 {
        match category {
            Category::Yield => self.yield_digits,
            Category::Price => self.price,
            Category::Partial => self.partial,
            Category::Total => self.total,
            Category::Quantity => self.quantity,
            Category::Code => 0,
        }
    }
}

/// The formatting state a caller needs: separator mode plus precision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumberPolicy {
    pub format: NumberFormat,
    pub precision: Precision,
}

impl NumberPolicy {
    pub fn new(format: NumberFormat, precision: Precision) -> Self {
        Self { format, precision }
    }

    pub fn parse(&self, text: &str) -> f64 {
        parse_number(text, self.format)
    }

    pub fn evaluate(&self, text: &str) -> f64 {
        evaluate_expression(text, self.format)
    }

    pub fn round(&self, value: f64, category: Category) -> f64 {
        round_to(value, self.precision.digits(category))
    }

    pub fn format(&self, value: f64, category: Category) -> String {
        format_number(value, category, &self.precision, self.format)
    }

    /// Evaluates an edited cell, rounds it to its category, and returns both
    /// the stored value and its display text.
    pub fn normalize_input(&self, text: &str, category: Category) -> (f64, String) {
        let value = self.round(self.evaluate(text), category);
        (value, self.format(value, category))
    }
}

/// Parses user text under `format`. Never fails: empty, `-`, unparsable, or
/// implausibly large input yields `0.0`.
pub fn parse_number(text: &str, format: NumberFormat) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return 0.0;
    }
    let clean = format.normalize(trimmed);
    match parse_leading_float(&clean) {
        Some(value) if value.is_finite() && value.abs() <= MAGNITUDE_LIMIT => value,
        _ => 0.0,
    }
}

/// Reads the longest numeric prefix of `text` (`"12kg"` reads as `12`).
pub(crate) fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    text[..end].parse::<f64>().ok()
}

/// Rounds half away from zero at `digits` decimals.
///
/// The value is taken through its shortest decimal representation first, so
/// `round_to(1.005, 2)` is `1.01` even though the nearest binary float sits
/// slightly below the midpoint.
pub fn round_to(value: f64, digits: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let digits = digits.min(Decimal::MAX_SCALE);
    let decimal = Decimal::from_str(&value.to_string()).or_else(|_| Decimal::try_from(value));
    match decimal {
        Ok(decimal) => decimal
            .round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or(value),
        // Magnitudes beyond Decimal's range carry no fractional digits.
        Err(_) => value,
    }
}

/// Renders `value` with the category's decimals and the mode's separators.
pub fn format_number(
    value: f64,
    category: Category,
    precision: &Precision,
    format: NumberFormat,
) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if category == Category::Code {
        return format!("{}", round_to(value, 0) as i64);
    }
    let digits = precision.digits(category);
    let mut rounded = round_to(value, digits);
    if rounded == 0.0 {
        rounded = 0.0;
    }
    let body = format!("{:.*}", digits as usize, rounded);
    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (body.as_str(), None),
    };
    let int_part = match format.grouping_separator() {
        Some(separator) => insert_grouping(int_part, separator),
        None => int_part.to_string(),
    };
    match frac_part {
        Some(frac) if !frac.is_empty() => {
            format!("{}{}{}", int_part, format.decimal_separator(), frac)
        }
        _ => int_part,
    }
}

fn insert_grouping(int_part: &str, separator: char) -> String {
    match int_part.strip_prefix('-') {
        Some(digits) => format!("-{}", group_digits(digits, separator)),
        None => group_digits(int_part, separator),
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.chars().count();
    for (idx, ch) in digits.chars().enumerate() {
        if idx != 0 && (len - idx) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Picks a default separator mode from a BCP-47 style locale tag.
pub fn detect_number_format(locale: &str) -> NumberFormat {
    let locale = locale.trim();
    match locale {
        "es-ES" | "de-DE" | "fr-FR" | "it-IT" => return NumberFormat::Euro,
        "es-MX" | "es-AR" | "en-US" | "pt-BR" => return NumberFormat::Latam,
        _ => {}
    }
    let language = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match language.as_str() {
        "es" | "en" | "pt" => NumberFormat::Latam,
        "de" | "fr" | "it" => NumberFormat::Euro,
        _ => NumberFormat::Intl,
    }
}

/// Serde helpers that coerce loosely typed stored values the same way user
/// input is coerced.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{parse_number, NumberFormat};

    fn coerce(value: Value) -> f64 {
        match value {
            Value::Number(number) => number.as_f64().unwrap_or(0.0),
            Value::String(text) => parse_number(&text, NumberFormat::Raw),
            Value::Bool(flag) => f64::from(u8::from(flag)),
            _ => 0.0,
        }
    }

    pub fn f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(coerce(Value::deserialize(deserializer)?))
    }

    pub fn u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = coerce(Value::deserialize(deserializer)?);
        Ok(if value.is_finite() && value > 0.0 {
            value.trunc().min(f64::from(u32::MAX)) as u32
        } else {
            0
        })
    }

    pub fn u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = coerce(Value::deserialize(deserializer)?);
        Ok(if value.is_finite() && value > 0.0 {
            value.trunc() as u64
        } else {
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parses_each_format() {
        assert!(close(parse_number("1 234.56", NumberFormat::Intl), 1234.56));
        assert!(close(parse_number("1,234.56", NumberFormat::Latam), 1234.56));
        assert!(close(parse_number("1.234,56", NumberFormat::Euro), 1234.56));
        assert!(close(parse_number("1234.56", NumberFormat::Raw), 1234.56));
        assert!(close(parse_number("12,5", NumberFormat::Intl), 12.5));
    }

    #[test]
    fn degrades_to_zero() {
        assert_eq!(parse_number("", NumberFormat::Intl), 0.0);
        assert_eq!(parse_number("  - ", NumberFormat::Intl), 0.0);
        assert_eq!(parse_number("abc", NumberFormat::Latam), 0.0);
        assert_eq!(parse_number("2e15", NumberFormat::Intl), 0.0);
        assert_eq!(parse_number("Infinity", NumberFormat::Intl), 0.0);
    }

    #[test]
    fn accepts_numeric_prefix() {
        assert!(close(parse_number("12kg", NumberFormat::Intl), 12.0));
        assert!(close(parse_number(".5", NumberFormat::Intl), 0.5));
        assert!(close(parse_number("-3.25", NumberFormat::Latam), -3.25));
        assert!(close(parse_number("1e3", NumberFormat::Raw), 1000.0));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to(1.005, 2), 1.01);
        assert_eq!(round_to(-1.005, 2), -1.01);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(f64::NAN, 2), 0.0);
    }

    #[test]
    fn digits_beyond_decimal_scale_are_clamped() {
        assert_eq!(round_to(1.25, 40), 1.25);
        assert_eq!(round_to(0.1, u32::MAX), 0.1);
    }

    #[test]
    fn formats_with_grouping() {
        let precision = Precision::default();
        assert_eq!(
            format_number(1234567.891, Category::Total, &precision, NumberFormat::Intl),
            "1 234 567.89"
        );
        assert_eq!(
            format_number(1234567.891, Category::Total, &precision, NumberFormat::Latam),
            "1,234,567.89"
        );
        assert_eq!(
            format_number(1234567.891, Category::Total, &precision, NumberFormat::Euro),
            "1.234.567,89"
        );
        assert_eq!(
            format_number(1234567.891, Category::Total, &precision, NumberFormat::Raw),
            "1234567.89"
        );
        assert_eq!(
            format_number(-1234.5, Category::Price, &precision, NumberFormat::Intl),
            "-1 234.500"
        );
    }

    #[test]
    fn formats_code_as_plain_integer() {
        let precision = Precision::default();
        assert_eq!(
            format_number(12345.6, Category::Code, &precision, NumberFormat::Latam),
            "12346"
        );
    }

    #[test]
    fn zero_precision_has_no_decimal_mark() {
        let precision = Precision {
            total: 0,
            ..Precision::default()
        };
        assert_eq!(
            format_number(1999.5, Category::Total, &precision, NumberFormat::Euro),
            "2.000"
        );
    }

    #[test]
    fn negative_zero_is_rendered_unsigned() {
        let precision = Precision::default();
        assert_eq!(
            format_number(-0.001, Category::Total, &precision, NumberFormat::Intl),
            "0.00"
        );
    }

    #[test]
    fn detects_format_from_locale() {
        assert_eq!(detect_number_format("de-DE"), NumberFormat::Euro);
        assert_eq!(detect_number_format("en-US"), NumberFormat::Latam);
        assert_eq!(detect_number_format("es-BO"), NumberFormat::Latam);
        assert_eq!(detect_number_format("fr-CA"), NumberFormat::Euro);
        assert_eq!(detect_number_format("ja-JP"), NumberFormat::Intl);
    }

    #[test]
    fn policy_normalizes_edited_cells() {
        let policy = NumberPolicy::new(NumberFormat::Latam, Precision::default());
        let (value, text) = policy.normalize_input("=1,000*1.5", Category::Price);
        assert!(close(value, 1500.0));
        assert_eq!(text, "1,500.000");
    }
}
