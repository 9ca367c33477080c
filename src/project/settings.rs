use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::number::{lenient, parse_leading_float, parse_number, NumberFormat, NumberPolicy, Precision};

/// Largest accepted decimal count for any precision field.
pub const MAX_DIGITS: u32 = 10;

/// Overhead rates, precision table, and display options of a project.
///
/// Rates are whole-number percentages (`55.0` means 55 %).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "defaults::social", deserialize_with = "lenient::f64")]
    pub social: f64,
    #[serde(default = "defaults::iva_mo", deserialize_with = "lenient::f64")]
    pub iva_mo: f64,
    #[serde(default = "defaults::tools", deserialize_with = "lenient::f64")]
    pub tools: f64,
    #[serde(default = "defaults::gg", deserialize_with = "lenient::f64")]
    pub gg: f64,
    #[serde(default = "defaults::util", deserialize_with = "lenient::f64")]
    pub util: f64,
    #[serde(default = "defaults::it", deserialize_with = "lenient::f64")]
    pub it: f64,
    #[serde(flatten)]
    pub precision: Precision,
    #[serde(rename = "numberFormat", default)]
    pub number_format: NumberFormat,
    /// Budget table columns collapsed by a front end. Stored, never read here.
    #[serde(rename = "hiddenColumnsB1", default)]
    pub hidden_columns: Vec<u32>,
}

mod defaults {
    pub fn social() -> f64 {
        55.0
    }
    pub fn iva_mo() -> f64 {
        14.94
    }
    pub fn tools() -> f64 {
        5.0
    }
    pub fn gg() -> f64 {
        10.0
    }
    pub fn util() -> f64 {
        10.0
    }
    pub fn it() -> f64 {
        3.09
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            social: defaults::social(),
            iva_mo: defaults::iva_mo(),
            tools: defaults::tools(),
            gg: defaults::gg(),
            util: defaults::util(),
            it: defaults::it(),
            precision: Precision::default(),
            number_format: NumberFormat::default(),
            hidden_columns: Vec::new(),
        }
    }
}

/// Every user-editable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    Social,
    IvaMo,
    Tools,
    Gg,
    Util,
    It,
    DecimalsYield,
    DecimalsPrice,
    DecimalsPartial,
    DecimalsTotal,
    DecimalsQty,
    NumberFormat,
}

impl SettingField {
    pub const ALL: [SettingField; 12] = [
        SettingField::Social,
        SettingField::IvaMo,
        SettingField::Tools,
        SettingField::Gg,
        SettingField::Util,
        SettingField::It,
        SettingField::DecimalsYield,
        SettingField::DecimalsPrice,
        SettingField::DecimalsPartial,
        SettingField::DecimalsTotal,
        SettingField::DecimalsQty,
        SettingField::NumberFormat,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SettingField::Social => "social",
            SettingField::IvaMo => "iva_mo",
            SettingField::Tools => "tools",
            SettingField::Gg => "gg",
            SettingField::Util => "util",
            SettingField::It => "it",
            SettingField::DecimalsYield => "decimals_yield",
            SettingField::DecimalsPrice => "decimals_price",
            SettingField::DecimalsPartial => "decimals_partial",
            SettingField::DecimalsTotal => "decimals_total",
            SettingField::DecimalsQty => "decimals_qty",
            SettingField::NumberFormat => "number_format",
        }
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SettingField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = if wanted == "numberformat" {
            "number_format".to_string()
        } else {
            wanted
        };
        SettingField::ALL
            .iter()
            .copied()
            .find(|field| field.key() == wanted)
            .ok_or_else(|| format!("unknown setting `{}`", s.trim()))
    }
}

impl Settings {
    pub fn number_policy(&self) -> NumberPolicy {
        NumberPolicy::new(self.number_format, self.precision)
    }

    /// Applies raw user text to a field. Rates that do not parse become `0`;
    /// precision counts that do not parse to a positive integer fall back to
    /// their default. Returns an error only for an unknown number format.
    pub fn apply_input(&mut self, field: SettingField, text: &str) -> Result<(), String> {
        let defaults = Precision::default();
        match field {
            SettingField::Social => self.social = parse_rate(text),
            SettingField::IvaMo => self.iva_mo = parse_rate(text),
            SettingField::Tools => self.tools = parse_rate(text),
            SettingField::Gg => self.gg = parse_rate(text),
            SettingField::Util => self.util = parse_rate(text),
            SettingField::It => self.it = parse_rate(text),
            SettingField::DecimalsYield => {
                self.precision.yield_digits = parse_digits(text, defaults.yield_digits)
            }
            SettingField::DecimalsPrice => self.precision.price = parse_digits(text, defaults.price),
            SettingField::DecimalsPartial => {
                self.precision.partial = parse_digits(text, defaults.partial)
            }
            SettingField::DecimalsTotal => self.precision.total = parse_digits(text, defaults.total),
            SettingField::DecimalsQty => {
                self.precision.quantity = parse_digits(text, defaults.quantity)
            }
            SettingField::NumberFormat => self.number_format = text.parse()?,
        }
        Ok(())
    }

    /// Current value of `field` as display text.
    pub fn value_text(&self, field: SettingField) -> String {
        match field {
            SettingField::Social => self.social.to_string(),
            SettingField::IvaMo => self.iva_mo.to_string(),
            SettingField::Tools => self.tools.to_string(),
            SettingField::Gg => self.gg.to_string(),
            SettingField::Util => self.util.to_string(),
            SettingField::It => self.it.to_string(),
            SettingField::DecimalsYield => self.precision.yield_digits.to_string(),
            SettingField::DecimalsPrice => self.precision.price.to_string(),
            SettingField::DecimalsPartial => self.precision.partial.to_string(),
            SettingField::DecimalsTotal => self.precision.total.to_string(),
            SettingField::DecimalsQty => self.precision.quantity.to_string(),
            SettingField::NumberFormat => self.number_format.as_str().to_string(),
        }
    }
}

fn parse_rate(text: &str) -> f64 {
    parse_number(text, NumberFormat::Raw)
}

fn parse_digits(text: &str, default: u32) -> u32 {
    match parse_leading_float(text.trim()) {
        Some(value) if value.is_finite() && value.trunc() >= 1.0 => {
            (value.trunc() as u32).min(MAX_DIGITS)
        }
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"social": 60, "decimals_total": 3}"#).expect("parse settings");
        assert!((settings.social - 60.0).abs() < f64::EPSILON);
        assert!((settings.iva_mo - 14.94).abs() < f64::EPSILON);
        assert_eq!(settings.precision.total, 3);
        assert_eq!(settings.precision.yield_digits, 5);
        assert_eq!(settings.number_format, NumberFormat::Intl);
    }

    #[test]
    fn invalid_rate_becomes_zero() {
        let mut settings = Settings::default();
        settings
            .apply_input(SettingField::Gg, "abc")
            .expect("apply rate");
        assert_eq!(settings.gg, 0.0);
        settings
            .apply_input(SettingField::Util, "12,5")
            .expect("apply rate");
        assert!((settings.util - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_precision_falls_back_to_default() {
        let mut settings = Settings::default();
        settings
            .apply_input(SettingField::DecimalsPrice, "x")
            .expect("apply precision");
        assert_eq!(settings.precision.price, 3);
        settings
            .apply_input(SettingField::DecimalsPrice, "0")
            .expect("apply precision");
        assert_eq!(settings.precision.price, 3);
        settings
            .apply_input(SettingField::DecimalsPrice, "6")
            .expect("apply precision");
        assert_eq!(settings.precision.price, 6);
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("IVA_MO".parse::<SettingField>(), Ok(SettingField::IvaMo));
        assert_eq!(
            "numberFormat".parse::<SettingField>(),
            Ok(SettingField::NumberFormat)
        );
        assert!("margin".parse::<SettingField>().is_err());
    }
}
