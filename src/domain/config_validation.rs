//! Configuration validation.
//!
//! Validates all config fields before any data is loaded.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;

use crate::domain::error::DipfillError;
use crate::domain::evaluator::DEFAULT_LIMIT_DISCOUNT_PCT;
use crate::domain::run_config::ChartConfig;
use crate::ports::config_port::ConfigPort;

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), DipfillError> {
    validate_delimiter(config)?;
    validate_date_format(config)?;
    validate_limit_discount(config)?;
    validate_chart_range(config)?;
    validate_chart_size(config)?;
    Ok(())
}

/// Accepts a single ASCII character, or `tab` / `\t`.
pub fn parse_delimiter(value: &str) -> Option<u8> {
    match value {
        "tab" | "\\t" | "\t" => return Some(b'\t'),
        _ => {}
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Some(c as u8),
        _ => None,
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> DipfillError {
    DipfillError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// A present key must parse as a number; `get_double` would silently fall
/// back to the default.
fn read_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, DipfillError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(section, key, format!("{raw:?} is not a number"))),
    }
}

fn validate_delimiter(config: &dyn ConfigPort) -> Result<(), DipfillError> {
    if let Some(raw) = config.get_string("data", "delimiter") {
        if parse_delimiter(&raw).is_none() {
            return Err(invalid(
                "data",
                "delimiter",
                "delimiter must be a single ASCII character",
            ));
        }
    }
    Ok(())
}

fn validate_date_format(config: &dyn ConfigPort) -> Result<(), DipfillError> {
    let Some(fmt) = config.get_string("data", "date_format") else {
        return Ok(());
    };
    if fmt.trim().is_empty() {
        return Err(invalid("data", "date_format", "date_format must not be empty"));
    }
    if StrftimeItems::new(&fmt).any(|item| matches!(item, Item::Error)) {
        return Err(invalid("data", "date_format", "unrecognised strftime specifier"));
    }

    // The format must carry a full calendar date, so a formatted date has to
    // parse back to itself.
    let sample = NaiveDate::from_ymd_opt(2021, 1, 14).unwrap_or_default();
    let mut rendered = String::new();
    if write!(rendered, "{}", sample.format(&fmt)).is_err()
        || NaiveDate::parse_from_str(&rendered, &fmt).ok() != Some(sample)
    {
        return Err(invalid(
            "data",
            "date_format",
            "date_format must contain year, month and day",
        ));
    }
    Ok(())
}

fn validate_limit_discount(config: &dyn ConfigPort) -> Result<(), DipfillError> {
    let value = read_number(
        config,
        "strategy",
        "limit_discount_pct",
        DEFAULT_LIMIT_DISCOUNT_PCT,
    )?;
    if !(0.0..100.0).contains(&value) {
        return Err(invalid(
            "strategy",
            "limit_discount_pct",
            "limit_discount_pct must be in [0, 100)",
        ));
    }
    Ok(())
}

fn validate_chart_range(config: &dyn ConfigPort) -> Result<(), DipfillError> {
    let defaults = ChartConfig::default();
    let y_min = read_number(config, "chart", "y_min", defaults.y_min)?;
    let y_max = read_number(config, "chart", "y_max", defaults.y_max)?;
    if y_min >= y_max {
        return Err(invalid("chart", "y_max", "y_max must be greater than y_min"));
    }
    if !(y_max - y_min).is_finite() {
        return Err(invalid("chart", "y_max", "y range is too wide"));
    }
    Ok(())
}

fn validate_chart_size(config: &dyn ConfigPort) -> Result<(), DipfillError> {
    let defaults = ChartConfig::default();
    for (key, default) in [("width", defaults.width), ("height", defaults.height)] {
        let value = read_number(config, "chart", key, default)?;
        if value <= 0.0 {
            return Err(invalid("chart", key, format!("{key} must be positive")));
        }
    }
    Ok(())
}
