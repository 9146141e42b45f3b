//! Built-in rule evaluators
//!
//! Every evaluator lets an empty string (or an absent optional) through,
//! except `required`: absence is never a format error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::{FieldValue, RuleRegistry};
use crate::error::RuleError;

lazy_static! {
    /// RFC 5322 derived address pattern, anchored on both ends
    static ref EMAIL_REGEX: Regex = Regex::new(
        r#"(?i)^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?|[a-z0-9-]*[a-z0-9]:(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])$"#
    ).unwrap();

    /// Alphanumerics plus the punctuation allowed in free-text names
    static ref ALPHANUMCHAR_REGEX: Regex =
        Regex::new(r"^[#.0-9a-zA-Z ,/_:+?')(@#!&-]+$").unwrap();
}

/// Date layout tokens understood by the `date` rule.
const DATE_LAYOUTS: &[(&str, DateLayout)] = &[
    ("YYYY-MM-DD", DateLayout::Date("%Y-%m-%d")),
    ("DD-MM-YYYY", DateLayout::Date("%d-%m-%Y")),
    ("DD/MM/YYYY", DateLayout::Date("%d/%m/%Y")),
    ("MM/DD/YYYY", DateLayout::Date("%m/%d/%Y")),
    ("YYYYMMDD", DateLayout::Date("%Y%m%d")),
    ("YYYY-MM-DD HH:MM:SS", DateLayout::DateTime("%Y-%m-%d %H:%M:%S")),
    ("YYYY-MM-DDTHH:MM:SS", DateLayout::DateTime("%Y-%m-%dT%H:%M:%S")),
    ("RFC3339", DateLayout::Rfc3339),
];

#[derive(Debug, Clone, Copy)]
enum DateLayout {
    Date(&'static str),
    DateTime(&'static str),
    Rfc3339,
}

impl DateLayout {
    fn lookup(token: &str) -> Option<DateLayout> {
        let token = token.trim().to_ascii_uppercase();
        DATE_LAYOUTS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, layout)| *layout)
    }

    fn accepts(self, value: &str) -> bool {
        match self {
            DateLayout::Date(format) => NaiveDate::parse_from_str(value, format).is_ok(),
            DateLayout::DateTime(format) => NaiveDateTime::parse_from_str(value, format).is_ok(),
            DateLayout::Rfc3339 => DateTime::parse_from_rfc3339(value).is_ok(),
        }
    }
}

/// Install every built-in rule into `registry`.
pub fn register_builtin(registry: &mut RuleRegistry) {
    registry
        .register("required", required)
        .register("maxlen", max_len)
        .register("minlen", min_len)
        .register("reqlen", req_len)
        .register("enum", enumeration)
        .register("notempty", not_empty)
        .register("date", date)
        .register("url", url)
        .register("numeric", numeric)
        .register("pattern", pattern)
        .register("email", email)
        .register("alphanumchar", alphanumchar)
        .register("min", min)
        .register("max", max);
}

fn skipped(value: &FieldValue<'_>) -> bool {
    matches!(value, FieldValue::Absent | FieldValue::Text(""))
}

fn text<'v>(rule: &str, value: &FieldValue<'v>) -> Result<&'v str, RuleError> {
    match value {
        FieldValue::Text(text) => Ok(*text),
        other => Err(RuleError::unsupported(rule, other.kind())),
    }
}

fn length(rule: &str, value: &FieldValue<'_>) -> Result<usize, RuleError> {
    match value {
        FieldValue::Text(text) => Ok(text.chars().count()),
        FieldValue::List { len, .. } => Ok(*len),
        other => Err(RuleError::unsupported(rule, other.kind())),
    }
}

fn size_parameter(rule: &str, parameter: &str) -> Result<usize, RuleError> {
    parameter
        .trim()
        .parse::<usize>()
        .map_err(|_| RuleError::bad_parameter(rule, parameter))
}

fn number_parameter(rule: &str, parameter: &str) -> Result<f64, RuleError> {
    parameter
        .trim()
        .parse::<f64>()
        .map_err(|_| RuleError::bad_parameter(rule, parameter))
}

fn number(rule: &str, value: &FieldValue<'_>) -> Result<f64, RuleError> {
    match value {
        FieldValue::Integer(n) => Ok(*n as f64),
        FieldValue::Float(n) => Ok(*n),
        other => Err(RuleError::unsupported(rule, other.kind())),
    }
}

pub fn required(value: &FieldValue<'_>, _parameter: &str) -> Result<(), RuleError> {
    if value.is_empty() {
        return Err(RuleError::violation("required field"));
    }
    Ok(())
}

pub fn max_len(value: &FieldValue<'_>, parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    let max = size_parameter("maxlen", parameter)?;
    if length("maxlen", value)? > max {
        return Err(RuleError::violation(format!(
            "maximum length allowed is {}",
            max
        )));
    }
    Ok(())
}

pub fn min_len(value: &FieldValue<'_>, parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    let min = size_parameter("minlen", parameter)?;
    let len = length("minlen", value)?;
    if len > 0 && len < min {
        return Err(RuleError::violation(format!(
            "minimum length allowed is {}",
            min
        )));
    }
    Ok(())
}

pub fn req_len(value: &FieldValue<'_>, parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    let expected = size_parameter("reqlen", parameter)?;
    if length("reqlen", value)? != expected {
        return Err(RuleError::violation(format!(
            "required length of {}",
            expected
        )));
    }
    Ok(())
}

/// Exact, case-sensitive membership in a `|`-separated option list.
pub fn enumeration(value: &FieldValue<'_>, parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    let value = text("enum", value)?;
    if !parameter.split('|').any(|option| option == value) {
        return Err(RuleError::violation(format!(
            "values supported: [{}]",
            parameter
        )));
    }
    Ok(())
}

pub fn not_empty(value: &FieldValue<'_>, _parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    match value {
        FieldValue::List { element, len: 0 } => Err(RuleError::violation(format!(
            "at least one {} is required",
            element
        ))),
        FieldValue::List { .. } => Ok(()),
        other => Err(RuleError::unsupported("notempty", other.kind())),
    }
}

/// `date=YYYY-MM-DD` and friends, see [`DATE_LAYOUTS`].
pub fn date(value: &FieldValue<'_>, parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    let layout =
        DateLayout::lookup(parameter).ok_or_else(|| RuleError::bad_parameter("date", parameter))?;
    if !layout.accepts(text("date", value)?) {
        return Err(RuleError::violation(format!(
            "expected format of {}",
            parameter.trim().to_ascii_uppercase()
        )));
    }
    Ok(())
}

pub fn url(value: &FieldValue<'_>, _parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    let raw = text("url", value)?;
    let invalid = || RuleError::violation("should be a valid url");

    let parsed = Url::parse(raw).map_err(|_| invalid())?;
    let host = parsed.host_str().unwrap_or("");
    if host.starts_with('.') {
        return Err(invalid());
    }
    if host.is_empty() && !parsed.path().contains('.') {
        return Err(invalid());
    }
    if parsed.scheme().is_empty() {
        return Err(invalid());
    }
    Ok(())
}

pub fn numeric(value: &FieldValue<'_>, _parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    match value {
        FieldValue::Integer(_) | FieldValue::Float(_) => Ok(()),
        _ => match text("numeric", value)?.parse::<f64>() {
            Ok(_) => Ok(()),
            Err(_) => Err(RuleError::violation("should be a valid numeric value")),
        },
    }
}

/// Whole-value match against `^(parameter)$`.
pub fn pattern(value: &FieldValue<'_>, parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    let value = text("pattern", value)?;
    let regex = Regex::new(&format!("^({})$", parameter))
        .map_err(|_| RuleError::bad_parameter("pattern", parameter))?;
    if !regex.is_match(value) {
        return Err(RuleError::violation(format!(
            "should match the pattern {}",
            parameter
        )));
    }
    Ok(())
}

pub fn email(value: &FieldValue<'_>, _parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    if !EMAIL_REGEX.is_match(text("email", value)?) {
        return Err(RuleError::violation("invalid email format"));
    }
    Ok(())
}

pub fn alphanumchar(value: &FieldValue<'_>, _parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    if !ALPHANUMCHAR_REGEX.is_match(text("alphanumchar", value)?) {
        return Err(RuleError::violation("invalid string format"));
    }
    Ok(())
}

/// Numeric lower bound, inclusive.
pub fn min(value: &FieldValue<'_>, parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    let bound = number_parameter("min", parameter)?;
    if number("min", value)? < bound {
        return Err(RuleError::violation(format!(
            "should be greater than or equal to {}",
            parameter.trim()
        )));
    }
    Ok(())
}

/// Numeric upper bound, inclusive.
pub fn max(value: &FieldValue<'_>, parameter: &str) -> Result<(), RuleError> {
    if skipped(value) {
        return Ok(());
    }
    let bound = number_parameter("max", parameter)?;
    if number("max", value)? > bound {
        return Err(RuleError::violation(format!(
            "should be less than or equal to {}",
            parameter.trim()
        )));
    }
    Ok(())
}
