//! Time macros in URL path templates.
//!
//! Two macros are recognised:
//! - `{timeFirst}`: local time as `YYYYMMDDHH`
//! - `{timestampMinus5}`: the first nine digits of the Unix timestamp, minus 5
//!
//! Expansion is a pure function of the template and the supplied instant so
//! it can be tested without a clock.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

const TIME_FIRST: &str = "{timeFirst}";
const TIMESTAMP_MINUS_5: &str = "{timestampMinus5}";

/// Error raised when the clock cannot be turned into macro values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("timestamp {0} has fewer than nine digits")]
    TimestampTooShort(i64),
    #[error("timestamp prefix '{0}' is not a number")]
    TimestampPrefix(String),
}

/// Whether `template` carries any time macro.
pub fn has_macros(template: &str) -> bool {
    template.contains(TIME_FIRST) || template.contains(TIMESTAMP_MINUS_5)
}

/// Substitute every time macro in `template` using `now`.
///
/// Templates without macros are returned unchanged and never fail.
pub fn expand<Tz>(template: &str, now: &DateTime<Tz>) -> Result<String, TemplateError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if !has_macros(template) {
        return Ok(template.to_string());
    }

    let time_first = now.format("%Y%m%d%H").to_string();
    let timestamp_minus_5 = truncated_timestamp(now.timestamp())? - 5;

    Ok(template
        .replace(TIME_FIRST, &time_first)
        .replace(TIMESTAMP_MINUS_5, &timestamp_minus_5.to_string()))
}

fn truncated_timestamp(timestamp: i64) -> Result<i64, TemplateError> {
    let digits = timestamp.to_string();
    let prefix = digits
        .get(..9)
        .ok_or(TemplateError::TimestampTooShort(timestamp))?;
    prefix
        .parse()
        .map_err(|_| TemplateError::TimestampPrefix(prefix.to_string()))
}
