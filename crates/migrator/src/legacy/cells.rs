//! Lenient decoding of spreadsheet cells
//!
//! The legacy sheet exports whatever the cell held: numbers where text was
//! expected, empty strings for blank cells, dates with or without a time
//! part. These helpers are used with `#[serde(deserialize_with = ...)]` on the
//! typed legacy records.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::{Deserialize, Deserializer, Error};
use serde_json::Value;

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Identifier-like cell (member name, group name, legacy id): trimmed, non-blank
pub fn key<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match scalar_text(&value) {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(_) => Err(D::Error::custom("blank identifier")),
        None => Err(D::Error::custom(format!("expected text, found {value}"))),
    }
}

/// Free-text cell that must be present; kept verbatim, may be empty
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_text(&value).ok_or_else(|| D::Error::custom(format!("expected text, found {value}")))
}

/// Optional text cell; null and blank both mean absent
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        other => match scalar_text(&other) {
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => Ok(Some(text)),
            None => Err(D::Error::custom(format!("expected text, found {other}"))),
        },
    }
}

/// Optional numeric cell; blank, null and zero mean "not rated"
pub fn optional_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let rating = match &value {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(
            s.trim()
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("rating is not a number: {s}")))?,
        ),
        other => return Err(D::Error::custom(format!("expected a rating, found {other}"))),
    };
    Ok(rating.filter(|r| *r != 0.0))
}

/// Calendar-day cell
pub fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = key(deserializer)?;
    parse_date(&raw).ok_or_else(|| D::Error::custom(format!("unrecognised date: {raw}")))
}

/// Point-in-time cell
pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = key(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("unrecognised timestamp: {raw}")))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (taking its own calendar day)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.date_naive()))
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a bare date (midnight UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Some(Utc.from_utc_datetime(&naive).fixed_offset())
}
