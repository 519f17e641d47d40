//! Date coercion for stored records.
//!
//! Records written by older builds carry dates in several shapes: RFC 3339,
//! naive date-times, plain `YYYY-MM-DD`, or epoch milliseconds. Everything is
//! coerced to `DateTime<Utc>` / `NaiveDate` on read and written back as RFC 3339.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Deserialize;

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(value).map(|dt| dt.date_naive()))
}

pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInstant {
    Text(String),
    Millis(i64),
    FractionalMillis(f64),
}

impl RawInstant {
    fn into_datetime(self) -> Option<DateTime<Utc>> {
        match self {
            RawInstant::Text(s) => parse_datetime(&s),
            RawInstant::Millis(ms) => DateTime::from_timestamp_millis(ms),
            RawInstant::FractionalMillis(ms) if ms.is_finite() => {
                DateTime::from_timestamp_millis(ms as i64)
            }
            RawInstant::FractionalMillis(_) => None,
        }
    }
}

/// Serde adapter for `DateTime<Utc>` fields.
pub mod flexible_datetime {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_datetime(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        RawInstant::deserialize(d)?
            .into_datetime()
            .ok_or_else(|| serde::de::Error::custom("unrecognised date-time value"))
    }
}

/// Serde adapter for calendar-date fields.
pub mod flexible_date {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        match RawInstant::deserialize(d)? {
            RawInstant::Text(s) => parse_date(&s),
            other => other.into_datetime().map(|dt| dt.date_naive()),
        }
        .ok_or_else(|| serde::de::Error::custom("unrecognised date value"))
    }
}
